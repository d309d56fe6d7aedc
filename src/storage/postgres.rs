use crate::error::{Error, Result};
use crate::models::application::{Application, Document, Message, NewApplication};
use crate::models::candidate::{Candidate, LoginContext, LoginKind};
use crate::storage::{CandidateStore, SubmissionOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(50)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(sqlx::Error::from)?;
    Ok(pool)
}

#[derive(FromRow)]
struct CandidateRow {
    id: Uuid,
    eid: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    social_id: Option<String>,
    login_kind: String,
    login_session_id: Uuid,
    login_social_id: Option<String>,
    login_email_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CandidateRow {
    fn into_candidate(self) -> Result<Candidate> {
        // A bad stored kind is corruption, not caller error.
        let kind: LoginKind = self.login_kind.parse().map_err(Error::Integrity)?;
        Ok(Candidate {
            id: self.id,
            eid: self.eid,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            social_id: self.social_id,
            login: LoginContext {
                kind,
                session_id: self.login_session_id,
                social_id: self.login_social_id,
                email_verified: self.login_email_verified,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ApplicationRow {
    id: i64,
    eid: Uuid,
    candidate_id: Uuid,
    offer_id: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    rodo_consent: bool,
    regulations_consent: bool,
    remember_me: bool,
    login_kind: String,
    login_session_id: Uuid,
    login_social_id: Option<String>,
    login_email_verified: bool,
    confirmed: bool,
    accepted: Option<bool>,
    info_send: bool,
    submitted_at: DateTime<Utc>,
}

impl ApplicationRow {
    fn into_application(
        self,
        documents: Vec<Document>,
        messages: Vec<Message>,
    ) -> Result<Application> {
        let kind: LoginKind = self.login_kind.parse().map_err(Error::Integrity)?;
        Ok(Application {
            id: self.id,
            eid: self.eid,
            candidate_id: self.candidate_id,
            offer_id: self.offer_id,
            user_details: crate::models::application::UserDetails {
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                phone: self.phone,
                rodo_consent: self.rodo_consent,
                regulations_consent: self.regulations_consent,
                remember_me: self.remember_me,
            },
            login: LoginContext {
                kind,
                session_id: self.login_session_id,
                social_id: self.login_social_id,
                email_verified: self.login_email_verified,
            },
            confirmed: self.confirmed,
            accepted: self.accepted,
            info_send: self.info_send,
            documents,
            messages,
            submitted_at: self.submitted_at,
        })
    }
}

#[derive(FromRow)]
struct DocumentRow {
    application_id: i64,
    kind: String,
    storage_path: String,
    original_name: String,
    uploaded_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct MessageRow {
    application_id: i64,
    body: String,
    sender: String,
    sent_at: DateTime<Utc>,
}

const CANDIDATE_COLUMNS: &str = "id, eid, first_name, last_name, email, phone, social_id, \
     login_kind, login_session_id, login_social_id, login_email_verified, created_at, updated_at";

const APPLICATION_COLUMNS: &str = "id, eid, candidate_id, offer_id, first_name, last_name, \
     email, phone, rodo_consent, regulations_consent, remember_me, login_kind, login_session_id, \
     login_social_id, login_email_verified, confirmed, accepted, info_send, submitted_at";

#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_children(&self, rows: Vec<ApplicationRow>) -> Result<Vec<Application>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

        let doc_rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT application_id, kind, storage_path, original_name, uploaded_at
             FROM application_documents WHERE application_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let msg_rows = sqlx::query_as::<_, MessageRow>(
            "SELECT application_id, body, sender, sent_at
             FROM application_messages WHERE application_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut documents: HashMap<i64, Vec<Document>> = HashMap::new();
        for row in doc_rows {
            documents.entry(row.application_id).or_default().push(Document {
                kind: row.kind,
                storage_path: row.storage_path,
                original_name: row.original_name,
                uploaded_at: row.uploaded_at,
            });
        }
        let mut messages: HashMap<i64, Vec<Message>> = HashMap::new();
        for row in msg_rows {
            messages.entry(row.application_id).or_default().push(Message {
                body: row.body,
                sender: row.sender,
                sent_at: row.sent_at,
            });
        }

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let docs = documents.remove(&row.id).unwrap_or_default();
            let msgs = messages.remove(&row.id).unwrap_or_default();
            out.push(row.into_application(docs, msgs)?);
        }
        Ok(out)
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn record_application(
        &self,
        email: &str,
        new_app: NewApplication,
    ) -> Result<SubmissionOutcome> {
        let mut tx = self.pool.begin().await?;

        // eid lands only when the insert arm wins; the conflict arm leaves it
        // alone, which is what keeps the candidate external id stable.
        let (candidate_id, candidate_eid): (Uuid, Uuid) = sqlx::query_as(
            "INSERT INTO candidates
                 (eid, first_name, last_name, email, phone, social_id,
                  login_kind, login_session_id, login_social_id, login_email_verified)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (email) DO UPDATE SET
                 first_name = EXCLUDED.first_name,
                 last_name = EXCLUDED.last_name,
                 phone = EXCLUDED.phone,
                 social_id = COALESCE(EXCLUDED.social_id, candidates.social_id),
                 login_kind = EXCLUDED.login_kind,
                 login_session_id = EXCLUDED.login_session_id,
                 login_social_id = EXCLUDED.login_social_id,
                 login_email_verified = EXCLUDED.login_email_verified,
                 updated_at = NOW()
             RETURNING id, eid",
        )
        .bind(Uuid::new_v4())
        .bind(&new_app.user_details.first_name)
        .bind(&new_app.user_details.last_name)
        .bind(email)
        .bind(&new_app.user_details.phone)
        .bind(&new_app.login.social_id)
        .bind(new_app.login.kind.as_str())
        .bind(new_app.login.session_id)
        .bind(&new_app.login.social_id)
        .bind(new_app.login.email_verified)
        .fetch_one(&mut *tx)
        .await?;

        let application_eid = Uuid::new_v4();
        let (application_id,): (i64,) = sqlx::query_as(
            "INSERT INTO applications
                 (eid, candidate_id, offer_id, first_name, last_name, email, phone,
                  rodo_consent, regulations_consent, remember_me,
                  login_kind, login_session_id, login_social_id, login_email_verified)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING id",
        )
        .bind(application_eid)
        .bind(candidate_id)
        .bind(&new_app.offer_id)
        .bind(&new_app.user_details.first_name)
        .bind(&new_app.user_details.last_name)
        .bind(&new_app.user_details.email)
        .bind(&new_app.user_details.phone)
        .bind(new_app.user_details.rodo_consent)
        .bind(new_app.user_details.regulations_consent)
        .bind(new_app.user_details.remember_me)
        .bind(new_app.login.kind.as_str())
        .bind(new_app.login.session_id)
        .bind(&new_app.login.social_id)
        .bind(new_app.login.email_verified)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO application_documents (application_id, kind, storage_path, original_name)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(application_id)
        .bind(&new_app.document.kind)
        .bind(&new_app.document.storage_path)
        .bind(&new_app.document.original_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SubmissionOutcome {
            candidate_eid,
            application_eid,
        })
    }

    async fn upsert_social(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        login: &LoginContext,
    ) -> Result<Candidate> {
        let sql = format!(
            "INSERT INTO candidates
                 (eid, first_name, last_name, email, phone, social_id,
                  login_kind, login_session_id, login_social_id, login_email_verified)
             VALUES ($1, $2, $3, $4, NULL, $5, $6, $7, $8, $9)
             ON CONFLICT (email) DO UPDATE SET
                 first_name = EXCLUDED.first_name,
                 last_name = EXCLUDED.last_name,
                 social_id = EXCLUDED.social_id,
                 login_kind = EXCLUDED.login_kind,
                 login_session_id = EXCLUDED.login_session_id,
                 login_social_id = EXCLUDED.login_social_id,
                 login_email_verified = EXCLUDED.login_email_verified,
                 updated_at = NOW()
             RETURNING {CANDIDATE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(first_name)
            .bind(last_name)
            .bind(email)
            .bind(&login.social_id)
            .bind(login.kind.as_str())
            .bind(login.session_id)
            .bind(&login.social_id)
            .bind(login.email_verified)
            .fetch_one(&self.pool)
            .await?;
        row.into_candidate()
    }

    async fn find_by_eid(&self, eid: Uuid) -> Result<Option<Candidate>> {
        let sql = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE eid = $1");
        let row = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(eid)
            .fetch_optional(&self.pool)
            .await?;
        row.map(CandidateRow::into_candidate).transpose()
    }

    async fn applications_for(&self, candidate_id: Uuid) -> Result<Vec<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications
             WHERE candidate_id = $1 ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(candidate_id)
            .fetch_all(&self.pool)
            .await?;
        self.attach_children(rows).await
    }

    async fn find_applications(
        &self,
        candidate_id: Uuid,
        application_eid: Uuid,
    ) -> Result<Vec<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications
             WHERE candidate_id = $1 AND eid = $2 ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(candidate_id)
            .bind(application_eid)
            .fetch_all(&self.pool)
            .await?;
        self.attach_children(rows).await
    }

    async fn confirm_application(
        &self,
        candidate_id: Uuid,
        application_eid: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE applications SET confirmed = TRUE
             WHERE candidate_id = $1 AND eid = $2 AND NOT confirmed",
        )
        .bind(candidate_id)
        .bind(application_eid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_info_sent(&self, application_id: i64) -> Result<()> {
        sqlx::query("UPDATE applications SET info_send = TRUE WHERE id = $1")
            .bind(application_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
