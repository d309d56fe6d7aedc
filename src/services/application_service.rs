use crate::dto::candidate_dto::SubmissionForm;
use crate::error::{Error, Result};
use crate::models::application::{Application, NewApplication, NewDocument, UserDetails};
use crate::models::candidate::{Candidate, LoginContext};
use crate::services::mail_service::Mailer;
use crate::services::token_service::TokenService;
use crate::storage::{CandidateStore, SubmissionOutcome};
use crate::utils::validation::{normalize_email, validate};
use std::sync::Arc;
use uuid::Uuid;

/// Submission, lookup and confirmation workflow over the candidate store.
/// Identity resolution is folded into the store's atomic upsert; this service
/// owns normalization, validation and the exactly-one-match rule.
#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn CandidateStore>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenService,
    portal_base_url: String,
}

impl ApplicationService {
    pub fn new(
        store: Arc<dyn CandidateStore>,
        mailer: Arc<dyn Mailer>,
        tokens: TokenService,
        portal_base_url: String,
    ) -> Self {
        Self {
            store,
            mailer,
            tokens,
            portal_base_url,
        }
    }

    /// Records one submission: validates the form, normalizes the identity
    /// email, snapshots the user details and hands the store one atomic write.
    pub async fn submit_application(
        &self,
        raw_email: &str,
        form: &SubmissionForm,
        document: NewDocument,
        login: LoginContext,
    ) -> Result<SubmissionOutcome> {
        validate(form)?;
        let email = normalize_email(raw_email)?;

        let user_details = UserDetails {
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            email: email.clone(),
            phone: form.phone.clone(),
            rodo_consent: form.rodo_consent,
            regulations_consent: form.regulations_consent,
            remember_me: form.remember_me,
        };
        let new_app = NewApplication {
            offer_id: form.offer_id.clone(),
            user_details,
            login,
            document,
        };

        let outcome = self.store.record_application(&email, new_app).await?;
        tracing::info!(
            candidate = %outcome.candidate_eid,
            application = %outcome.application_eid,
            offer_id = %form.offer_id,
            "application recorded"
        );
        Ok(outcome)
    }

    /// Two-stage lookup: the candidate is already resolved by the session;
    /// zero matches is the caller's mistake, more than one is corruption.
    pub async fn get_application(
        &self,
        candidate: &Candidate,
        application_eid: Uuid,
    ) -> Result<Application> {
        let mut matches = self
            .store
            .find_applications(candidate.id, application_eid)
            .await?;
        match matches.len() {
            0 => Err(Error::NotFound(format!(
                "application {} not found",
                application_eid
            ))),
            1 => Ok(matches.remove(0)),
            n => Err(Error::Integrity(format!(
                "{} applications share external id {}",
                n, application_eid
            ))),
        }
    }

    pub async fn list_applications(&self, candidate: &Candidate) -> Result<Vec<Application>> {
        self.store.applications_for(candidate.id).await
    }

    /// Idempotent one-way transition. Only the call that actually flips the
    /// flag dispatches the notification email.
    pub async fn confirm_application(
        &self,
        candidate: &Candidate,
        application_eid: Uuid,
    ) -> Result<Application> {
        let mut application = self.get_application(candidate, application_eid).await?;
        if !application.confirmed {
            let transitioned = self
                .store
                .confirm_application(candidate.id, application_eid)
                .await?;
            application.confirmed = true;
            if transitioned {
                self.dispatch_confirmation(candidate, &application).await;
            }
        }
        Ok(application)
    }

    /// Fire-and-forget: a confirmed application stays confirmed whether or
    /// not the email made it out.
    async fn dispatch_confirmation(&self, candidate: &Candidate, application: &Application) {
        let token = match self.tokens.issue(candidate.eid, &candidate.login) {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(
                    application = %application.eid,
                    error = %err,
                    "confirmation link token failed"
                );
                return;
            }
        };
        let subject = format!("Aplikowałeś na ofertę {}", application.eid);
        let body = format!(
            "Dziękujemy za potwierdzenie aplikacji.\nSzczegóły: {}/api/candidates/current/applications/{}?token={}",
            self.portal_base_url, application.eid, token
        );

        match self
            .mailer
            .send(&application.user_details.email, &subject, &body)
            .await
        {
            Ok(()) => {
                if let Err(err) = self.store.mark_info_sent(application.id).await {
                    tracing::warn!(
                        application = %application.eid,
                        error = %err,
                        "failed to record email dispatch"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(
                    application = %application.eid,
                    error = %err,
                    "confirmation email failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mail_service::MockMailer;
    use crate::storage::memory::MemoryCandidateStore;
    use async_trait::async_trait;
    use chrono::Utc;

    fn form(email: &str, offer_id: &str) -> SubmissionForm {
        SubmissionForm {
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: Some(email.to_string()),
            phone: Some("123".to_string()),
            offer_id: offer_id.to_string(),
            rodo_consent: true,
            regulations_consent: true,
            remember_me: false,
        }
    }

    fn document() -> NewDocument {
        NewDocument {
            kind: "pdf".to_string(),
            storage_path: "/uploads/cv.pdf".to_string(),
            original_name: "cv.pdf".to_string(),
        }
    }

    fn service_with(
        store: Arc<dyn CandidateStore>,
        mailer: Arc<dyn Mailer>,
    ) -> ApplicationService {
        ApplicationService::new(
            store,
            mailer,
            TokenService::new(
                "test-secret".to_string(),
                "portal".to_string(),
                "candidates".to_string(),
            ),
            "http://portal.test".to_string(),
        )
    }

    fn silent_mailer() -> Arc<MockMailer> {
        let mut mailer = MockMailer::new();
        mailer.expect_send().never();
        Arc::new(mailer)
    }

    async fn submitted_candidate(
        svc: &ApplicationService,
        store: &MemoryCandidateStore,
        email: &str,
    ) -> (Candidate, Uuid) {
        let outcome = svc
            .submit_application(email, &form(email, "O1"), document(), LoginContext::form())
            .await
            .unwrap();
        let candidate = store
            .find_by_eid(outcome.candidate_eid)
            .await
            .unwrap()
            .unwrap();
        (candidate, outcome.application_eid)
    }

    #[tokio::test]
    async fn unknown_application_is_not_found() {
        let store = Arc::new(MemoryCandidateStore::new());
        let svc = service_with(store.clone(), silent_mailer());
        let (candidate, _) = submitted_candidate(&svc, &store, "ann@x.com").await;

        let err = svc
            .get_application(&candidate, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind_name(), "NotFoundError");
    }

    #[tokio::test]
    async fn malformed_email_fails_before_any_write() {
        let store = Arc::new(MemoryCandidateStore::new());
        let svc = service_with(store.clone(), silent_mailer());

        let err = svc
            .submit_application(
                "not-an-email",
                &form("not-an-email", "O1"),
                document(),
                LoginContext::form(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind_name(), "ValidationError");
    }

    #[tokio::test]
    async fn duplicate_external_ids_are_an_integrity_error() {
        struct DuplicatingStore;

        fn forged(candidate_id: Uuid, eid: Uuid) -> Application {
            Application {
                id: 1,
                eid,
                candidate_id,
                offer_id: "O1".to_string(),
                user_details: UserDetails {
                    first_name: "Ann".to_string(),
                    last_name: "Lee".to_string(),
                    email: "ann@x.com".to_string(),
                    phone: None,
                    rodo_consent: true,
                    regulations_consent: true,
                    remember_me: false,
                },
                login: LoginContext::form(),
                confirmed: false,
                accepted: None,
                info_send: false,
                documents: Vec::new(),
                messages: Vec::new(),
                submitted_at: Utc::now(),
            }
        }

        #[async_trait]
        impl CandidateStore for DuplicatingStore {
            async fn record_application(
                &self,
                _email: &str,
                _new_app: NewApplication,
            ) -> Result<SubmissionOutcome> {
                unimplemented!()
            }
            async fn upsert_social(
                &self,
                _email: &str,
                _first_name: &str,
                _last_name: &str,
                _login: &LoginContext,
            ) -> Result<Candidate> {
                unimplemented!()
            }
            async fn find_by_eid(&self, _eid: Uuid) -> Result<Option<Candidate>> {
                unimplemented!()
            }
            async fn applications_for(&self, _candidate_id: Uuid) -> Result<Vec<Application>> {
                unimplemented!()
            }
            async fn find_applications(
                &self,
                candidate_id: Uuid,
                application_eid: Uuid,
            ) -> Result<Vec<Application>> {
                Ok(vec![
                    forged(candidate_id, application_eid),
                    forged(candidate_id, application_eid),
                ])
            }
            async fn confirm_application(
                &self,
                _candidate_id: Uuid,
                _application_eid: Uuid,
            ) -> Result<bool> {
                unimplemented!()
            }
            async fn mark_info_sent(&self, _application_id: i64) -> Result<()> {
                unimplemented!()
            }
        }

        let svc = service_with(Arc::new(DuplicatingStore), silent_mailer());
        let candidate = Candidate {
            id: Uuid::new_v4(),
            eid: Uuid::new_v4(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: "ann@x.com".to_string(),
            phone: None,
            social_id: None,
            login: LoginContext::form(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let err = svc
            .get_application(&candidate, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind_name(), "IntegrityError");
    }

    #[tokio::test]
    async fn double_confirm_sends_exactly_one_email() {
        let store = Arc::new(MemoryCandidateStore::new());

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|to, subject, body| {
                to == "ann@x.com" && subject.starts_with("Aplikowałeś") && body.contains("?token=")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let svc = service_with(store.clone(), Arc::new(mailer));
        let (candidate, application_eid) = submitted_candidate(&svc, &store, "ann@x.com").await;

        let first = svc
            .confirm_application(&candidate, application_eid)
            .await
            .unwrap();
        assert!(first.confirmed);

        let second = svc
            .confirm_application(&candidate, application_eid)
            .await
            .unwrap();
        assert!(second.confirmed);

        let stored = svc
            .get_application(&candidate, application_eid)
            .await
            .unwrap();
        assert!(stored.confirmed);
        assert!(stored.info_send);
    }

    #[tokio::test]
    async fn mail_failure_does_not_unconfirm() {
        let store = Arc::new(MemoryCandidateStore::new());

        let mut mailer = MockMailer::new();
        mailer.expect_send().times(1).returning(|_, _, _| {
            Err(Error::Upstream {
                status: axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                message: "relay down".into(),
            })
        });

        let svc = service_with(store.clone(), Arc::new(mailer));
        let (candidate, application_eid) = submitted_candidate(&svc, &store, "ann@x.com").await;

        let confirmed = svc
            .confirm_application(&candidate, application_eid)
            .await
            .unwrap();
        assert!(confirmed.confirmed);

        let stored = svc
            .get_application(&candidate, application_eid)
            .await
            .unwrap();
        assert!(stored.confirmed);
        assert!(!stored.info_send);
    }
}
