use crate::error::Result;
use crate::models::application::{Application, Document, NewApplication};
use crate::models::candidate::{Candidate, LoginContext};
use crate::storage::{CandidateStore, SubmissionOutcome};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct MemoryInner {
    candidates: Vec<Candidate>,
    applications: Vec<Application>,
    next_application_id: i64,
}

/// Development and test double for the Postgres store. One mutex spans every
/// operation, so the atomicity the real store gets from a transaction holds
/// here as well.
pub struct MemoryCandidateStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryCandidateStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                candidates: Vec::new(),
                applications: Vec::new(),
                next_application_id: 1,
            }),
        }
    }
}

impl Default for MemoryCandidateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandidateStore for MemoryCandidateStore {
    async fn record_application(
        &self,
        email: &str,
        new_app: NewApplication,
    ) -> Result<SubmissionOutcome> {
        let mut inner = self.inner.lock().expect("memory store mutex poisoned");
        let now = Utc::now();

        let (candidate_id, candidate_eid) =
            match inner.candidates.iter_mut().find(|c| c.email == email) {
                Some(candidate) => {
                    candidate.first_name = new_app.user_details.first_name.clone();
                    candidate.last_name = new_app.user_details.last_name.clone();
                    candidate.phone = new_app.user_details.phone.clone();
                    if let Some(social_id) = &new_app.login.social_id {
                        candidate.social_id = Some(social_id.clone());
                    }
                    candidate.login = new_app.login.clone();
                    candidate.updated_at = now;
                    (candidate.id, candidate.eid)
                }
                None => {
                    let candidate = Candidate {
                        id: Uuid::new_v4(),
                        eid: Uuid::new_v4(),
                        first_name: new_app.user_details.first_name.clone(),
                        last_name: new_app.user_details.last_name.clone(),
                        email: email.to_string(),
                        phone: new_app.user_details.phone.clone(),
                        social_id: new_app.login.social_id.clone(),
                        login: new_app.login.clone(),
                        created_at: now,
                        updated_at: now,
                    };
                    let keys = (candidate.id, candidate.eid);
                    inner.candidates.push(candidate);
                    keys
                }
            };

        let application_eid = Uuid::new_v4();
        let id = inner.next_application_id;
        inner.next_application_id += 1;
        inner.applications.push(Application {
            id,
            eid: application_eid,
            candidate_id,
            offer_id: new_app.offer_id,
            user_details: new_app.user_details,
            login: new_app.login,
            confirmed: false,
            accepted: None,
            info_send: false,
            documents: vec![Document {
                kind: new_app.document.kind,
                storage_path: new_app.document.storage_path,
                original_name: new_app.document.original_name,
                uploaded_at: now,
            }],
            messages: Vec::new(),
            submitted_at: now,
        });

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
        let mut inner = self.inner.lock().expect("memory store mutex poisoned");
        let now = Utc::now();

        if let Some(candidate) = inner.candidates.iter_mut().find(|c| c.email == email) {
            candidate.first_name = first_name.to_string();
            candidate.last_name = last_name.to_string();
            candidate.social_id = login.social_id.clone();
            candidate.login = login.clone();
            candidate.updated_at = now;
            return Ok(candidate.clone());
        }

        let candidate = Candidate {
            id: Uuid::new_v4(),
            eid: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            phone: None,
            social_id: login.social_id.clone(),
            login: login.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.candidates.push(candidate.clone());
        Ok(candidate)
    }

    async fn find_by_eid(&self, eid: Uuid) -> Result<Option<Candidate>> {
        let inner = self.inner.lock().expect("memory store mutex poisoned");
        Ok(inner.candidates.iter().find(|c| c.eid == eid).cloned())
    }

    async fn applications_for(&self, candidate_id: Uuid) -> Result<Vec<Application>> {
        let inner = self.inner.lock().expect("memory store mutex poisoned");
        Ok(inner
            .applications
            .iter()
            .filter(|a| a.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    async fn find_applications(
        &self,
        candidate_id: Uuid,
        application_eid: Uuid,
    ) -> Result<Vec<Application>> {
        let inner = self.inner.lock().expect("memory store mutex poisoned");
        Ok(inner
            .applications
            .iter()
            .filter(|a| a.candidate_id == candidate_id && a.eid == application_eid)
            .cloned()
            .collect())
    }

    async fn confirm_application(
        &self,
        candidate_id: Uuid,
        application_eid: Uuid,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().expect("memory store mutex poisoned");
        match inner
            .applications
            .iter_mut()
            .find(|a| a.candidate_id == candidate_id && a.eid == application_eid && !a.confirmed)
        {
            Some(app) => {
                app.confirmed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_info_sent(&self, application_id: i64) -> Result<()> {
        let mut inner = self.inner.lock().expect("memory store mutex poisoned");
        if let Some(app) = inner.applications.iter_mut().find(|a| a.id == application_id) {
            app.info_send = true;
        }
        Ok(())
    }
}
