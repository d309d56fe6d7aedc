pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::models::application::{Application, NewApplication};
use crate::models::candidate::{Candidate, LoginContext};
use async_trait::async_trait;
use uuid::Uuid;

/// The two identifiers a submission hands back to the client.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionOutcome {
    pub candidate_eid: Uuid,
    pub application_eid: Uuid,
}

/// Identity store plus application log. Implementations must make
/// `record_application` a single atomic unit: the candidate upsert and the
/// application append either both land or neither does, and concurrent
/// submissions for one email must each keep their own application row.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Find-or-create the candidate for `email` (already normalized), apply
    /// last-write-wins to the identity fields, append the application with
    /// its CV document. The candidate external id is preserved on update.
    async fn record_application(
        &self,
        email: &str,
        new_app: NewApplication,
    ) -> Result<SubmissionOutcome>;

    /// Social-login upsert: identity fields and social id overwritten,
    /// phone and external id preserved, no application appended.
    async fn upsert_social(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        login: &LoginContext,
    ) -> Result<Candidate>;

    async fn find_by_eid(&self, eid: Uuid) -> Result<Option<Candidate>>;

    /// All applications of a candidate in submission order, children loaded.
    async fn applications_for(&self, candidate_id: Uuid) -> Result<Vec<Application>>;

    /// Every application matching (candidate, application external id).
    /// Returns all matches so the caller can tell zero from one from many.
    async fn find_applications(
        &self,
        candidate_id: Uuid,
        application_eid: Uuid,
    ) -> Result<Vec<Application>>;

    /// Conditionally flips `confirmed` to true. Returns whether this call
    /// performed the transition; false means it was already confirmed.
    async fn confirm_application(
        &self,
        candidate_id: Uuid,
        application_eid: Uuid,
    ) -> Result<bool>;

    async fn mark_info_sent(&self, application_id: i64) -> Result<()>;
}
