use crate::db::SubmissionStore;
use crate::models::Submission;

/// Every stored submission, oldest first.
pub async fn list_all(store: &dyn SubmissionStore) -> Result<Vec<Submission>, sqlx::Error> {
    let submissions = store.list_all().await?;
    tracing::debug!("Listing {} submission(s)", submissions.len());
    Ok(submissions)
}
