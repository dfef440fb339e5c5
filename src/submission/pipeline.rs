use crate::db::SubmissionStore;
use crate::models::{NewSubmission, Submission};

use super::SubmitError;
use super::parser::ParsedForm;

/// Turn a parsed form into a persisted submission with one store write.
///
/// Images already stored by the intake step stay on disk when validation or
/// the write fails.
pub async fn submit(store: &dyn SubmissionStore, form: ParsedForm) -> Result<Submission, SubmitError> {
    let new = NewSubmission {
        name: form.name.unwrap_or_default(),
        social_handle: form.social_handle.unwrap_or_default(),
        images: form.images,
    };

    if let Err(e) = new.validate() {
        if !new.images.is_empty() {
            tracing::debug!("Leaving {} orphaned upload(s) after validation failure", new.images.len());
        }
        return Err(e.into());
    }

    let submission = store.create(&new).await?;
    tracing::info!(
        "Stored submission {} with {} image(s)",
        submission.id,
        submission.images.len()
    );

    Ok(submission)
}
