use axum::Json;
use axum::extract::State;

use crate::error::AppError;
use crate::models::Submission;
use crate::state::SharedState;
use crate::submission::listing;

pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<Submission>>, AppError> {
    let submissions = listing::list_all(state.store.as_ref()).await?;
    Ok(Json(submissions))
}
