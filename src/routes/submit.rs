use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use serde_json::{Value, json};

use crate::state::SharedState;
use crate::submission::{SubmitError, parser, pipeline};

pub async fn submit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<Value>), SubmitError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    if !content_type.is_some_and(parser::is_multipart) {
        let content_length = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        return Err(parser::reject_non_multipart(
            content_length,
            state.config.max_body_size as u64,
        ));
    }

    let form = parser::parse_form(
        content_type,
        body.into_data_stream(),
        &state.config.limits,
        state.config.max_body_size as u64,
        &state.config.upload_dir,
    )
    .await?;

    pipeline::submit(state.store.as_ref(), form).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Submission successful" })),
    ))
}
