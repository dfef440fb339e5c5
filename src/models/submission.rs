use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub name: String,
    pub social_handle: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A submission that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub name: String,
    pub social_handle: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingField(&'static str),
    NoImages,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ValidationError::NoImages => write!(f, "At least one image is required"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl NewSubmission {
    /// Write-time field constraints. Whitespace-only text counts as missing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.social_handle.trim().is_empty() {
            return Err(ValidationError::MissingField("socialHandle"));
        }
        if self.images.is_empty() {
            return Err(ValidationError::NoImages);
        }
        Ok(())
    }
}
