pub mod submissions;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{NewSubmission, Submission};

/// Persistence seam for submissions, injected into the services through `AppState`.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn create(&self, new: &NewSubmission) -> Result<Submission, sqlx::Error>;
    async fn list_all(&self) -> Result<Vec<Submission>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn create(&self, new: &NewSubmission) -> Result<Submission, sqlx::Error> {
        submissions::create(&self.pool, new).await
    }

    async fn list_all(&self) -> Result<Vec<Submission>, sqlx::Error> {
        submissions::list_all(&self.pool).await
    }
}
