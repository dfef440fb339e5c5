use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewSubmission, Submission};

pub async fn create(pool: &PgPool, new: &NewSubmission) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "INSERT INTO submissions (id, name, social_handle, images)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&new.name)
    .bind(&new.social_handle)
    .bind(&new.images)
    .fetch_one(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>("SELECT * FROM submissions ORDER BY created_at ASC, id ASC")
        .fetch_all(pool)
        .await
}
