use std::io::ErrorKind;
use std::path::Path;

use chrono::Utc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::SubmitError;

/// Public URL prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// On-disk name for an upload: `<epoch-millis>-<original>`.
///
/// Only the last path component of the client-supplied name is kept, so a name
/// like `../../etc/passwd` lands as `<millis>-passwd` inside the upload dir.
pub fn destination_name(original: Option<&str>, now_millis: i64) -> String {
    let base = original
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or("file");
    format!("{now_millis}-{base}")
}

pub fn public_path(generated: &str) -> String {
    format!("{PUBLIC_PREFIX}/{generated}")
}

/// Stream one multipart field into a fresh file under `dir`.
///
/// Returns the generated file name. The file handle is closed on every path;
/// a partially written file is removed when the field errors.
pub async fn write_upload(
    dir: &Path,
    original: Option<&str>,
    field: &mut multer::Field<'_>,
) -> Result<String, SubmitError> {
    let (generated, mut file) = create_unique(dir, original).await?;
    let path = dir.join(&generated);

    let written = copy_field(&mut file, field).await;
    drop(file);

    match written {
        Ok(bytes) => {
            tracing::debug!("Stored upload {generated} ({bytes} bytes)");
            Ok(generated)
        }
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&path).await {
                tracing::warn!("Failed to remove partial upload {}: {remove_err}", path.display());
            }
            Err(e)
        }
    }
}

/// Open `<millis>-<original>` with `create_new`, stepping the millisecond
/// forward until the name is free.
async fn create_unique(dir: &Path, original: Option<&str>) -> Result<(String, File), SubmitError> {
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let name = destination_name(original, millis);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&name))
            .await
        {
            Ok(file) => return Ok((name, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => millis += 1,
            Err(e) => return Err(SubmitError::Io(e)),
        }
    }
}

async fn copy_field(file: &mut File, field: &mut multer::Field<'_>) -> Result<u64, SubmitError> {
    let mut written = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(SubmitError::from_multer)? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
