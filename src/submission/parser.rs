use std::path::Path;

use bytes::Bytes;
use futures_util::Stream;
use multer::{Constraints, Multipart, SizeLimit};

use crate::config::UploadLimits;

use super::{SubmitError, files};

/// Form field carrying the uploaded images.
pub const IMAGES_FIELD: &str = "images";

/// Text fields and stored image paths collected from one multipart body.
#[derive(Debug, Default)]
pub struct ParsedForm {
    pub name: Option<String>,
    pub social_handle: Option<String>,
    /// Public paths (`/uploads/<generated>`) in upload order.
    pub images: Vec<String>,
}

/// Media types compare case-insensitively.
pub fn is_multipart(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("multipart/form-data"))
}

/// Error for a body that is not multipart: 413 once the declared length is
/// past `max_body_size`, otherwise 400. The body itself is never read.
pub fn reject_non_multipart(content_length: Option<u64>, max_body_size: u64) -> SubmitError {
    match content_length {
        Some(length) if length > max_body_size => SubmitError::BodyTooLarge(length),
        _ => SubmitError::Malformed("Expected multipart/form-data".to_string()),
    }
}

/// Stream a multipart body, writing every `images` part into `upload_dir`.
///
/// `text_allowance` is the room left for the non-file parts on top of the
/// file budget when sizing the whole-stream ceiling.
pub async fn parse_form<S, E>(
    content_type: Option<&str>,
    body: S,
    limits: &UploadLimits,
    text_allowance: u64,
    upload_dir: &Path,
) -> Result<ParsedForm, SubmitError>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let boundary = content_type
        .filter(|ct| is_multipart(ct))
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| SubmitError::Malformed("Missing multipart boundary".to_string()))?;

    let whole_stream = limits
        .max_file_size
        .saturating_mul(limits.max_files as u64)
        .saturating_add(text_allowance);
    let constraints = Constraints::new().size_limit(
        SizeLimit::new()
            .whole_stream(whole_stream)
            .per_field(limits.max_file_size),
    );
    let mut multipart = Multipart::with_constraints(body, boundary, constraints);

    let mut form = ParsedForm::default();
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(SubmitError::from_multer)?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("name") => {
                form.name = Some(field.text().await.map_err(SubmitError::from_multer)?);
            }
            Some("socialHandle") => {
                form.social_handle = Some(field.text().await.map_err(SubmitError::from_multer)?);
            }
            Some(IMAGES_FIELD) => {
                if form.images.len() >= limits.max_files {
                    return Err(SubmitError::TooManyFiles(limits.max_files));
                }
                let original = field.file_name().map(str::to_string);
                let generated = files::write_upload(upload_dir, original.as_deref(), &mut field).await?;
                form.images.push(files::public_path(&generated));
            }
            other => {
                tracing::debug!("Ignoring unexpected form field {other:?}");
                while field
                    .chunk()
                    .await
                    .map_err(SubmitError::from_multer)?
                    .is_some()
                {}
            }
        }
    }

    Ok(form)
}
