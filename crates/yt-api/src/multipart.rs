//! Reads the multipart post form (text, group, image).

use actix_multipart::Multipart;
use bytes::BytesMut;
use futures_util::TryStreamExt;
use yt_core::forms::{PostForm, Upload};

use crate::error::ApiError;

/// Largest accepted image upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

fn bad_request(err: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(err.to_string())
}

pub async fn read_post_form(mut payload: Multipart) -> Result<PostForm, ApiError> {
    let mut form = PostForm::default();

    while let Some(mut field) = payload.try_next().await.map_err(bad_request)? {
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);
        // Fall back to the file extension when the part carries no type.
        let content_type = match (field.content_type(), filename.as_deref()) {
            (Some(m), _) => m.essence_str().to_string(),
            (None, Some(name)) => mime_guess::from_path(name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            (None, None) => mime_guess::mime::APPLICATION_OCTET_STREAM.to_string(),
        };

        let mut data = BytesMut::new();
        while let Some(chunk) = field.try_next().await.map_err(bad_request)? {
            if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(ApiError::BadRequest(format!("{name} exceeds {MAX_UPLOAD_BYTES} bytes")));
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "text" => form.text = String::from_utf8(data.to_vec()).map_err(bad_request)?,
            "group" => form.group = String::from_utf8(data.to_vec()).map_err(bad_request)?,
            // Browsers send an empty part when no file was picked.
            "image" => match filename {
                Some(filename) if !filename.is_empty() && !data.is_empty() => {
                    form.image = Some(Upload {
                        filename,
                        content_type,
                        data: data.freeze(),
                    });
                }
                _ => {}
            },
            _ => {}
        }
    }
    Ok(form)
}
