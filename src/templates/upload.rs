//! Multipart parsing for schema and template-resource uploads.

use actix_multipart::Multipart;
use actix_web::HttpResponse;
use futures_util::StreamExt;
use sanitize_filename::sanitize;
use std::collections::HashMap;
use std::path::Path;

use crate::ErrorResponse;

/// Upper bound on a single uploaded file.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Multipart field error: {0}")]
    Field(String),
    #[error("Missing form field '{0}'")]
    MissingField(&'static str),
    #[error("No file was uploaded")]
    MissingFile,
    #[error("Invalid UTF-8 data: {0}")]
    Utf8(String),
    #[error("Unsupported file type '{0}'")]
    UnsupportedFileType(String),
    #[error("File exceeds the {} byte upload limit", MAX_UPLOAD_BYTES)]
    TooLarge,
    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<UploadError> for HttpResponse {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::TooLarge => HttpResponse::PayloadTooLarge()
                .json(ErrorResponse::new("PayloadTooLarge", &error.to_string())),
            UploadError::Io(_) => {
                log::error!("{}", error);
                HttpResponse::InternalServerError()
                    .json(ErrorResponse::internal_error("Failed to store upload"))
            }
            _ => HttpResponse::BadRequest().json(ErrorResponse::bad_request(&error.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct UploadedFile {
    /// Sanitized client file name.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Lower-cased extension without the dot, empty when there is none.
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default()
    }

    pub fn into_text(self) -> Result<String, UploadError> {
        String::from_utf8(self.bytes).map_err(|e| UploadError::Utf8(e.to_string()))
    }
}

/// Text fields plus the single `file` part of an upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    pub fn field(&self, name: &'static str) -> Result<&str, UploadError> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or(UploadError::MissingField(name))
    }

    pub fn take_file(&mut self) -> Result<UploadedFile, UploadError> {
        self.file.take().ok_or(UploadError::MissingFile)
    }
}

pub async fn parse_upload(mut multipart: Multipart) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();

    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(|e| UploadError::Field(e.to_string()))?;
        let content_disposition = field
            .content_disposition()
            .ok_or_else(|| UploadError::Field("Content disposition not found".to_string()))?;
        let name = content_disposition
            .get_name()
            .ok_or_else(|| UploadError::Field("Field name not found".to_string()))?
            .to_string();
        let file_name = content_disposition.get_filename().map(sanitize);

        let mut buffer = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| UploadError::Field(e.to_string()))?;
            if buffer.len() + data.len() > MAX_UPLOAD_BYTES {
                return Err(UploadError::TooLarge);
            }
            buffer.extend_from_slice(&data);
        }

        if name == "file" {
            let file_name = file_name
                .filter(|n| !n.is_empty())
                .ok_or_else(|| UploadError::Field("No filename in file field".to_string()))?;
            form.file = Some(UploadedFile {
                file_name,
                bytes: buffer,
            });
        } else {
            let value = String::from_utf8(buffer).map_err(|e| UploadError::Utf8(e.to_string()))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}
