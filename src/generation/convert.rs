//! PDF conversion backends.
//!
//! `CommandConverter` drives local binaries (an office suite for DOCX and an
//! HTML-to-PDF engine); `GotenbergConverter` calls a Gotenberg-compatible HTTP
//! API. Both run their work inside a scratch directory and only touch the
//! destination once the conversion has succeeded, so a failed conversion
//! never leaves a partial PDF behind.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use thiserror::Error;
use tokio::process::Command;

use crate::config::ConverterSettings;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to create conversion workspace: {0}")]
    Workspace(#[source] std::io::Error),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with status {code}")]
    Exit { program: String, code: i32 },
    #[error("{program} did not finish within {after:?}")]
    TimedOut { program: String, after: Duration },
    #[error("converter produced no output: {0}")]
    MissingOutput(#[source] std::io::Error),
    #[error("conversion service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("conversion service answered {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Capability to turn rendered documents into PDF.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Convert the DOCX at `input` into a PDF written at `output`.
    async fn docx_to_pdf(&self, input: &Path, output: &Path) -> Result<PathBuf, ConversionError>;

    /// Render in-memory HTML markup to PDF bytes.
    async fn html_to_pdf(&self, markup: &str) -> Result<Vec<u8>, ConversionError>;
}

pub fn build_converter(settings: &ConverterSettings, timeout: Duration) -> Arc<dyn Converter> {
    match settings {
        ConverterSettings::Office {
            soffice_bin,
            html_to_pdf_bin,
        } => Arc::new(CommandConverter::new(
            soffice_bin.clone(),
            html_to_pdf_bin.clone(),
            timeout,
        )),
        ConverterSettings::Gotenberg { base_url } => {
            Arc::new(GotenbergConverter::new(base_url.clone(), timeout))
        }
    }
}

/// Converter backed by local executables.
pub struct CommandConverter {
    soffice_bin: String,
    html_to_pdf_bin: String,
    timeout: Duration,
}

impl CommandConverter {
    pub fn new(soffice_bin: impl Into<String>, html_to_pdf_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            soffice_bin: soffice_bin.into(),
            html_to_pdf_bin: html_to_pdf_bin.into(),
            timeout,
        }
    }

    async fn run(&self, program: &str, mut command: Command) -> Result<(), ConversionError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ConversionError::TimedOut {
                program: program.to_string(),
                after: self.timeout,
            })?
            .map_err(|source| ConversionError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            log::error!(
                "{} exited with status {}: {}",
                program,
                code,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(ConversionError::Exit {
                program: program.to_string(),
                code,
            });
        }

        Ok(())
    }
}

/// Arguments for a headless office conversion. Each call uses its own user
/// profile inside `workspace`.
fn soffice_args(workspace: &Path, input: &Path) -> Vec<OsString> {
    let profile = workspace.join("lo-profile");
    vec![
        OsString::from(format!("-env:UserInstallation=file://{}", profile.display())),
        OsString::from("--headless"),
        OsString::from("--convert-to"),
        OsString::from("pdf"),
        OsString::from("--outdir"),
        workspace.as_os_str().to_os_string(),
        input.as_os_str().to_os_string(),
    ]
}

#[async_trait]
impl Converter for CommandConverter {
    async fn docx_to_pdf(&self, input: &Path, output: &Path) -> Result<PathBuf, ConversionError> {
        let workspace = tempdir().map_err(ConversionError::Workspace)?;

        let mut command = Command::new(&self.soffice_bin);
        command.args(soffice_args(workspace.path(), input));
        self.run(&self.soffice_bin, command).await?;

        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let produced = workspace.path().join(format!("{stem}.pdf"));

        tokio::fs::copy(&produced, output)
            .await
            .map_err(ConversionError::MissingOutput)?;

        log::debug!("Converted {} to {}", input.display(), output.display());
        Ok(output.to_path_buf())
    }

    async fn html_to_pdf(&self, markup: &str) -> Result<Vec<u8>, ConversionError> {
        let workspace = tempdir().map_err(ConversionError::Workspace)?;
        let html_path = workspace.path().join("index.html");
        let pdf_path = workspace.path().join("output.pdf");

        tokio::fs::write(&html_path, markup)
            .await
            .map_err(ConversionError::Workspace)?;

        let mut command = Command::new(&self.html_to_pdf_bin);
        command.arg("--quiet").arg(&html_path).arg(&pdf_path);
        self.run(&self.html_to_pdf_bin, command).await?;

        tokio::fs::read(&pdf_path)
            .await
            .map_err(ConversionError::MissingOutput)
    }
}

/// Converter backed by a Gotenberg-compatible conversion API.
pub struct GotenbergConverter {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl GotenbergConverter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    async fn convert(&self, route: &str, file_name: &str, bytes: Vec<u8>) -> Result<Vec<u8>, ConversionError> {
        let form = Form::new().part("files", Part::bytes(bytes).file_name(file_name.to_string()));

        let response = self
            .client
            .post(self.endpoint(route))
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Conversion service rejected {}: {} {}", route, status, body);
            return Err(ConversionError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl Converter for GotenbergConverter {
    async fn docx_to_pdf(&self, input: &Path, output: &Path) -> Result<PathBuf, ConversionError> {
        let bytes = tokio::fs::read(input)
            .await
            .map_err(ConversionError::Workspace)?;
        let pdf = self
            .convert("forms/libreoffice/convert", "document.docx", bytes)
            .await?;
        tokio::fs::write(output, pdf)
            .await
            .map_err(ConversionError::MissingOutput)?;
        Ok(output.to_path_buf())
    }

    async fn html_to_pdf(&self, markup: &str) -> Result<Vec<u8>, ConversionError> {
        self.convert(
            "forms/chromium/convert/html",
            "index.html",
            markup.as_bytes().to_vec(),
        )
        .await
    }
}
