#![allow(dead_code)]

use async_trait::async_trait;
use docgen_server::auth::InMemoryUserStore;
use docgen_server::config::{Directories, JwtConfig};
use docgen_server::db::AppState;
use docgen_server::generation::convert::{ConversionError, Converter};
use docgen_server::generation::validation::UnknownTypePolicy;
use docgen_server::generation::{
    DocumentRegistry, FsTemplateStore, GeneratedDocument, GenerationPipeline,
    InMemoryDocumentRegistry, RegistryError, TemplateStore,
};
use parking_lot::Mutex;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const INVOICE_SCHEMA: &str = r#"
template_name: invoice.docx
parameters:
  - name: amount
    type: float
    required: true
"#;

pub const INVOICE_DOCUMENT_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:body><w:p><w:r><w:t>Amount due: {{ amount }}</w:t></w:r></w:p></w:body>"#,
    r#"</w:document>"#
);

/// Converter double: records every call and writes a fake PDF unless told to
/// fail. With `partial_output` a failing DOCX conversion leaves a truncated
/// file at the destination first.
#[derive(Default)]
pub struct FakeConverter {
    pub fail: bool,
    pub partial_output: bool,
    pub docx_inputs: Mutex<Vec<PathBuf>>,
    pub html_inputs: Mutex<Vec<String>>,
}

impl FakeConverter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn failing_after_partial_write() -> Self {
        Self {
            fail: true,
            partial_output: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.docx_inputs.lock().len() + self.html_inputs.lock().len()
    }
}

#[async_trait]
impl Converter for FakeConverter {
    async fn docx_to_pdf(&self, input: &Path, output: &Path) -> Result<PathBuf, ConversionError> {
        self.docx_inputs.lock().push(input.to_path_buf());
        if self.partial_output {
            std::fs::write(output, b"%PDF-1.7 trunc").map_err(ConversionError::MissingOutput)?;
        }
        if self.fail {
            return Err(ConversionError::Exit {
                program: "fake-office".to_string(),
                code: 1,
            });
        }
        assert!(input.exists(), "intermediate docx must exist during conversion");
        std::fs::write(output, b"%PDF-1.7 fake").map_err(ConversionError::MissingOutput)?;
        Ok(output.to_path_buf())
    }

    async fn html_to_pdf(&self, markup: &str) -> Result<Vec<u8>, ConversionError> {
        self.html_inputs.lock().push(markup.to_string());
        if self.fail {
            return Err(ConversionError::Exit {
                program: "fake-html".to_string(),
                code: 1,
            });
        }
        Ok(b"%PDF-1.7 fake".to_vec())
    }
}

/// Registry double whose writes always fail.
#[derive(Default)]
pub struct FailingRegistry {
    pub attempts: AtomicUsize,
}

impl FailingRegistry {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentRegistry for FailingRegistry {
    async fn record(
        &self,
        _owner_id: Uuid,
        _file_name: &str,
        _is_public: bool,
    ) -> Result<GeneratedDocument, RegistryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(RegistryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn list_for_owner(&self, _owner_id: Uuid) -> Result<Vec<GeneratedDocument>, RegistryError> {
        Err(RegistryError::Database(sqlx::Error::PoolTimedOut))
    }
}

/// Minimal DOCX package with the given main document part.
pub fn docx_package(document_xml: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let entries = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#,
        ),
        ("word/document.xml", document_xml),
    ];
    for (name, body) in entries {
        writer
            .start_file(name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(body.as_bytes()).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Temporary schema, template and output directories plus the stores wired to
/// them.
pub struct TestEnv {
    pub root: TempDir,
    pub directories: Directories,
    pub store: Arc<FsTemplateStore>,
    pub registry: Arc<InMemoryDocumentRegistry>,
    pub converter: Arc<FakeConverter>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_converter(FakeConverter::default())
    }

    pub fn with_converter(converter: FakeConverter) -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let directories = Directories::new(
            root.path().join("yamls"),
            root.path().join("templates"),
            root.path().join("outputs"),
        );
        directories.init().expect("init directories");

        let store = Arc::new(FsTemplateStore::new(
            directories.schema_dir.clone(),
            directories.template_dir.clone(),
        ));

        Self {
            root,
            directories,
            store,
            registry: Arc::new(InMemoryDocumentRegistry::new()),
            converter: Arc::new(converter),
        }
    }

    pub async fn add_schema(&self, template_id: &str, yaml: &str) {
        self.store.put_schema(template_id, yaml).await.expect("store schema");
    }

    pub async fn add_resource(&self, name: &str, bytes: &[u8]) {
        self.store
            .put_template_resource(name, bytes)
            .await
            .expect("store template resource");
    }

    pub async fn with_invoice(self) -> Self {
        self.add_schema("invoice", INVOICE_SCHEMA).await;
        self.add_resource("invoice.docx", &docx_package(INVOICE_DOCUMENT_XML))
            .await;
        self
    }

    pub fn pipeline(&self, policy: UnknownTypePolicy) -> GenerationPipeline {
        self.pipeline_with_registry(policy, self.registry.clone())
    }

    pub fn pipeline_with_registry(
        &self,
        policy: UnknownTypePolicy,
        registry: Arc<dyn DocumentRegistry>,
    ) -> GenerationPipeline {
        GenerationPipeline::new(
            self.store.clone(),
            self.converter.clone(),
            registry,
            self.directories.output_dir.clone(),
        )
        .with_unknown_type_policy(policy)
    }

    pub fn app_state(&self, jwt: JwtConfig) -> AppState {
        AppState::with_stores(
            &self.directories,
            self.converter.clone(),
            self.registry.clone(),
            Arc::new(InMemoryUserStore::new()),
            jwt,
            UnknownTypePolicy::Permissive,
        )
    }

    /// File names currently in the output directory.
    pub fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.directories.output_dir)
            .expect("read output dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
