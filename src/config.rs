//! Runtime configuration loaded from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::generation::validation::UnknownTypePolicy;

const DEFAULT_JWT_SECRET: &str = "docgen-jwt-secret-change-in-production";
const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60; // 1 hour
const DEFAULT_CONVERSION_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Where schemas, template resources and generated artifacts live.
#[derive(Debug, Clone)]
pub struct Directories {
    pub schema_dir: PathBuf,
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Directories {
    pub fn new(
        schema_dir: impl Into<PathBuf>,
        template_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            template_dir: template_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Create every configured directory. Called once by the hosting process
    /// before the pipeline is built.
    pub fn init(&self) -> std::io::Result<()> {
        for dir in [&self.schema_dir, &self.template_dir, &self.output_dir] {
            std::fs::create_dir_all(dir)?;
            log::debug!("Directory ready: {}", dir.display());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl_secs: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
        }
    }
}

/// Which conversion backend turns documents into PDF.
#[derive(Debug, Clone, PartialEq)]
pub enum ConverterSettings {
    Office {
        soffice_bin: String,
        html_to_pdf_bin: String,
    },
    Gotenberg {
        base_url: String,
    },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub directories: Directories,
    pub jwt: JwtConfig,
    pub converter: ConverterSettings,
    pub conversion_timeout: Duration,
    pub unknown_type_policy: UnknownTypePolicy,
    pub allowed_origins: Vec<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("JWT_SECRET not set, using default secret. SET THIS IN PRODUCTION!");
            DEFAULT_JWT_SECRET.to_string()
        });

        let converter = match var_or("CONVERTER", "office").as_str() {
            "office" => ConverterSettings::Office {
                soffice_bin: var_or("SOFFICE_BIN", "soffice"),
                html_to_pdf_bin: var_or("HTML_TO_PDF_BIN", "wkhtmltopdf"),
            },
            "gotenberg" => ConverterSettings::Gotenberg {
                base_url: var_or("GOTENBERG_URL", "http://127.0.0.1:3000"),
            },
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "CONVERTER",
                    value: other.to_string(),
                })
            }
        };

        let unknown_type_policy = if parse_var("STRICT_PARAMETER_TYPES", false)? {
            UnknownTypePolicy::Strict
        } else {
            UnknownTypePolicy::Permissive
        };

        let allowed_origins = var_or("ALLOWED_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", 8080)?,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            directories: Directories::new(
                var_or("SCHEMA_DIR", "./yamls"),
                var_or("TEMPLATE_DIR", "./templates"),
                var_or("OUTPUT_DIR", "./outputs"),
            ),
            jwt: JwtConfig {
                secret: jwt_secret,
                access_token_ttl_secs: parse_var(
                    "ACCESS_TOKEN_TTL_SECS",
                    DEFAULT_ACCESS_TOKEN_TTL_SECS,
                )?,
            },
            converter,
            conversion_timeout: Duration::from_secs(parse_var(
                "CONVERSION_TIMEOUT_SECS",
                DEFAULT_CONVERSION_TIMEOUT_SECS,
            )?),
            unknown_type_policy,
            allowed_origins,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_accepts_numbers_and_bools() {
        let port: u16 = parse_value("PORT", " 9090 ").unwrap();
        assert_eq!(port, 9090);
        let strict: bool = parse_value("STRICT_PARAMETER_TYPES", "true").unwrap();
        assert!(strict);
    }

    #[test]
    fn test_parse_value_reports_key() {
        let err = parse_value::<u16>("PORT", "eighty").unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn test_directories_init_creates_all() {
        let root = tempfile::tempdir().unwrap();
        let dirs = Directories::new(
            root.path().join("yamls"),
            root.path().join("templates"),
            root.path().join("nested/outputs"),
        );
        dirs.init().unwrap();
        assert!(dirs.schema_dir.is_dir());
        assert!(dirs.template_dir.is_dir());
        assert!(dirs.output_dir.is_dir());
    }
}
