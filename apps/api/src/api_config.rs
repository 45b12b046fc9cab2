use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use quire_application::AuditWriterConfig;
use quire_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Where records and audit entries live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres { database_url: String },
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub storage_backend: StorageBackend,
    pub api_host: String,
    pub api_port: u16,
    /// Serialized origin of `FRONTEND_URL`, used for CORS.
    pub frontend_origin: String,
    pub super_admin_subjects: Vec<String>,
    pub reader_subjects: Vec<String>,
    pub audit_writer: AuditWriterConfig,
    pub dev_seed: bool,
}

impl ApiConfig {
    pub fn load() -> AppResult<Self> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let storage_backend = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "memory".to_owned())
            .trim()
        {
            "memory" => StorageBackend::Memory,
            "postgres" => StorageBackend::Postgres {
                database_url: required_non_empty(&lookup, "DATABASE_URL")?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "STORAGE_BACKEND must be either 'memory' or 'postgres', got '{other}'"
                )));
            }
        };

        if migrate_only && storage_backend == StorageBackend::Memory {
            return Err(AppError::Validation(
                "the migrate command requires STORAGE_BACKEND=postgres".to_owned(),
            ));
        }

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());
        let frontend_origin = Url::parse(&frontend_url)
            .map_err(|error| AppError::Validation(format!("invalid FRONTEND_URL: {error}")))?
            .origin()
            .ascii_serialization();

        let defaults = AuditWriterConfig::default();
        let queue_capacity = match lookup("AUDIT_QUEUE_CAPACITY") {
            Some(value) => value.trim().parse::<usize>().map_err(|error| {
                AppError::Validation(format!("invalid AUDIT_QUEUE_CAPACITY: {error}"))
            })?,
            None => defaults.queue_capacity,
        };
        if queue_capacity == 0 {
            return Err(AppError::Validation(
                "AUDIT_QUEUE_CAPACITY must be at least 1".to_owned(),
            ));
        }
        let enqueue_timeout = match lookup("AUDIT_ENQUEUE_TIMEOUT_MS") {
            Some(value) => {
                let millis = value.trim().parse::<u64>().map_err(|error| {
                    AppError::Validation(format!("invalid AUDIT_ENQUEUE_TIMEOUT_MS: {error}"))
                })?;
                Duration::from_millis(millis)
            }
            None => defaults.enqueue_timeout,
        };

        let dev_seed = lookup("DEV_SEED")
            .unwrap_or_else(|| "false".to_owned())
            .eq_ignore_ascii_case("true");

        Ok(Self {
            migrate_only,
            storage_backend,
            api_host,
            api_port,
            frontend_origin,
            super_admin_subjects: subject_list(lookup("SUPER_ADMIN_SUBJECTS")),
            reader_subjects: subject_list(lookup("READER_SUBJECTS")),
            audit_writer: AuditWriterConfig {
                queue_capacity,
                enqueue_timeout,
            },
            dev_seed,
        })
    }

    pub fn socket_address(&self) -> AppResult<SocketAddr> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> AppResult<String> {
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn subject_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|subject| !subject.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
