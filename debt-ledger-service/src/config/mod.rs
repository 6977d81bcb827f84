use serde::Deserialize;
use service_core::config::{self as core_config, get_env, is_production};
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    /// OTLP collector for spans; logs only when unset.
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub summary: SummaryStrategy,
}

/// Where customers and transactions live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    /// Process-local; everything is lost on restart.
    Memory,
}

/// How the Mongo store computes the system summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStrategy {
    /// Fetch every row and fold in the service.
    #[default]
    Scan,
    /// Group inside the database with an aggregation pipeline.
    Pipeline,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown STORE_BACKEND '{}' (expected mongo or memory)",
                other
            ))),
        }
    }
}

impl FromStr for SummaryStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scan" => Ok(Self::Scan),
            "pipeline" => Ok(Self::Pipeline),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown SUMMARY_STRATEGY '{}' (expected scan or pipeline)",
                other
            ))),
        }
    }
}

impl LedgerConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = is_production();

        let backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "mongo".to_string())
            .parse()?;
        let summary: SummaryStrategy = env::var("SUMMARY_STRATEGY")
            .unwrap_or_else(|_| "scan".to_string())
            .parse()?;

        // The memory backend never dials Mongo, so the URI is only required
        // when it will be used.
        let uri = match backend {
            StoreBackend::Mongo => get_env("MONGODB_URI", None, is_prod)?,
            StoreBackend::Memory => env::var("MONGODB_URI").unwrap_or_default(),
        };

        Ok(LedgerConfig {
            common: common_config,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "debt-ledger-service".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            mongodb: MongoConfig {
                uri,
                database: get_env("MONGODB_DATABASE", Some("debt_ledger"), is_prod)?,
            },
            store: StoreConfig { backend, summary },
        })
    }

    /// In-memory configuration on an ephemeral port, for tests and demos.
    pub fn in_memory() -> Self {
        LedgerConfig {
            common: core_config::Config { port: 0 },
            service_name: "debt-ledger-service".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            mongodb: MongoConfig {
                uri: String::new(),
                database: "debt_ledger".to_string(),
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                summary: SummaryStrategy::Scan,
            },
        }
    }
}
