//! Runtime settings read from the environment
//!
//! Every variable has a default, so an empty environment yields the
//! settings of the original deployment. A dotenv file is sourced by the
//! binary before [`Settings::from_env`] is called.

use crate::client::{Auth, ElasticsearchClient, PostgresClient};
use eyre::{Context, Result};
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_SNAPSHOT_PATH: &str = "/opt/airflow/dags/P2M3_destriana_ramadani_data_clean.csv";

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Connection parameters for the source database
#[derive(Clone)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub table: String,
}

impl PostgresSettings {
    /// Read settings from the environment
    ///
    /// Expected environment variables:
    /// - POSTGRES_HOST (default `postgres`)
    /// - POSTGRES_PORT (default `5432`)
    /// - POSTGRES_DB (default `airflow`)
    /// - POSTGRES_USER (default `airflow`)
    /// - POSTGRES_PASSWORD (default `airflow`)
    /// - SOURCE_TABLE (default `table_m3`)
    pub fn from_env() -> Result<Self> {
        let port = var_or("POSTGRES_PORT", "5432");
        let port = port
            .trim()
            .parse()
            .with_context(|| format!("Invalid POSTGRES_PORT: {}", port))?;

        Ok(Self {
            host: var_or("POSTGRES_HOST", "postgres"),
            port,
            database: var_or("POSTGRES_DB", "airflow"),
            username: var_or("POSTGRES_USER", "airflow"),
            password: var_or("POSTGRES_PASSWORD", "airflow"),
            table: var_or("SOURCE_TABLE", "table_m3"),
        })
    }

    pub fn client(&self) -> PostgresClient {
        PostgresClient::new(
            &self.host,
            self.port,
            &self.database,
            &self.username,
            &self.password,
        )
    }
}

impl std::fmt::Display for PostgresSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "postgres://{}:***@{}:{}/{} (table: {})",
            self.username, self.host, self.port, self.database, self.table
        )
    }
}

/// Search engine coordinates and credentials
#[derive(Clone)]
pub struct ElasticsearchSettings {
    pub url: Url,
    pub index: String,
    pub doc_type: String,
    pub auth: Auth,
}

impl ElasticsearchSettings {
    /// Read settings from the environment
    ///
    /// Expected environment variables:
    /// - ELASTICSEARCH_URL (default `http://elasticsearch:9200`)
    /// - ELASTICSEARCH_INDEX (default `data_milestone`)
    /// - ELASTICSEARCH_DOC_TYPE (default `doc`)
    /// - ELASTICSEARCH_USERNAME / ELASTICSEARCH_PASSWORD: basic auth (optional)
    /// - ELASTICSEARCH_APIKEY: API key auth (optional, wins over basic auth)
    pub fn from_env() -> Result<Self> {
        let url_str = var_or("ELASTICSEARCH_URL", "http://elasticsearch:9200");
        let url = Url::parse(&url_str)
            .with_context(|| format!("Invalid ELASTICSEARCH_URL: {}", url_str))?;

        let auth = Auth::new(
            std::env::var("ELASTICSEARCH_USERNAME").ok(),
            std::env::var("ELASTICSEARCH_PASSWORD").ok(),
            std::env::var("ELASTICSEARCH_APIKEY").ok(),
        );

        Ok(Self {
            url,
            index: var_or("ELASTICSEARCH_INDEX", "data_milestone"),
            doc_type: var_or("ELASTICSEARCH_DOC_TYPE", "doc"),
            auth,
        })
    }

    pub fn client(&self) -> Result<ElasticsearchClient> {
        ElasticsearchClient::try_new(
            self.url.clone(),
            self.auth.clone(),
            &self.index,
            &self.doc_type,
        )
        .context("Failed to create Elasticsearch client")
    }
}

impl std::fmt::Display for ElasticsearchSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (index: {}, type: {}, auth: {})",
            self.url, self.index, self.doc_type, self.auth
        )
    }
}

/// Everything the job needs to run
#[derive(Clone)]
pub struct Settings {
    pub postgres: PostgresSettings,
    pub elasticsearch: ElasticsearchSettings,
    pub snapshot_path: PathBuf,
}

impl Settings {
    /// Read all settings from the environment
    ///
    /// `SNAPSHOT_PATH` names the CSV file shared by the stages.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            postgres: PostgresSettings::from_env()?,
            elasticsearch: ElasticsearchSettings::from_env()?,
            snapshot_path: PathBuf::from(var_or("SNAPSHOT_PATH", DEFAULT_SNAPSHOT_PATH)),
        })
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "source:   {}", self.postgres)?;
        writeln!(f, "snapshot: {}", self.snapshot_path.display())?;
        write!(f, "target:   {}", self.elasticsearch)
    }
}
