use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::shared::sources::schema::ColumnMapping;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data_source: DataSourceConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub rest_api: RestApiConfig,
    #[serde(default)]
    pub local_file: LocalFileConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub columns: ColumnMapping,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    Warehouse,
    RestApi,
    #[default]
    LocalFile,
}

impl DataSourceKind {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "warehouse" | "bigquery" | "database" => Some(DataSourceKind::Warehouse),
            "rest_api" | "rest" | "api" => Some(DataSourceKind::RestApi),
            "local_file" | "local" | "file" | "csv" => Some(DataSourceKind::LocalFile),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DataSourceConfig {
    #[serde(default)]
    pub kind: DataSourceKind,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WarehouseConfig {
    /// sea-orm connection string, e.g. `sqlite://target/db/warehouse.db?mode=ro`
    pub url: String,
    pub actuals_table: String,
    pub predictions_table: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            actuals_table: "FactSales".to_string(),
            predictions_table: "FactSalesPredictions".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RestApiConfig {
    pub base_url: String,
    pub version: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RestApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            version: "v1".to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LocalFileConfig {
    pub actuals_path: String,
    pub predictions_path: String,
}

impl Default for LocalFileConfig {
    fn default() -> Self {
        Self {
            actuals_path: "data/actuals.csv".to_string(),
            predictions_path: "data/predictions.csv".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryConfig {
    /// Year the period filter opens on when a request names no window
    pub default_year: i32,
    /// Per-fetch record cap, 0 = unlimited
    pub max_rows: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_year: 2007,
            max_rows: 0,
        }
    }
}

impl QueryConfig {
    pub fn row_cap(&self) -> Option<usize> {
        if self.max_rows == 0 {
            None
        } else {
            Some(self.max_rows)
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000

[data_source]
kind = "local_file"

[local_file]
actuals_path = "data/actuals.csv"
predictions_path = "data/predictions.csv"

[query]
default_year = 2007
max_rows = 0
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// Environment variables are applied on top, then the result is validated.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = read_config_file()?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    tracing::info!(
        "Data source: {:?}, default year {}, row cap {:?}",
        config.data_source.kind,
        config.query.default_year,
        config.query.row_cap()
    );
    Ok(config)
}

fn read_config_file() -> anyhow::Result<Config> {
    // Try to find config.toml next to the executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    // Fall back to default config
    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Applies `DATA_SOURCE`, `WAREHOUSE_URL`, `API_BASE_URL`, `API_VERSION`,
/// `API_KEY`, `ACTUALS_FILE`, `PREDICTIONS_FILE`, `DEFAULT_YEAR`, `MAX_ROWS`
/// and `SERVER_PORT` from `lookup`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(kind) = lookup("DATA_SOURCE") {
        config.data_source.kind = DataSourceKind::from_code(&kind)
            .ok_or_else(|| anyhow::anyhow!("Unknown DATA_SOURCE '{}'", kind))?;
    }
    if let Some(url) = lookup("WAREHOUSE_URL") {
        config.warehouse.url = url;
    }
    if let Some(base_url) = lookup("API_BASE_URL") {
        config.rest_api.base_url = base_url;
    }
    if let Some(version) = lookup("API_VERSION") {
        config.rest_api.version = version;
    }
    if let Some(key) = lookup("API_KEY") {
        config.rest_api.api_key = Some(key);
    }
    if let Some(path) = lookup("ACTUALS_FILE") {
        config.local_file.actuals_path = path;
    }
    if let Some(path) = lookup("PREDICTIONS_FILE") {
        config.local_file.predictions_path = path;
    }
    if let Some(year) = lookup("DEFAULT_YEAR") {
        config.query.default_year = year
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid DEFAULT_YEAR '{}': {}", year, e))?;
    }
    if let Some(max_rows) = lookup("MAX_ROWS") {
        config.query.max_rows = max_rows
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid MAX_ROWS '{}': {}", max_rows, e))?;
    }
    if let Some(port) = lookup("SERVER_PORT") {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid SERVER_PORT '{}': {}", port, e))?;
    }
    Ok(())
}

/// Checks that the selected data source is fully configured.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    match config.data_source.kind {
        DataSourceKind::Warehouse if config.warehouse.url.trim().is_empty() => {
            anyhow::bail!("[warehouse] url is required for the warehouse data source")
        }
        DataSourceKind::RestApi if config.rest_api.base_url.trim().is_empty() => {
            anyhow::bail!("[rest_api] base_url is required for the rest_api data source")
        }
        DataSourceKind::LocalFile
            if config.local_file.actuals_path.trim().is_empty()
                || config.local_file.predictions_path.trim().is_empty() =>
        {
            anyhow::bail!("[local_file] actuals_path and predictions_path are required")
        }
        _ => Ok(()),
    }
}

/// Resolves a data file path from configuration.
/// Relative paths are resolved relative to the executable directory
pub fn resolve_data_path(path: &str) -> PathBuf {
    let data_path = Path::new(path);

    // If absolute path, use as is
    if data_path.is_absolute() {
        return data_path.to_path_buf();
    }

    // If relative path, resolve it relative to the executable directory
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(data_path);
        }
    }

    // Fallback: use relative to current directory
    PathBuf::from(path)
}
