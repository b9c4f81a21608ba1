use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public WattTime sample of 5-minute MOER values.
pub const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/WattTime/software_modeling/master/MOERS.csv";

/// Where the dataset comes from and where it is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetConfig {
    /// Download location
    pub url: String,
    /// Cache directory (default: "data")
    pub data_dir: PathBuf,
    /// File name inside `data_dir` (default: "MOERS.csv")
    pub file_name: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            url: DEFAULT_DATASET_URL.to_string(),
            data_dir: PathBuf::from("data"),
            file_name: "MOERS.csv".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl DatasetConfig {
    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

/// Errors that can occur while acquiring the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    /// HTTP client creation failed
    ClientCreation(String),
    /// Request could not be sent or the body could not be read
    Network(String),
    /// Server answered with a non-success status
    Http(String),
    /// Local cache could not be prepared or written
    Io(String),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::ClientCreation(msg) => write!(f, "Client creation error: {}", msg),
            DatasetError::Network(msg) => write!(f, "Network error: {}", msg),
            DatasetError::Http(msg) => write!(f, "HTTP error: {}", msg),
            DatasetError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for DatasetError {}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::Io(err.to_string())
    }
}

/// Downloads the MOER dataset once and reuses the cached copy afterwards.
#[derive(Debug)]
pub struct DatasetFetcher {
    client: Client,
    config: DatasetConfig,
}

impl DatasetFetcher {
    /// Creates a fetcher with its own HTTP client.
    ///
    /// # Arguments
    /// * `config` - Download location, cache directory and request timeout
    ///
    /// # Returns
    /// Returns `Ok(DatasetFetcher)` if successful, or an error if HTTP client creation fails.
    pub fn new(config: DatasetConfig) -> Result<Self, DatasetError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DatasetError::ClientCreation(e.to_string()))?;

        Ok(DatasetFetcher { client, config })
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Returns the path of the cached dataset, downloading it first if needed.
    ///
    /// When the file is missing, whatever occupies `data_dir` (a stale file or
    /// a directory without the dataset) is removed and the directory is
    /// recreated before downloading. There are no retries.
    ///
    /// # Returns
    /// Path to the dataset file inside `data_dir`.
    ///
    /// # Errors
    /// Returns `DatasetError` if the cache cannot be prepared, the request
    /// fails or the server answers with a non-success status.
    pub async fn ensure_dataset(&self) -> Result<PathBuf, DatasetError> {
        let path = self.config.dataset_path();
        if path.is_file() {
            log::debug!("Using cached dataset at {}", path.display());
            return Ok(path);
        }

        self.reset_data_dir().await?;

        log::info!("Downloading dataset from {}", self.config.url);
        let body = self.fetch().await?;
        tokio::fs::write(&path, body.as_bytes()).await?;
        log::info!("Saved {} bytes to {}", body.len(), path.display());

        Ok(path)
    }

    async fn reset_data_dir(&self) -> Result<(), DatasetError> {
        let dir: &Path = &self.config.data_dir;
        if dir.is_dir() {
            log::warn!("Removing incomplete data directory {}", dir.display());
            tokio::fs::remove_dir_all(dir).await?;
        } else if dir.exists() {
            log::warn!("Removing file in place of data directory {}", dir.display());
            tokio::fs::remove_file(dir).await?;
        }
        tokio::fs::create_dir_all(dir).await?;
        Ok(())
    }

    async fn fetch(&self) -> Result<String, DatasetError> {
        let response = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(|e| DatasetError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DatasetError::Http(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            )));
        }

        response
            .text()
            .await
            .map_err(|e| DatasetError::Network(e.to_string()))
    }
}
