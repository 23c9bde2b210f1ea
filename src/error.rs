use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] config::ConfigError),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
    #[error("Store error in `{collection}`: {message}")]
    StoreError {
        collection: &'static str,
        message: String,
    },
    #[error("Cache error for key `{key}`: {message}")]
    CacheError { key: String, message: String },
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl BillingError {
    pub fn store(collection: &'static str, message: impl Into<String>) -> Self {
        Self::StoreError {
            collection,
            message: message.into(),
        }
    }

    pub fn cache(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CacheError {
            key: key.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
