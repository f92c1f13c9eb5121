use thiserror::Error;

/// Failures from the remote Ask/Judge collaborator.
///
/// The runner inspects these per pair and converts them into stored ERROR
/// records; they never abort a run.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error calling {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("api error (status {status}): {body}")]
    Status { status: u16, body: String },

    /// The response arrived but did not match the expected shape. Decoding
    /// fails closed: any missing or mismatched required field lands here.
    #[error("malformed api response: {0}")]
    Decode(String),
}

/// Failures in the per-model result store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid result store {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Startup configuration failures. Fatal before any remote call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API key configured: set OPENROUTER_API_KEY or pass --api-key")]
    MissingApiKey,
}
