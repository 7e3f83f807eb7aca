use thiserror::Error;

/// Per-document retrieval failure. The run reports it and moves on.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse API response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Wikipedia error: {0}")]
    Api(String),

    #[error("No page text in response for {0}")]
    MissingText(String),
}
