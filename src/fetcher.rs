use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::FetchError;

/// Anything that can turn a document title into raw markup.
pub trait DocumentSource {
    async fn fetch_markup(&self, title: &str) -> Result<String, FetchError>;
}

/// MediaWiki `action=parse` client.
pub struct WikiClient {
    client: reqwest::Client,
    api_url: String,
}

impl WikiClient {
    pub fn new(api_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(WikiClient {
            client,
            api_url: api_url.to_string(),
        })
    }
}

impl DocumentSource for WikiClient {
    async fn fetch_markup(&self, title: &str) -> Result<String, FetchError> {
        debug!("GET {} page={}", self.api_url, title);
        let body = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "parse"),
                ("page", title),
                ("prop", "text"),
                ("formatversion", "2"),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_api_body(title, &body)
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    parse: Option<ParsedPage>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ParsedPage {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    code: Option<String>,
    info: Option<String>,
}

/// Pull the rendered page HTML out of a `formatversion=2` parse response.
fn parse_api_body(title: &str, body: &str) -> Result<String, FetchError> {
    let resp: ApiResponse = serde_json::from_str(body)?;
    if let Some(err) = resp.error {
        let msg = err
            .info
            .or(err.code)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(FetchError::Api(msg));
    }
    resp.parse
        .and_then(|p| p.text)
        .ok_or_else(|| FetchError::MissingText(title.to_string()))
}
