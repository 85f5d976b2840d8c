//! Paste store HTTP API
//!
//! One-shot requests against the paste service: load, update and create
//! pastes, read the audit history and retire entries.

use reqwest::header::LOCATION;
use reqwest::{redirect, StatusCode, Url};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::models::{HistoryEntry, Paste, PasteId};

/// User agent sent with every request
const USER_AGENT: &str = concat!("pastesync/", env!("CARGO_PKG_VERSION"));

/// Operations the live session needs from the paste store
///
/// Implemented over HTTP by [`HttpPasteStore`]; tests provide in-memory
/// versions.
#[allow(async_fn_in_trait)]
pub trait PasteStore {
    /// Load the current paste (`GET /api/{id}`)
    async fn fetch(&self, id: &PasteId) -> ClientResult<Paste>;

    /// Replace the paste body (`PUT /{id}`)
    async fn update(&self, id: &PasteId, text: &str) -> ClientResult<()>;
}

/// Reject empty or whitespace-only content before any request is made
pub fn validate_content(text: &str) -> ClientResult<()> {
    if text.trim().is_empty() {
        return Err(ClientError::EmptyContent);
    }
    Ok(())
}

/// Paste store client over HTTP
#[derive(Debug, Clone)]
pub struct HttpPasteStore {
    client: reqwest::Client,
    config: Config,
}

impl HttpPasteStore {
    /// Create a client for the configured server
    pub fn new(config: &Config) -> ClientResult<Self> {
        // Redirects are read, not followed: paste creation answers with one
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        self.config
            .api_url(path)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    /// Create a new paste (`POST /create`), returning its id
    pub async fn create(&self, text: &str) -> ClientResult<PasteId> {
        validate_content(text)?;

        let url = self.url("/create")?;
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .form(&[("text", text)])
            .send()
            .await?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();

        let id = check_create_response(status, location.as_deref(), &body)?;
        info!("Created paste {}", id);
        Ok(id)
    }

    /// Read the audit history, newest first (`GET /api/history`)
    pub async fn history(&self) -> ClientResult<Vec<HistoryEntry>> {
        let url = self.url("/api/history")?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("History request failed with {}", status);
            return Err(rejected(status, &body));
        }

        Ok(response.json().await?)
    }

    /// Retire a paste (`POST /api/history/{id}/delete`)
    pub async fn delete(&self, id: &PasteId) -> ClientResult<()> {
        let url = self.url(&format!("/api/history/{}/delete", id))?;
        debug!("POST {}", url);
        let response = self.client.post(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound { id: id.to_string() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(rejected(status, &body));
        }

        info!("Deleted paste {}", id);
        Ok(())
    }
}

impl PasteStore for HttpPasteStore {
    async fn fetch(&self, id: &PasteId) -> ClientResult<Paste> {
        let url = self.url(&format!("/api/{}", id))?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            debug!("Load of {} failed with {}", id, response.status());
            return Err(ClientError::NotFound { id: id.to_string() });
        }

        Ok(response.json().await?)
    }

    async fn update(&self, id: &PasteId, text: &str) -> ClientResult<()> {
        validate_content(text)?;

        let url = self.url(&format!("/{}", id))?;
        debug!("PUT {} ({} bytes)", url, text.len());
        let response = self.client.put(url).body(text.to_string()).send().await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        check_update_status(id, status, &body)
    }
}

/// Map a `PUT /{id}` response status to the save outcome
fn check_update_status(id: &PasteId, status: StatusCode, body: &str) -> ClientResult<()> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::GONE => Err(ClientError::Gone { id: id.to_string() }),
        StatusCode::PAYLOAD_TOO_LARGE => Err(ClientError::TooLarge {
            message: body.trim().to_string(),
        }),
        s => Err(rejected(s, body)),
    }
}

/// Map a `POST /create` response to the new paste id
fn check_create_response(
    status: StatusCode,
    location: Option<&str>,
    body: &str,
) -> ClientResult<PasteId> {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return Err(ClientError::TooLarge {
            message: body.trim().to_string(),
        });
    }

    if status.is_redirection() {
        let location = location.ok_or_else(|| {
            ClientError::UnexpectedResponse("redirect without Location header".to_string())
        })?;
        return Ok(PasteId::parse(location)?);
    }

    if status.is_success() {
        return Err(ClientError::UnexpectedResponse(format!(
            "expected a redirect to the new paste, got {}",
            status
        )));
    }

    Err(rejected(status, body))
}

fn rejected(status: StatusCode, body: &str) -> ClientError {
    let message = match body.trim() {
        "" => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        text => text.to_string(),
    };
    ClientError::Rejected {
        status: status.as_u16(),
        message,
    }
}
