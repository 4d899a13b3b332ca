//!
//! src/fetch.rs  Andrew Belles  Oct 3rd, 2025
//!
//! Defines methods for hitting the token and playlist endpoints
//! and returning unparsed data. Requests are single attempt;
//! auth and rate limit statuses map to their own error kinds
//!

use reqwest::{Client, header, redirect, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::config::{HttpConfig, PlaylistConfig, SpotifyConfig};
use crate::errors::PipelineError;

/// Client building functionality
fn client_helper(http: &HttpConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(http.timeout)
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Some(http.pool_idle_timeout))
        .redirect(redirect::Policy::limited(http.max_redirects as usize))
}

pub fn base_client(http: &HttpConfig) -> Result<Client, PipelineError> {
    let mut h = header::HeaderMap::new();
    h.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    client_helper(http)
        .default_headers(h)
        .build()
        .map_err(|e| PipelineError::Http(format!("build client: {e}")))
}

///
/// Single attempt send. 401/403 surface as auth errors, 429 as
/// rate limited carrying the server's Retry-After when present
///
pub async fn send_json(request: RequestBuilder) -> Result<Value, PipelineError> {
    let response = request.send().await
        .map_err(|e| PipelineError::Http(format!("send: {e}")))?;

    let status = response.status();
    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(PipelineError::Auth(format!("status {status}")));
    }
    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        return Err(PipelineError::RateLimited(format!("retry-after {retry_after}")));
    }
    if !status.is_success() {
        return Err(PipelineError::Http(format!("status {status}")));
    }

    response.json::<Value>().await
        .map_err(|e| PipelineError::Http(format!("decode: {e}")))
}

#[derive(Clone, Debug)]
pub struct SpotifyClient {
    pub http: Client,
    pub cfg: SpotifyConfig
}

impl SpotifyClient {
    pub fn new(http_config: &HttpConfig, cfg: &SpotifyConfig) ->
        Result<Self, PipelineError> {

        let http = base_client(http_config)?;
        Ok( Self {
            http,
            cfg: cfg.clone()
        })
    }

    pub fn token_request(&self) -> RequestBuilder {
        self.http
            .post(self.cfg.token_url.clone())
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
    }

    /// GET /v1/playlists/{id}/tracks?limit=&offset=
    pub fn playlist_items(&self, playlist_id: &str, limit: u32, offset: u32, bearer: &str)
        -> RequestBuilder {
        let url = self.cfg.api_base
            .join(&format!("playlists/{playlist_id}/tracks"))
            .unwrap();
        self.http.get(url).bearer_auth(bearer).query(&[
            ("limit", &limit.to_string()),
            ("offset", &offset.to_string())
        ])
    }

    /// Client-credentials grant; returns the bearer token
    pub async fn access_token(&self) -> Result<String, PipelineError> {
        let request = self.token_request()
            .basic_auth(&self.cfg.client_id, Some(&self.cfg.client_secret));
        let response = send_json(request).await?;
        let token = response["access_token"].as_str()
            .ok_or_else(|| PipelineError::Auth("no access_token in response".into()))?
            .to_string();
        Ok(token)
    }
}

///
/// Walks the playlist pages once, up to cfg.max_pages, and
/// returns the raw item objects untouched
///
pub async fn fetch_playlist_batch(
    client: &SpotifyClient,
    cfg: &PlaylistConfig,
    bearer: &str
) -> Result<Vec<Value>, PipelineError> {
    let mut entries: Vec<Value> = Vec::new();
    let mut offset: u32 = 0;

    for page in 0..cfg.max_pages {
        let request = client.playlist_items(
            &cfg.playlist_id,
            cfg.page_limit,
            offset,
            bearer
        );
        let body = send_json(request).await?;

        let items = body.get("items")
            .and_then(|v| v.as_array())
            .cloned()
            .ok_or_else(|| PipelineError::Http(
                "playlist response missing items".into()
            ))?;

        let count = items.len();
        debug!(page, offset, count, "extract.page");

        entries.extend(items);
        offset += count as u32;

        let has_next = body.get("next").map(|v| !v.is_null()).unwrap_or(false);
        if count < cfg.page_limit as usize || !has_next {
            break;
        }
    }

    Ok(entries)
}
