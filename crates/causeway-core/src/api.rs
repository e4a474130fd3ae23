use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use causeway_shared::{CategoriesUpdate, CauseDto};
use tracing::{debug, info, warn};

use crate::error::{TaggingError, TaggingResult};

pub const CATEGORIES_PATH: &str = "missions/categories/";
pub const USER_CATEGORIES_PATH: &str = "missions/categories/user/";

/// Remote category service.
#[async_trait]
pub trait CategoryApi: Send + Sync {
    /// `GET missions/categories/`, optionally with a bearer token.
    async fn fetch_categories(&self, token: Option<&str>) -> TaggingResult<Vec<CauseDto>>;

    /// `PUT missions/categories/user/`. The server replaces the user's
    /// stored set with `ids`.
    async fn replace_user_categories(&self, token: &str, ids: &[u64]) -> TaggingResult<()>;
}

#[async_trait]
impl<T> CategoryApi for Arc<T>
where
    T: CategoryApi + ?Sized,
{
    async fn fetch_categories(&self, token: Option<&str>) -> TaggingResult<Vec<CauseDto>> {
        (**self).fetch_categories(token).await
    }

    async fn replace_user_categories(&self, token: &str, ids: &[u64]) -> TaggingResult<()> {
        (**self).replace_user_categories(token, ids).await
    }
}

#[derive(Debug, Clone)]
pub struct HttpCategoryApi {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpCategoryApi {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = normalize_base_url(base_url);
        if base_url.is_empty() {
            anyhow::bail!("api.base_url is empty");
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building HTTP client for category api")?;

        info!(base_url = %base_url, timeout_secs = timeout.as_secs(), "configured category api");
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn transport_error(&self, err: &reqwest::Error) -> Option<TaggingError> {
        err.is_timeout().then(|| TaggingError::Timeout(self.timeout.as_secs()))
    }
}

#[async_trait]
impl CategoryApi for HttpCategoryApi {
    #[tracing::instrument(skip(self, token), fields(authenticated = token.is_some()))]
    async fn fetch_categories(&self, token: Option<&str>) -> TaggingResult<Vec<CauseDto>> {
        let url = self.endpoint(CATEGORIES_PATH);
        let mut request = self
            .client
            .get(url.as_str())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|err| {
            warn!(url = %url, error = %err, "failed requesting cause catalog");
            self.transport_error(&err)
                .unwrap_or_else(|| TaggingError::fetch(None, err.to_string()))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), "cause catalog request rejected");
            return Err(TaggingError::fetch(Some(status.as_u16()), body_or_reason(&body, status)));
        }

        let feed = response.json::<Vec<CauseDto>>().await.map_err(|err| {
            warn!(url = %url, error = %err, "failed decoding cause catalog");
            TaggingError::fetch(Some(status.as_u16()), format!("invalid catalog body: {err}"))
        })?;

        debug!(count = feed.len(), "decoded cause catalog");
        Ok(feed)
    }

    #[tracing::instrument(skip(self, token), fields(count = ids.len()))]
    async fn replace_user_categories(&self, token: &str, ids: &[u64]) -> TaggingResult<()> {
        let url = self.endpoint(USER_CATEGORIES_PATH);
        let body = CategoriesUpdate {
            categories: ids.to_vec(),
        };

        let response = self
            .client
            .put(url.as_str())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(url = %url, error = %err, "failed sending cause selection");
                self.transport_error(&err)
                    .unwrap_or_else(|| TaggingError::submit(None, err.to_string()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), "cause selection rejected");
            return Err(TaggingError::submit(Some(status.as_u16()), body_or_reason(&body, status)));
        }

        info!(count = ids.len(), "saved cause selection");
        Ok(())
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn body_or_reason(body: &str, status: reqwest::StatusCode) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        trimmed.to_string()
    }
}
