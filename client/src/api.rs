//! The reqwest-backed transport.

use crate::auth::TokenProvider;
use async_trait::async_trait;
use binder_engine::{
    AddCardResponse, CardDto, CardPatch, CollectionPage, Error, Result, ServerCard, SyncApi,
    SyncReport, SyncRequest,
};
use serde::Deserialize;
use std::time::Duration;

/// Default bound on any single request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how to reach the sync server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Error body the server returns on failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// [`SyncApi`] over HTTP.
pub struct HttpSyncApi<P> {
    http: reqwest::Client,
    base_url: String,
    tokens: P,
}

impl<P: TokenProvider> HttpSyncApi<P> {
    pub fn new(config: ClientConfig, tokens: P) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url,
            tokens,
        })
    }

    /// Update one row directly (partial update, server stamps
    /// `updated_at`). Used by single-field edits that should not wait for
    /// the next sync round.
    pub async fn update_card(&self, card_id: &str, patch: &CardPatch) -> Result<ServerCard> {
        let token = self.bearer()?;
        let response = self
            .execute(
                self.http
                    .put(self.url(&format!("/collection/{card_id}")))
                    .bearer_auth(&token)
                    .json(patch),
            )
            .await?;
        response.json().await.map_err(map_transport)
    }

    fn bearer(&self) -> Result<String> {
        self.tokens.token().ok_or(Error::Unauthenticated)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(map_transport)?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthenticated);
        }
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.to_string(),
            };
            tracing::warn!(status = status.as_u16(), %message, "request rejected");
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

fn map_transport(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Transport("request timed out".into())
    } else {
        Error::Transport(e.to_string())
    }
}

#[async_trait]
impl<P: TokenProvider> SyncApi for HttpSyncApi<P> {
    async fn push_batch(&self, cards: &[CardDto]) -> Result<SyncReport> {
        let token = self.bearer()?;
        tracing::debug!(count = cards.len(), "pushing dirty batch");

        let response = self
            .execute(
                self.http
                    .post(self.url("/collection/sync"))
                    .bearer_auth(&token)
                    .json(&SyncRequest {
                        cards: cards.to_vec(),
                    }),
            )
            .await?;
        response.json().await.map_err(map_transport)
    }

    async fn fetch_page(&self, page: u32, limit: u32) -> Result<CollectionPage> {
        let token = self.bearer()?;

        let response = self
            .execute(
                self.http
                    .get(self.url("/collection"))
                    .bearer_auth(&token)
                    .query(&[("page", page), ("limit", limit)]),
            )
            .await?;
        response.json().await.map_err(map_transport)
    }

    async fn add_card(&self, card: &CardDto) -> Result<AddCardResponse> {
        let token = self.bearer()?;

        let response = self
            .execute(
                self.http
                    .post(self.url("/collection"))
                    .bearer_auth(&token)
                    .json(card),
            )
            .await?;
        response.json().await.map_err(map_transport)
    }

    async fn delete_card(&self, card_id: &str) -> Result<()> {
        let token = self.bearer()?;

        self.execute(
            self.http
                .delete(self.url(&format!("/collection/{card_id}")))
                .bearer_auth(&token),
        )
        .await?;
        Ok(())
    }
}
