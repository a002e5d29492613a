//! otakudesu API client.

use super::error::ApiError;
use super::types::*;
use crate::source::CatalogApi;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::config::ApiConfig;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest slice of an error body kept in [`ApiError::Status`]
const MAX_ERROR_BODY: usize = 200;

/// Every GET the browser issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Home,
    Schedule,
    Genres,
    Search(&'a str),
    AnimeDetail(&'a str),
    GenreAnime { genre_id: &'a str, page: u32 },
    Completed { page: u32 },
    Ongoing { page: u32 },
}

impl Endpoint<'_> {
    /// Path and query relative to the base URL
    pub fn path(&self) -> String {
        match self {
            Endpoint::Home => "/home".to_string(),
            Endpoint::Schedule => "/schedule".to_string(),
            Endpoint::Genres => "/genres".to_string(),
            Endpoint::Search(keyword) => format!("/search?q={}", urlencoding::encode(keyword)),
            Endpoint::AnimeDetail(anime_id) => format!("/anime/{}", urlencoding::encode(anime_id)),
            Endpoint::GenreAnime { genre_id, page } => {
                format!("/genres/{}?page={}", urlencoding::encode(genre_id), page)
            }
            Endpoint::Completed { page } => format!("/completed?page={}", page),
            Endpoint::Ongoing { page } => format!("/ongoing?page={}", page),
        }
    }
}

/// otakudesu API client
#[derive(Debug, Clone)]
pub struct OtakudesuClient {
    /// HTTP client
    client: Client,
    /// Base URL without a trailing slash
    base_url: String,
}

impl OtakudesuClient {
    /// Create a new client. Without a timeout the transport default applies.
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let base_url: String = base_url.into();
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the `[api]` configuration section
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(
            config.base_url.clone(),
            &config.user_agent,
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an endpoint
    pub fn url(&self, endpoint: Endpoint<'_>) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Issue a GET and parse the response envelope.
    ///
    /// The body is parsed whatever the HTTP status, since the API reports
    /// failures through `ok: false`. Only a body that is not an envelope at
    /// all turns a non-success status into [`ApiError::Status`].
    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint<'_>) -> Result<ApiResponse<T>, ApiError> {
        let url = self.url(endpoint);
        debug!(url = %url, "Making API request");

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Request error");
            ApiError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        match parse_response::<T>(&body) {
            Ok(parsed) => {
                debug!(url = %url, ok = parsed.ok, status = %status, "Request complete");
                Ok(parsed)
            }
            Err(_) if !status.is_success() => {
                warn!(url = %url, status = %status, "Request failed");
                Err(ApiError::Status {
                    status: status.as_u16(),
                    message: body.chars().take(MAX_ERROR_BODY).collect(),
                })
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to parse response");
                Err(e.into())
            }
        }
    }
}

impl CatalogApi for OtakudesuClient {
    async fn home(&self) -> Result<ApiResponse<HomeData>, ApiError> {
        self.get(Endpoint::Home).await
    }

    async fn schedule(&self) -> Result<ApiResponse<ScheduleData>, ApiError> {
        self.get(Endpoint::Schedule).await
    }

    async fn genres(&self) -> Result<ApiResponse<GenreListData>, ApiError> {
        self.get(Endpoint::Genres).await
    }

    async fn search(&self, keyword: &str) -> Result<ApiResponse<AnimeListData>, ApiError> {
        self.get(Endpoint::Search(keyword)).await
    }

    async fn anime_detail(&self, anime_id: &str) -> Result<ApiResponse<AnimeDetail>, ApiError> {
        self.get(Endpoint::AnimeDetail(anime_id)).await
    }

    async fn anime_by_genre(
        &self,
        genre_id: &str,
        page: u32,
    ) -> Result<ApiResponse<AnimeListData>, ApiError> {
        self.get(Endpoint::GenreAnime { genre_id, page }).await
    }

    async fn completed(&self, page: u32) -> Result<ApiResponse<AnimeListData>, ApiError> {
        self.get(Endpoint::Completed { page }).await
    }

    async fn ongoing(&self, page: u32) -> Result<ApiResponse<AnimeListData>, ApiError> {
        self.get(Endpoint::Ongoing { page }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OtakudesuClient::from_config(&shared::Config::default().api);
        assert!(client.is_ok());
    }

    #[test]
    fn test_endpoint_urls() -> Result<(), ApiError> {
        let client = OtakudesuClient::new("https://example.test/otakudesu/", "test", None)?;

        assert_eq!(client.url(Endpoint::Home), "https://example.test/otakudesu/home");
        assert_eq!(
            client.url(Endpoint::Completed { page: 3 }),
            "https://example.test/otakudesu/completed?page=3"
        );
        assert_eq!(
            client.url(Endpoint::GenreAnime { genre_id: "action", page: 2 }),
            "https://example.test/otakudesu/genres/action?page=2"
        );

        Ok(())
    }

    #[test]
    fn test_search_keyword_is_encoded() {
        assert_eq!(
            Endpoint::Search("one piece & co").path(),
            "/search?q=one%20piece%20%26%20co"
        );
        assert_eq!(Endpoint::AnimeDetail("a/b").path(), "/anime/a%2Fb");
    }
}
