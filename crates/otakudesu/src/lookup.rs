//! Search results and anime detail views.

use crate::api::AnimeDetail;
use crate::error::{LoadError, Messages};
use crate::source::CatalogApi;
use crate::view::{Fetched, ViewCell, ViewState};
use shared::AnimeSummary;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Results for one search keyword
pub struct SearchLoader<A> {
    api: Arc<A>,
    keyword: String,
    view: ViewCell<Vec<AnimeSummary>>,
}

impl<A: CatalogApi> SearchLoader<A> {
    pub fn new(api: Arc<A>, keyword: impl Into<String>) -> Self {
        Self {
            api,
            keyword: keyword.into(),
            view: ViewCell::new(CancellationToken::new()),
        }
    }

    pub fn with_parent(mut self, parent: &CancellationToken) -> Self {
        self.view.set_cancellation(parent.child_token());
        self
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Run the search. A response without a list counts as no results.
    pub async fn load(&self) -> Result<Fetched<Vec<AnimeSummary>>, LoadError> {
        let keyword = self.keyword.as_str();
        let api = &self.api;

        self.view
            .run("search", async move {
                let response = api.search(keyword).await.map_err(|e| {
                    warn!(keyword = keyword, error = %e, "Search failed");
                    LoadError::failed(Messages::SEARCH, e)
                })?;

                if !response.ok {
                    warn!(keyword = keyword, "Search rejected");
                    return Err(LoadError::rejected(Messages::SEARCH));
                }

                let results: Vec<AnimeSummary> = response
                    .data
                    .map(|data| data.anime_list.into_iter().map(AnimeSummary::from).collect())
                    .unwrap_or_default();
                info!(keyword = keyword, found = results.len(), "Search complete");
                Ok(results)
            })
            .await
    }

    pub async fn retry(&self) -> Result<Fetched<Vec<AnimeSummary>>, LoadError> {
        self.load().await
    }

    pub fn snapshot(&self) -> ViewState<Vec<AnimeSummary>> {
        self.view.snapshot()
    }

    pub fn cancel(&self) {
        self.view.cancel();
    }
}

/// Detail page of one anime
pub struct DetailLoader<A> {
    api: Arc<A>,
    anime_id: String,
    view: ViewCell<AnimeDetail>,
}

impl<A: CatalogApi> DetailLoader<A> {
    pub fn new(api: Arc<A>, anime_id: impl Into<String>) -> Self {
        Self {
            api,
            anime_id: anime_id.into(),
            view: ViewCell::new(CancellationToken::new()),
        }
    }

    pub fn with_parent(mut self, parent: &CancellationToken) -> Self {
        self.view.set_cancellation(parent.child_token());
        self
    }

    pub fn anime_id(&self) -> &str {
        &self.anime_id
    }

    pub async fn load(&self) -> Result<Fetched<AnimeDetail>, LoadError> {
        let anime_id = self.anime_id.as_str();
        let api = &self.api;

        self.view
            .run("detail", async move {
                let response = api.anime_detail(anime_id).await.map_err(|e| {
                    warn!(anime_id = anime_id, error = %e, "Detail request failed");
                    LoadError::failed(Messages::DETAIL, e)
                })?;

                match response.data {
                    Some(detail) if response.ok => {
                        info!(anime_id = anime_id, title = %detail.title, "Detail loaded");
                        Ok(detail)
                    }
                    _ => {
                        warn!(anime_id = anime_id, "Detail rejected");
                        Err(LoadError::rejected(Messages::DETAIL))
                    }
                }
            })
            .await
    }

    /// Summary of the loaded detail, ready to be added to favorites
    pub fn summary(&self) -> Option<AnimeSummary> {
        self.view
            .snapshot()
            .data
            .map(|detail| detail.summary(&self.anime_id))
    }

    pub fn snapshot(&self) -> ViewState<AnimeDetail> {
        self.view.snapshot()
    }

    pub fn cancel(&self) {
        self.view.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Endpoint;
    use crate::testing::FakeApi;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    #[tokio::test]
    async fn test_search_results() -> anyhow::Result<()> {
        let api = FakeApi::new().reply(
            Endpoint::Search("one piece"),
            json!({"ok": true, "data": {"animeList": [
                {"animeId": "op", "title": "One Piece", "score": 8.7},
                {"animeId": "opf", "title": "One Piece Film"}
            ]}}),
        );
        let loader = SearchLoader::new(Arc::new(api), "one piece");

        let results = loader.load().await?.ready().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].score.as_deref(), Some("8.7"));
        assert_eq!(loader.snapshot().data.map(|r| r.len()), Some(2));

        Ok(())
    }

    #[tokio::test]
    async fn test_search_without_list_is_empty() -> anyhow::Result<()> {
        let api = FakeApi::new().reply(Endpoint::Search("zzz"), json!({"ok": true, "data": {}}));
        let loader = SearchLoader::new(Arc::new(api), "zzz");

        assert_eq!(loader.load().await?.ready(), Some(Vec::new()));
        Ok(())
    }

    #[tokio::test]
    async fn test_search_rejected_then_retry() -> anyhow::Result<()> {
        let api = FakeApi::new()
            .reply(Endpoint::Search("naruto"), json!({"ok": false}))
            .reply(
                Endpoint::Search("naruto"),
                json!({"ok": true, "data": {"animeList": [{"animeId": "n1", "title": "Naruto"}]}}),
            );
        let loader = SearchLoader::new(Arc::new(api), "naruto");

        let err = loader.load().await.unwrap_err();
        assert_eq!(err.user_message(), "Gagal mencari anime");
        assert_eq!(loader.snapshot().error, Some("Gagal mencari anime"));

        let results = loader.retry().await?.ready().unwrap();
        assert_eq!(results[0].anime_id, "n1");
        assert_eq!(loader.snapshot().error, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_detail_and_summary() -> anyhow::Result<()> {
        let api = FakeApi::new().reply(
            Endpoint::AnimeDetail("foo-sub-indo"),
            json!({"ok": true, "data": {
                "title": "Foo", "poster": "https://img/foo.jpg", "score": "8.01", "episodes": 12,
                "synopsis": {"paragraphs": ["A story."]}
            }}),
        );
        let loader = DetailLoader::new(Arc::new(api), "foo-sub-indo");
        assert!(loader.summary().is_none());

        let detail = loader.load().await?.ready().unwrap();
        assert_eq!(detail.title, "Foo");

        let summary = loader.summary().unwrap();
        assert_eq!(summary.anime_id, "foo-sub-indo");
        assert_eq!(summary.poster.as_deref(), Some("https://img/foo.jpg"));
        assert_eq!(summary.episodes.as_deref(), Some("12"));

        Ok(())
    }

    #[tokio::test]
    async fn test_detail_errors() {
        let api = FakeApi::new()
            .reply(Endpoint::AnimeDetail("gone"), json!({"ok": false, "data": null}))
            .fail(Endpoint::AnimeDetail("gone"));
        let loader = DetailLoader::new(Arc::new(api), "gone");

        let rejected = loader.load().await.unwrap_err();
        assert!(matches!(rejected, LoadError::Rejected { .. }));
        assert_eq!(rejected.user_message(), "Gagal memuat detail anime");

        let failed = loader.load().await.unwrap_err();
        assert!(matches!(failed, LoadError::Failed { .. }));
        assert_eq!(loader.snapshot().error, Some("Terjadi kesalahan"));
    }

    #[tokio::test]
    async fn test_second_load_while_running_is_busy() -> anyhow::Result<()> {
        let gate = Arc::new(Semaphore::new(0));
        let api = Arc::new(
            FakeApi::gated(gate.clone())
                .reply(Endpoint::AnimeDetail("foo"), json!({"ok": true, "data": {"title": "Foo"}})),
        );
        let loader = DetailLoader::new(api.clone(), "foo");

        let release = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let second = loader.load().await;
            gate.add_permits(1);
            second
        };
        let (first, second) = tokio::join!(loader.load(), release);

        assert!(matches!(first?, Fetched::Ready(_)));
        assert!(matches!(second?, Fetched::Busy));
        assert_eq!(api.requests().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_discards_late_detail() {
        let gate = Arc::new(Semaphore::new(0));
        let api = Arc::new(
            FakeApi::gated(gate.clone())
                .reply(Endpoint::AnimeDetail("foo"), json!({"ok": true, "data": {"title": "Foo"}})),
        );
        let loader = DetailLoader::new(api, "foo");

        let cancel = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            loader.cancel();
            gate.add_permits(1);
        };
        let (outcome, _) = tokio::join!(loader.load(), cancel);

        assert!(matches!(outcome, Ok(Fetched::Cancelled)));
        let state = loader.snapshot();
        assert!(state.data.is_none());
        assert!(!state.loading);
    }
}
