//! Scripted stand-in for the content API.

use crate::api::{
    parse_response, AnimeDetail, AnimeListData, ApiError, ApiResponse, Endpoint, GenreListData,
    HomeData, ScheduleData,
};
use crate::source::CatalogApi;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

enum Reply {
    Body(String),
    Fail,
}

/// Answers each endpoint path from a queue of scripted replies and records
/// every request. A gated fake holds each request until a permit is added.
#[derive(Default)]
pub(crate) struct FakeApi {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub(crate) fn reply(mut self, endpoint: Endpoint<'_>, body: Value) -> Self {
        self.push(endpoint, Reply::Body(body.to_string()));
        self
    }

    pub(crate) fn fail(mut self, endpoint: Endpoint<'_>) -> Self {
        self.push(endpoint, Reply::Fail);
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&mut self, endpoint: Endpoint<'_>, reply: Reply) {
        self.replies
            .get_mut()
            .unwrap()
            .entry(endpoint.path())
            .or_default()
            .push_back(reply);
    }

    async fn respond<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint<'_>,
    ) -> Result<ApiResponse<T>, ApiError> {
        let path = endpoint.path();
        self.requests.lock().unwrap().push(path.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&path)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(Reply::Body(body)) => Ok(parse_response(&body)?),
            Some(Reply::Fail) => Err(ApiError::Status {
                status: 503,
                message: "service unavailable".to_string(),
            }),
            None => Err(ApiError::Parse(format!("no scripted reply for {}", path))),
        }
    }
}

impl CatalogApi for FakeApi {
    async fn home(&self) -> Result<ApiResponse<HomeData>, ApiError> {
        self.respond(Endpoint::Home).await
    }

    async fn schedule(&self) -> Result<ApiResponse<ScheduleData>, ApiError> {
        self.respond(Endpoint::Schedule).await
    }

    async fn genres(&self) -> Result<ApiResponse<GenreListData>, ApiError> {
        self.respond(Endpoint::Genres).await
    }

    async fn search(&self, keyword: &str) -> Result<ApiResponse<AnimeListData>, ApiError> {
        self.respond(Endpoint::Search(keyword)).await
    }

    async fn anime_detail(&self, anime_id: &str) -> Result<ApiResponse<AnimeDetail>, ApiError> {
        self.respond(Endpoint::AnimeDetail(anime_id)).await
    }

    async fn anime_by_genre(
        &self,
        genre_id: &str,
        page: u32,
    ) -> Result<ApiResponse<AnimeListData>, ApiError> {
        self.respond(Endpoint::GenreAnime { genre_id, page }).await
    }

    async fn completed(&self, page: u32) -> Result<ApiResponse<AnimeListData>, ApiError> {
        self.respond(Endpoint::Completed { page }).await
    }

    async fn ongoing(&self, page: u32) -> Result<ApiResponse<AnimeListData>, ApiError> {
        self.respond(Endpoint::Ongoing { page }).await
    }
}
