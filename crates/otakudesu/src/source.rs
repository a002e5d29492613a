//! Trait seams between the loaders and the network.
//!
//! [`OtakudesuClient`](crate::api::OtakudesuClient) implements [`CatalogApi`];
//! tests substitute scripted fakes.

use crate::api::{
    AnimeDetail, AnimeListData, ApiError, ApiResponse, GenreListData, HomeData, ScheduleData,
};
use std::future::Future;

/// Every endpoint of the content API
pub trait CatalogApi: Send + Sync {
    fn home(&self) -> impl Future<Output = Result<ApiResponse<HomeData>, ApiError>> + Send;

    fn schedule(&self) -> impl Future<Output = Result<ApiResponse<ScheduleData>, ApiError>> + Send;

    fn genres(&self) -> impl Future<Output = Result<ApiResponse<GenreListData>, ApiError>> + Send;

    fn search(
        &self,
        keyword: &str,
    ) -> impl Future<Output = Result<ApiResponse<AnimeListData>, ApiError>> + Send;

    fn anime_detail(
        &self,
        anime_id: &str,
    ) -> impl Future<Output = Result<ApiResponse<AnimeDetail>, ApiError>> + Send;

    fn anime_by_genre(
        &self,
        genre_id: &str,
        page: u32,
    ) -> impl Future<Output = Result<ApiResponse<AnimeListData>, ApiError>> + Send;

    fn completed(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<ApiResponse<AnimeListData>, ApiError>> + Send;

    fn ongoing(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<ApiResponse<AnimeListData>, ApiError>> + Send;
}

/// One paged list endpoint, bound to its parameters
pub trait PageSource: Send + Sync {
    fn fetch_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<ApiResponse<AnimeListData>, ApiError>> + Send;
}
