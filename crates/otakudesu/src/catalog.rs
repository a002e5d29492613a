//! Paged list resources and their per-resource normalization.

use crate::api::{AnimeListData, AnimeRecord, ApiError, ApiResponse, Pagination};
use crate::source::{CatalogApi, PageSource};
use once_cell::sync::Lazy;
use regex::Regex;
use shared::{AnimeSummary, PageCursor};
use std::sync::Arc;

static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());

/// Remove every `(...)` segment from a title and trim what is left
pub fn strip_parentheticals(title: &str) -> String {
    PARENTHETICAL.replace_all(title, "").trim().to_string()
}

/// Which paged endpoint a list reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListResource {
    /// All (completed) anime
    Completed,
    /// Currently airing anime
    Ongoing,
    /// Anime of one genre
    Genre { genre_id: String },
}

impl ListResource {
    pub fn genre(genre_id: impl Into<String>) -> Self {
        ListResource::Genre {
            genre_id: genre_id.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ListResource::Completed => "completed",
            ListResource::Ongoing => "ongoing",
            ListResource::Genre { .. } => "genre",
        }
    }

    /// Turn a raw record into a summary
    pub fn normalize(&self, record: AnimeRecord) -> AnimeSummary {
        let mut summary = AnimeSummary::from(record);
        if let ListResource::Completed = self {
            summary.title = strip_parentheticals(&summary.title);
        }
        summary
    }

    /// Cursor after a successful fetch of `requested`.
    ///
    /// The completed list reports pagination at the top level and trusts its
    /// `currentPage`; the ongoing and genre lists carry it inside `data` and
    /// keep the requested page number.
    pub fn cursor_after(
        &self,
        requested: u32,
        top_level: Option<&Pagination>,
        in_data: Option<&Pagination>,
    ) -> PageCursor {
        let (pagination, trust_current_page) = match self {
            ListResource::Completed => (top_level, true),
            ListResource::Ongoing | ListResource::Genre { .. } => (in_data.or(top_level), false),
        };

        let current_page = if trust_current_page {
            pagination
                .and_then(|p| p.current_page)
                .filter(|page| *page >= 1)
                .unwrap_or(requested)
        } else {
            requested
        };

        PageCursor {
            current_page,
            has_next_page: pagination.and_then(|p| p.has_next_page).unwrap_or(false),
        }
    }
}

impl std::fmt::Display for ListResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListResource::Genre { genre_id } => write!(f, "genre:{}", genre_id),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A [`ListResource`] served by a [`CatalogApi`]
pub struct CatalogSource<A> {
    api: Arc<A>,
    resource: ListResource,
}

impl<A: CatalogApi> CatalogSource<A> {
    pub fn new(api: Arc<A>, resource: ListResource) -> Self {
        Self { api, resource }
    }

    pub fn resource(&self) -> &ListResource {
        &self.resource
    }
}

impl<A: CatalogApi> PageSource for CatalogSource<A> {
    async fn fetch_page(&self, page: u32) -> Result<ApiResponse<AnimeListData>, ApiError> {
        match &self.resource {
            ListResource::Completed => self.api.completed(page).await,
            ListResource::Ongoing => self.api.ongoing(page).await,
            ListResource::Genre { genre_id } => self.api.anime_by_genre(genre_id, page).await,
        }
    }
}
