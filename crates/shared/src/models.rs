//! Data models for the browser.
//!
//! This module defines the structures that outlive a single API response:
//! list summaries, persisted favorites, and per-list pagination bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One anime as shown in any list view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeSummary {
    pub anime_id: String,
    pub title: String,
    pub poster: Option<String>,
    pub episodes: Option<String>,
    pub score: Option<String>,

    // Only present on ongoing listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_release_date: Option<String>,
}

impl AnimeSummary {
    /// Create a summary with only an id and a title
    pub fn new(anime_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            anime_id: anime_id.into(),
            title: title.into(),
            poster: None,
            episodes: None,
            score: None,
            release_day: None,
            latest_release_date: None,
        }
    }
}

/// A favorited anime, as persisted under the `favorites` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub anime_id: String,
    pub title: String,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub episodes: Option<String>,
    #[serde(default)]
    pub score: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl FavoriteEntry {
    /// Copy the favoritable fields out of a summary
    pub fn from_summary(anime: &AnimeSummary, added_at: DateTime<Utc>) -> Self {
        Self {
            anime_id: anime.anime_id.clone(),
            title: anime.title.clone(),
            poster: anime.poster.clone(),
            episodes: anime.episodes.clone(),
            score: anime.score.clone(),
            added_at,
        }
    }
}

/// Pagination bookkeeping for one list view.
///
/// `has_next_page` is only authoritative right after a successful fetch;
/// while the next page is loading the cursor still describes the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    pub current_page: u32,
    pub has_next_page: bool,
}

impl PageCursor {
    /// Cursor of a freshly mounted list: page 1, more pages assumed
    pub fn first() -> Self {
        Self {
            current_page: 1,
            has_next_page: true,
        }
    }

    /// Page a load-more trigger would request, if any
    pub fn next_page(&self) -> Option<u32> {
        if self.has_next_page {
            self.current_page.checked_add(1)
        } else {
            None
        }
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::first()
    }
}

impl std::fmt::Display for PageCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_next_page {
            write!(f, "page {} (more available)", self.current_page)
        } else {
            write!(f, "page {} (last)", self.current_page)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cursor_next_page() {
        let cursor = PageCursor::first();
        assert_eq!(cursor.next_page(), Some(2));

        let last = PageCursor {
            current_page: 7,
            has_next_page: false,
        };
        assert_eq!(last.next_page(), None);
    }

    #[test]
    fn test_favorite_wire_format() -> anyhow::Result<()> {
        let added_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut anime = AnimeSummary::new("x", "Bar");
        anime.score = Some("8.1".to_string());

        let entry = FavoriteEntry::from_summary(&anime, added_at);
        let json = serde_json::to_value(&entry)?;

        assert_eq!(json["animeId"], "x");
        assert_eq!(json["score"], "8.1");
        assert_eq!(json["addedAt"], "2024-05-01T12:00:00Z");
        Ok(())
    }

    #[test]
    fn test_favorite_accepts_missing_optional_fields() -> anyhow::Result<()> {
        let entry: FavoriteEntry = serde_json::from_str(
            r#"{"animeId":"a1","title":"Foo","addedAt":"2024-01-01T00:00:00.000Z"}"#,
        )?;
        assert_eq!(entry.anime_id, "a1");
        assert!(entry.poster.is_none());
        Ok(())
    }
}
