//! otakudesu API response types.
//!
//! Every endpoint answers with the same envelope: `{ ok, data, pagination? }`.
//! The envelope is parsed first with an untyped payload so that a rejected
//! request (`ok: false`) never fails on a payload shape it does not carry.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use shared::AnimeSummary;

/// Response envelope shared by all endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub ok: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl ApiResponse<Value> {
    /// Convert the untyped payload into `T`. Rejected responses drop their
    /// payload instead of decoding it.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ApiResponse<T>, serde_json::Error> {
        let data = match (self.ok, self.data) {
            (true, Some(value)) if !value.is_null() => Some(serde_json::from_value(value)?),
            _ => None,
        };

        Ok(ApiResponse {
            ok: self.ok,
            data,
            pagination: self.pagination,
        })
    }
}

/// Parse a response body into a typed envelope
pub fn parse_response<T: DeserializeOwned>(body: &str) -> Result<ApiResponse<T>, serde_json::Error> {
    serde_json::from_str::<ApiResponse<Value>>(body)?.decode()
}

/// Pagination metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub has_prev_page: Option<bool>,
    #[serde(default)]
    pub prev_page: Option<u32>,
    #[serde(default)]
    pub has_next_page: Option<bool>,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// Raw anime record as found in every `animeList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeRecord {
    pub anime_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub episodes: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub score: Option<String>,
    #[serde(default)]
    pub release_day: Option<String>,
    #[serde(default)]
    pub latest_release_date: Option<String>,
    #[serde(default)]
    pub last_release_date: Option<String>,
}

impl From<AnimeRecord> for AnimeSummary {
    fn from(record: AnimeRecord) -> Self {
        AnimeSummary {
            anime_id: record.anime_id,
            title: record.title,
            poster: record.poster,
            episodes: record.episodes,
            score: record.score,
            release_day: record.release_day,
            latest_release_date: record.latest_release_date.or(record.last_release_date),
        }
    }
}

/// Payload of the paged list endpoints and `/search`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeListData {
    #[serde(default)]
    pub anime_list: Vec<AnimeRecord>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Payload of `/home`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomeData {
    #[serde(default)]
    pub ongoing: AnimeSection,
    #[serde(default)]
    pub completed: AnimeSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeSection {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub anime_list: Vec<AnimeRecord>,
}

/// Payload of `/schedule`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleData {
    #[serde(default)]
    pub days: Vec<ScheduleDay>,
}

/// Releases airing on one weekday
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDay {
    pub day: String,
    #[serde(default)]
    pub anime_list: Vec<AnimeRecord>,
}

/// Payload of `/genres`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreListData {
    #[serde(default)]
    pub genre_list: Vec<Genre>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub genre_id: String,
    #[serde(default)]
    pub title: String,
}

/// Payload of `/anime/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeDetail {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub japanese: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub score: Option<String>,
    #[serde(default)]
    pub producers: Option<String>,
    #[serde(default, rename = "type")]
    pub anime_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub episodes: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub aired: Option<String>,
    #[serde(default)]
    pub studios: Option<String>,
    #[serde(default)]
    pub synopsis: Option<Synopsis>,
    #[serde(default)]
    pub genre_list: Vec<Genre>,
    #[serde(default)]
    pub episode_list: Vec<EpisodeRef>,
}

impl AnimeDetail {
    /// Summary of this anime as stored in favorites
    pub fn summary(&self, anime_id: &str) -> AnimeSummary {
        AnimeSummary {
            anime_id: anime_id.to_string(),
            title: self.title.clone(),
            poster: self.poster.clone(),
            episodes: self.episodes.clone(),
            score: self.score.clone(),
            release_day: None,
            latest_release_date: None,
        }
    }

    pub fn synopsis_text(&self) -> String {
        self.synopsis
            .as_ref()
            .map(|s| s.paragraphs.join("\n\n"))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Synopsis {
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRef {
    pub episode_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub title: Option<String>,
}

/// Accept `"12"`, `12`, `12.5` or `null`; blank strings count as absent
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
