//! Home feed: featured banner, latest releases, weekly schedule and genres.

use crate::api::{Genre, GenreListData, HomeData, ScheduleData, ScheduleDay};
use crate::error::{LoadError, Messages};
use crate::source::CatalogApi;
use crate::view::{Fetched, ViewCell, ViewState};
use chrono::{Datelike, Local, Weekday};
use shared::AnimeSummary;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Number of ongoing titles featured in the banner
pub const BANNER_SIZE: usize = 5;

/// Schedule day names as the API reports them, Sunday first
pub const SCHEDULE_DAYS: [&str; 7] = [
    "Minggu", "Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu",
];

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

pub fn day_name(weekday: Weekday) -> &'static str {
    SCHEDULE_DAYS[weekday.num_days_from_sunday() as usize]
}

/// Accepts the Indonesian day names as well as English ones ("mon", "Monday")
pub fn parse_day(name: &str) -> Option<Weekday> {
    let name = name.trim();
    SCHEDULE_DAYS
        .iter()
        .position(|day| day.eq_ignore_ascii_case(name))
        .map(|index| WEEKDAYS[index])
        .or_else(|| Weekday::from_str(name).ok())
}

/// Everything the home screen shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeSections {
    pub banner: Vec<AnimeSummary>,
    pub ongoing: Vec<AnimeSummary>,
    pub completed: Vec<AnimeSummary>,
    pub schedule: Vec<ScheduleDay>,
    pub genres: Vec<Genre>,
}

impl HomeSections {
    pub fn from_parts(home: HomeData, schedule: ScheduleData, genres: GenreListData) -> Self {
        let ongoing: Vec<AnimeSummary> = home
            .ongoing
            .anime_list
            .into_iter()
            .map(AnimeSummary::from)
            .collect();

        Self {
            banner: ongoing.iter().take(BANNER_SIZE).cloned().collect(),
            ongoing,
            completed: home
                .completed
                .anime_list
                .into_iter()
                .map(AnimeSummary::from)
                .collect(),
            schedule: schedule.days,
            genres: genres.genre_list,
        }
    }

    pub fn schedule_for(&self, weekday: Weekday) -> Option<&ScheduleDay> {
        let name = day_name(weekday);
        self.schedule.iter().find(|day| day.day.eq_ignore_ascii_case(name))
    }

    /// Schedule for the local current day
    pub fn schedule_today(&self) -> Option<&ScheduleDay> {
        self.schedule_for(Local::now().weekday())
    }
}

/// Latest inline search on the home screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeSearch {
    pub keyword: String,
    pub results: Vec<AnimeSummary>,
}

pub struct HomeFeed<A> {
    api: Arc<A>,
    view: ViewCell<HomeSections>,
    search: Mutex<HomeSearch>,
}

impl<A: CatalogApi> HomeFeed<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            view: ViewCell::new(CancellationToken::new()),
            search: Mutex::new(HomeSearch::default()),
        }
    }

    /// Tie the feed to a parent token; cancelling the parent cancels the feed
    pub fn with_parent(mut self, parent: &CancellationToken) -> Self {
        self.view.set_cancellation(parent.child_token());
        self
    }

    /// Fetch home, schedule and genres concurrently. All three must succeed.
    pub async fn load(&self) -> Result<Fetched<HomeSections>, LoadError> {
        let api = &self.api;
        let outcome = self
            .view
            .run("home", async move {
                let (home, schedule, genres) =
                    tokio::try_join!(api.home(), api.schedule(), api.genres()).map_err(|e| {
                        warn!(error = %e, "Home feed request failed");
                        LoadError::failed(Messages::HOME, e)
                    })?;

                if !(home.ok && schedule.ok && genres.ok) {
                    warn!(
                        home = home.ok,
                        schedule = schedule.ok,
                        genres = genres.ok,
                        "Home feed rejected"
                    );
                    return Err(LoadError::rejected(Messages::HOME));
                }

                Ok(HomeSections::from_parts(
                    home.data.unwrap_or_default(),
                    schedule.data.unwrap_or_default(),
                    genres.data.unwrap_or_default(),
                ))
            })
            .await?;

        if let Fetched::Ready(sections) = &outcome {
            info!(
                ongoing = sections.ongoing.len(),
                completed = sections.completed.len(),
                schedule_days = sections.schedule.len(),
                genres = sections.genres.len(),
                "Home feed loaded"
            );
        }

        Ok(outcome)
    }

    /// Inline search. A blank keyword clears the results without a request;
    /// failures are logged and yield no results.
    pub async fn search(&self, keyword: &str) -> Vec<AnimeSummary> {
        let keyword = keyword.trim();
        if keyword.is_empty() || self.view.is_cancelled() {
            self.set_search(HomeSearch::default());
            return Vec::new();
        }

        let results = match self.api.search(keyword).await {
            Ok(response) if response.ok => response
                .data
                .map(|data| data.anime_list.into_iter().map(AnimeSummary::from).collect())
                .unwrap_or_default(),
            Ok(_) => {
                debug!(keyword = keyword, "Search rejected");
                Vec::new()
            }
            Err(e) => {
                warn!(keyword = keyword, error = %e, "Search failed");
                Vec::new()
            }
        };

        if !self.view.is_cancelled() {
            self.set_search(HomeSearch {
                keyword: keyword.to_string(),
                results: results.clone(),
            });
        }
        results
    }

    pub fn snapshot(&self) -> ViewState<HomeSections> {
        self.view.snapshot()
    }

    pub fn search_state(&self) -> HomeSearch {
        self.search
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cancel(&self) {
        self.view.cancel();
    }

    fn set_search(&self, search: HomeSearch) {
        *self.search.lock().unwrap_or_else(PoisonError::into_inner) = search;
    }
}
