//! otakudesu browser core.
//!
//! Headless view-models over the otakudesu content API: the home feed,
//! paged anime lists with load-more, search and detail views. Favorites
//! live in the `shared` crate.

pub mod api;
pub mod catalog;
pub mod error;
pub mod home;
pub mod lookup;
pub mod pager;
pub mod source;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, Endpoint, OtakudesuClient};
pub use catalog::{CatalogSource, ListResource};
pub use error::{LoadError, Messages};
pub use home::{HomeFeed, HomeSections};
pub use lookup::{DetailLoader, SearchLoader};
pub use pager::{LoadOutcome, PagedListLoader, ScrollMetrics, SkipReason};
pub use source::{CatalogApi, PageSource};
pub use view::{Fetched, ViewState};
