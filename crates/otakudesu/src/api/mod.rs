//! otakudesu API client implementation.
//!
//! A thin passthrough over `GET {base}/...`: requests are issued as-is and the
//! `{ ok, data, pagination }` envelope is surfaced to the caller untouched.

pub mod client;
pub mod error;
pub mod types;

pub use client::{Endpoint, OtakudesuClient};
pub use error::ApiError;
pub use types::*;
