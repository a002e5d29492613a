//! Load errors and the user-facing messages attached to them.

use crate::api::ApiError;
use thiserror::Error;

/// User-facing messages for one kind of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    /// Shown when the API answers `ok: false`
    pub rejected: &'static str,
    /// Shown when the request itself fails
    pub failed: &'static str,
}

impl Messages {
    pub const LIST: Messages = Messages {
        rejected: "Gagal memuat daftar anime",
        failed: "Terjadi kesalahan",
    };

    pub const SEARCH: Messages = Messages {
        rejected: "Gagal mencari anime",
        failed: "Terjadi kesalahan",
    };

    pub const DETAIL: Messages = Messages {
        rejected: "Gagal memuat detail anime",
        failed: "Terjadi kesalahan",
    };

    pub const HOME: Messages = Messages {
        rejected: "Terjadi kesalahan",
        failed: "Gagal memuat data",
    };
}

/// Why a load did not produce data
#[derive(Debug, Error)]
pub enum LoadError {
    /// The API answered with `ok: false`
    #[error("{message}")]
    Rejected { message: &'static str },

    /// Transport or decoding failure
    #[error("{message}: {source}")]
    Failed {
        message: &'static str,
        #[source]
        source: ApiError,
    },
}

impl LoadError {
    pub fn rejected(messages: Messages) -> Self {
        LoadError::Rejected {
            message: messages.rejected,
        }
    }

    pub fn failed(messages: Messages, source: ApiError) -> Self {
        LoadError::Failed {
            message: messages.failed,
            source,
        }
    }

    /// Localized message to show next to the retry button
    pub fn user_message(&self) -> &'static str {
        match self {
            LoadError::Rejected { message } | LoadError::Failed { message, .. } => *message,
        }
    }
}
