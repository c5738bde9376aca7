use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::PromptLength;
use crate::typing_policy::InputMode;

/// Everything that can stop a game from starting. None of these are fatal:
/// the front end reports them and goes back to mode selection.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read question catalog: {path}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse question catalog: {0}")]
    CatalogParse(#[from] serde_json::Error),

    #[error("theme not found: {theme_id}")]
    UnknownTheme { theme_id: String },

    #[error("theme {theme_id} has no {length} prompts for {language}")]
    NoPrompts {
        theme_id: String,
        language: InputMode,
        length: PromptLength,
    },

    #[error("cannot start a session without prompts")]
    EmptyPromptQueue,
}

impl Error {
    /// Whether retrying the catalog load could help.
    pub fn is_catalog_unavailable(&self) -> bool {
        matches!(self, Error::CatalogRead { .. } | Error::CatalogParse(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
