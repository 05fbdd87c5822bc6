//! Error types for reference assembly.

use thiserror::Error;

/// Result type for reference assembly operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run. Extraction misses are not errors, they are `None`.
#[derive(Error, Debug)]
pub enum Error {
    /// Fetching the upstream document failed (transport or non-success status)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A moving selector (`latest`/`pbe`) was not resolved to a concrete patch
    #[error("Patch selector `{0}` was not resolved to a concrete patch")]
    UnresolvedPatch(String),

    /// The upstream document or the assembled records broke an invariant
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An override entry named a key that no base record has (strict mode only)
    #[error("Override for `{key}` in {table} matches no record")]
    OverrideMismatch { table: String, key: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}

/// Invariant violations. Variants carrying lists name every offending record.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("override set mutator {0} not found")]
    MutatorNotFound(String),

    #[error("no standard set found among mutators: {}", .0.join(", "))]
    NoStandardSet(Vec<String>),

    #[error("duplicate trait api names: {}", .0.join(", "))]
    DuplicateTraits(Vec<String>),

    #[error("champions reference unknown traits: {}", format_pairs(.0))]
    UnknownChampionTraits(Vec<(String, String)>),

    #[error("some augments have no rarity: {}", format_pairs(.0))]
    UnresolvedRarity(Vec<(String, String)>),

    #[error("item composition cycle through {}", .0.join(" -> "))]
    CompositionCycle(Vec<String>),

    #[error("override for `{key}` sets unknown field `{field}`")]
    UnknownOverrideField { key: String, field: String },
}

fn format_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(a, b)| format!("{} ({})", a, b))
        .collect::<Vec<_>>()
        .join(", ")
}
