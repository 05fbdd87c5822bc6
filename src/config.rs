//! Run configuration: which upstream document to read and how rows are labelled.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Which upstream document to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchSelector {
    Latest,
    Pbe,
    /// A concrete patch, e.g. `14.1`.
    Patch(String),
}

impl PatchSelector {
    pub fn as_str(&self) -> &str {
        match self {
            PatchSelector::Latest => "latest",
            PatchSelector::Pbe => "pbe",
            PatchSelector::Patch(p) => p,
        }
    }

    /// Symbolic selectors move over time, so their cached documents go stale.
    pub fn is_moving(&self) -> bool {
        !matches!(self, PatchSelector::Patch(_))
    }
}

impl FromStr for PatchSelector {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "" => Err("patch selector must not be empty".to_string()),
            "latest" => Ok(PatchSelector::Latest),
            "pbe" => Ok(PatchSelector::Pbe),
            _ if is_patch_name(s) => Ok(PatchSelector::Patch(s.to_string())),
            _ => Err(format!("invalid patch selector: {}", s)),
        }
    }
}

/// Concrete patches become a URL segment and a cache directory name, so only
/// `[0-9A-Za-z._-]` is allowed and at least one character must be alphanumeric.
fn is_patch_name(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
        && s.bytes().any(|b| b.is_ascii_alphanumeric())
}

impl fmt::Display for PatchSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer tables refreshed alongside the per-patch partitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishTargets {
    pub latest: bool,
    pub pbe: bool,
}

/// Options for one assembly run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub selector: PatchSelector,
    /// Pick this exact set mutator instead of the highest standard one.
    pub mutator_override: Option<String>,
    /// Concrete patch stamped on every row. Required for `latest`/`pbe`,
    /// which the caller resolves before assembly.
    pub patch_override: Option<String>,
    /// Fail on override entries that match no record instead of skipping them.
    pub strict_overrides: bool,
}

impl RunOptions {
    pub fn new(selector: PatchSelector) -> Self {
        Self {
            selector,
            mutator_override: None,
            patch_override: None,
            strict_overrides: false,
        }
    }

    /// The patch label stamped on every row: the override, else the concrete
    /// selector. A symbolic selector is never a label, since the next upstream
    /// patch would land in the same partition.
    pub fn patch_label(&self) -> Result<String> {
        if let Some(patch) = self.patch_override.as_ref().filter(|p| !p.is_empty()) {
            return Ok(patch.clone());
        }
        match &self.selector {
            PatchSelector::Patch(patch) => Ok(patch.clone()),
            moving => Err(Error::UnresolvedPatch(moving.to_string())),
        }
    }

    /// Only default-set runs against a moving selector refresh pointer tables.
    pub fn publish_targets(&self) -> PublishTargets {
        let default_set = self.mutator_override.is_none();
        PublishTargets {
            latest: default_set && self.selector == PatchSelector::Latest,
            pbe: default_set && self.selector == PatchSelector::Pbe,
        }
    }
}
