//! Resolution configuration table for the barstream series engine.
//!
//! This crate maps every supported resolution identifier to the history
//! depth requested on load, a display name and the instrument symbol.
//!
//! # Example
//!
//! ```
//! use barstream_resolutions::ResolutionRegistry;
//!
//! let registry = ResolutionRegistry::global();
//!
//! if let Ok(spec) = registry.get("500T") {
//!     println!("{}: {} bars of {}", spec.display_name(), spec.history_depth(), spec.symbol());
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/barstream/barstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use barstream_types::{BarstreamError, Resolution};
use serde::{Deserialize, Serialize};

/// The resolution table JSON embedded at compile time.
const RESOLUTIONS_JSON: &str = include_str!("../data/resolutions.json");

/// Global resolution registry instance.
static REGISTRY: OnceLock<ResolutionRegistry> = OnceLock::new();

/// A configured resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSpec {
    resolution: Resolution,
    history_depth: u32,
    display_name: String,
    symbol: String,
}

impl ResolutionSpec {
    /// Creates a new resolution entry.
    #[must_use]
    pub fn new(
        resolution: Resolution,
        history_depth: u32,
        display_name: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            resolution,
            history_depth,
            display_name: display_name.into(),
            symbol: symbol.into(),
        }
    }

    /// Returns the resolution.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Returns how many bars to request on a historical load.
    #[must_use]
    pub const fn history_depth(&self) -> u32 {
        self.history_depth
    }

    /// Returns the human-readable name (e.g., "500 Ticks").
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the instrument symbol subscribed at this resolution.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl std::fmt::Display for ResolutionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.resolution)
    }
}

/// Table entry as stored in `resolutions.json`.
#[derive(Deserialize)]
struct Entry {
    countback: u32,
    display_name: String,
    symbol: String,
}

/// Registry of all configured resolutions.
#[derive(Debug)]
pub struct ResolutionRegistry {
    resolutions: BTreeMap<Resolution, ResolutionSpec>,
}

impl ResolutionRegistry {
    /// Returns the global resolution registry.
    ///
    /// The registry is initialized lazily on first access.
    #[must_use]
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::load)
    }

    /// Loads resolutions from the embedded JSON data.
    fn load() -> Self {
        let entries: HashMap<Resolution, Entry> =
            serde_json::from_str(RESOLUTIONS_JSON).expect("Invalid resolutions.json");
        Self::from_specs(entries.into_iter().map(|(resolution, entry)| {
            ResolutionSpec::new(resolution, entry.countback, entry.display_name, entry.symbol)
        }))
    }

    /// Builds a registry from explicit entries.
    #[must_use]
    pub fn from_specs(specs: impl IntoIterator<Item = ResolutionSpec>) -> Self {
        let resolutions = specs
            .into_iter()
            .map(|spec| (spec.resolution, spec))
            .collect();
        Self { resolutions }
    }

    /// Looks up a resolution by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BarstreamError::UnconfiguredResolution`] if the identifier
    /// does not parse or has no table entry.
    pub fn get(&self, id: &str) -> Result<&ResolutionSpec, BarstreamError> {
        id.parse::<Resolution>()
            .ok()
            .and_then(|resolution| self.resolutions.get(&resolution))
            .ok_or_else(|| BarstreamError::UnconfiguredResolution(id.to_string()))
    }

    /// Looks up an already-parsed resolution.
    #[must_use]
    pub fn lookup(&self, resolution: Resolution) -> Option<&ResolutionSpec> {
        self.resolutions.get(&resolution)
    }

    /// Returns all entries ordered ticks, seconds, minutes, days, weeks, months.
    pub fn all(&self) -> impl Iterator<Item = &ResolutionSpec> {
        self.resolutions.values()
    }

    /// Returns all tick-based entries.
    pub fn ticks(&self) -> impl Iterator<Item = &ResolutionSpec> {
        self.all().filter(|spec| spec.resolution.is_tick())
    }

    /// Returns the total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolutions.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolutions.is_empty()
    }
}
