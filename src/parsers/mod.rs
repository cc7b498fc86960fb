//! Per-app conversation parsers.
//!
//! The five target apps share one traversal skeleton (`engine`) parameterized
//! by a per-app heuristic table (`profile`). A parser is therefore data plus
//! the shared engine, not a class hierarchy; adding an app means adding a
//! profile entry.

pub mod engine;
pub mod profile;

use crate::types::Platform;
use std::collections::HashMap;
use thiserror::Error;

pub use engine::AppParser;
pub use profile::{AppProfile, DirectionStrategy};

/// Why a parse produced no conversation.
///
/// Heuristic scraping fails often and must fail cheaply; these variants exist
/// so tests can tell "correctly found nothing" from "tree died under us".
/// The dispatcher treats all of them identically: wait for the next event.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The screen held no extractable messages.
    #[error("no conversation found on screen")]
    NoMatch,

    /// The screen is not a direct-message thread (feed, story, discovery).
    #[error("not a conversation screen")]
    WrongScreen,

    /// The tree was invalidated by a re-render before parsing could start.
    #[error("stale tree")]
    StaleTree,
}

/// One stateless parser instance per target package, reused across events.
pub struct ParserRegistry {
    parsers: HashMap<&'static str, AppParser>,
}

impl ParserRegistry {
    /// Registry with all five supported apps.
    pub fn new() -> Self {
        let mut parsers = HashMap::new();
        for platform in Platform::all() {
            parsers.insert(
                platform.package(),
                AppParser::new(profile::profile_for(*platform)),
            );
        }
        Self { parsers }
    }

    pub fn get(&self, package: &str) -> Option<&AppParser> {
        self.parsers.get(package)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_all_platforms() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.len(), 5);
        for platform in Platform::all() {
            assert!(registry.get(platform.package()).is_some());
        }
    }

    #[test]
    fn test_registry_rejects_unknown_package() {
        let registry = ParserRegistry::new();
        assert!(registry.get("com.android.chrome").is_none());
    }
}
