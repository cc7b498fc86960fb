//! Core types shared by the parsers, store, and dispatcher.
//!
//! This module defines the normalized conversation model that flows out of
//! the per-app parsers and into the `ConversationStore`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Target applications the scraper knows how to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Whatsapp,
    Tinder,
    Bumble,
    Hinge,
    Instagram,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Whatsapp => "whatsapp",
            Platform::Tinder => "tinder",
            Platform::Bumble => "bumble",
            Platform::Hinge => "hinge",
            Platform::Instagram => "instagram",
        }
    }

    /// Map an application package identifier to a platform.
    ///
    /// Returns `None` for anything outside the allow-list; the dispatcher
    /// treats that as "ignore the event".
    pub fn from_package(package: &str) -> Option<Self> {
        match package {
            "com.whatsapp" => Some(Platform::Whatsapp),
            "com.tinder" => Some(Platform::Tinder),
            "com.bumble.app" => Some(Platform::Bumble),
            "co.hinge.app" => Some(Platform::Hinge),
            "com.instagram.android" => Some(Platform::Instagram),
            _ => None,
        }
    }

    /// The package identifier this platform is registered under.
    pub fn package(&self) -> &'static str {
        match self {
            Platform::Whatsapp => "com.whatsapp",
            Platform::Tinder => "com.tinder",
            Platform::Bumble => "com.bumble.app",
            Platform::Hinge => "co.hinge.app",
            Platform::Instagram => "com.instagram.android",
        }
    }

    pub fn all() -> &'static [Platform] {
        &[
            Platform::Whatsapp,
            Platform::Tinder,
            Platform::Bumble,
            Platform::Hinge,
            Platform::Instagram,
        ]
    }
}

impl std::str::FromStr for Platform {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "whatsapp" => Ok(Platform::Whatsapp),
            "tinder" => Ok(Platform::Tinder),
            "bumble" => Ok(Platform::Bumble),
            "hinge" => Ok(Platform::Hinge),
            "instagram" => Ok(Platform::Instagram),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of UI-change event delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiEventType {
    /// Content inside the active window changed (scroll, new message, keystroke).
    WindowContentChanged,
    /// A different window or screen came to the foreground.
    WindowStateChanged,
}

/// A single message reconstructed from the UI tree.
///
/// `is_from_user` is inferred (resource-id markers or screen position), not
/// asserted by the host app. `timestamp` is an opaque parser-supplied string
/// when the bubble carried one, not a normalized clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMessage {
    pub text: String,
    pub is_from_user: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<String>,
}

impl ParsedMessage {
    pub fn new(text: impl Into<String>, is_from_user: bool) -> Self {
        Self {
            text: text.into(),
            is_from_user,
            timestamp: None,
        }
    }
}

/// A conversation as reconstructed from one screen of a target app.
///
/// Messages are ordered oldest-first, as discovered in the tree. A parser
/// never produces one of these with zero messages; the store never holds one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedConversation {
    pub contact_name: String,
    pub platform: Platform,
    pub messages: Vec<ParsedMessage>,
    /// Capture instant, epoch milliseconds.
    pub timestamp_ms: i64,
}

impl ParsedConversation {
    /// Build a conversation stamped with the current time.
    pub fn new(
        contact_name: impl Into<String>,
        platform: Platform,
        messages: Vec<ParsedMessage>,
    ) -> Self {
        Self {
            contact_name: contact_name.into(),
            platform,
            messages,
            timestamp_ms: Utc::now().timestamp_millis(),
        }
    }

    /// Cache key: `lowercase(platform) + "_" + lowercase(contact_name)`.
    pub fn store_key(&self) -> String {
        conversation_key(self.platform, &self.contact_name)
    }
}

/// Compute the store key for a `(platform, contact)` pair.
pub fn conversation_key(platform: Platform, contact_name: &str) -> String {
    format!("{}_{}", platform.as_str(), contact_name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_as_str() {
        assert_eq!(Platform::Whatsapp.as_str(), "whatsapp");
        assert_eq!(Platform::Instagram.as_str(), "instagram");
    }

    #[test]
    fn test_platform_from_package() {
        assert_eq!(Platform::from_package("com.whatsapp"), Some(Platform::Whatsapp));
        assert_eq!(Platform::from_package("co.hinge.app"), Some(Platform::Hinge));
        assert_eq!(Platform::from_package("com.android.settings"), None);
    }

    #[test]
    fn test_platform_package_round_trip() {
        for p in Platform::all() {
            assert_eq!(Platform::from_package(p.package()), Some(*p));
        }
    }

    #[test]
    fn test_platform_serde_lowercase() {
        let json = serde_json::to_string(&Platform::Bumble).unwrap();
        assert_eq!(json, "\"bumble\"");
        let back: Platform = serde_json::from_str("\"hinge\"").unwrap();
        assert_eq!(back, Platform::Hinge);
    }

    #[test]
    fn test_store_key_lowercases_contact() {
        let conv = ParsedConversation::new(
            "Maria Silva",
            Platform::Whatsapp,
            vec![ParsedMessage::new("oi", false)],
        );
        assert_eq!(conv.store_key(), "whatsapp_maria silva");
    }

    #[test]
    fn test_new_conversation_stamps_time() {
        let before = Utc::now().timestamp_millis();
        let conv = ParsedConversation::new("A", Platform::Tinder, vec![]);
        assert!(conv.timestamp_ms >= before);
    }

    #[test]
    fn test_message_timestamp_optional_in_json() {
        let msg = ParsedMessage::new("hey", true);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("timestamp"));
        let back: ParsedMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
