//! Per-app heuristic tables.
//!
//! Each profile captures what varies between the five target apps: which
//! stable resource ids exist, where the contact name lives, how message
//! direction is resolved, and which UI chrome strings must never be mistaken
//! for conversation content. The system-text lists are hand-maintained per
//! app and drift as the apps update their copy.

use crate::types::Platform;

/// How `is_from_user` is resolved for a message node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionStrategy {
    /// Walk up to `max_hops` ancestors looking for an in/out resource-id
    /// marker; fall back to screen alignment when none is found.
    OutgoingMarkers { max_hops: usize },
    /// Screen-position guess only: right half of the screen means outgoing.
    Alignment,
}

/// Heuristic parameters for one target application.
#[derive(Debug, Clone)]
pub struct AppProfile {
    pub platform: Platform,

    /// DM-screen gate: if non-empty, at least one of these ids must be
    /// present or the screen is rejected outright. Empty means parse
    /// unconditionally.
    pub dm_gate_ids: &'static [&'static str],

    /// Stable ids that carry the contact name, tried first.
    pub contact_name_ids: &'static [&'static str],

    /// Depth bound for the toolbar/actionbar structural fallback.
    pub toolbar_max_depth: usize,

    /// Fraction of screen height considered "the header" for the positional
    /// name fallback.
    pub header_fraction: f32,

    /// Stable ids of the message list container, tried before the generic
    /// scrollable search.
    pub message_list_ids: &'static [&'static str],

    /// Declarative-UI apps expose message content through accessibility
    /// labels rather than text.
    pub use_labels: bool,

    pub direction: DirectionStrategy,

    /// WhatsApp embeds a trailing `HH:MM` timestamp in the aggregated bubble
    /// text; strip it before accepting the content.
    pub strip_trailing_time: bool,

    /// Instagram-only: candidate nodes must look like message views (text
    /// class, not editable, id not suggesting chrome).
    pub message_like_filter: bool,

    /// Exact-match UI chrome strings (compared lowercase).
    pub system_phrases: &'static [&'static str],

    /// Prefix-match UI chrome strings (compared lowercase).
    pub system_prefixes: &'static [&'static str],
}

pub fn profile_for(platform: Platform) -> AppProfile {
    match platform {
        Platform::Whatsapp => whatsapp(),
        Platform::Tinder => tinder(),
        Platform::Bumble => bumble(),
        Platform::Hinge => hinge(),
        Platform::Instagram => instagram(),
    }
}

fn whatsapp() -> AppProfile {
    AppProfile {
        platform: Platform::Whatsapp,
        dm_gate_ids: &[],
        contact_name_ids: &["com.whatsapp:id/conversation_contact_name"],
        toolbar_max_depth: 6,
        header_fraction: 0.12,
        message_list_ids: &["com.whatsapp:id/message_list"],
        use_labels: false,
        direction: DirectionStrategy::OutgoingMarkers { max_hops: 8 },
        strip_trailing_time: true,
        message_like_filter: false,
        system_phrases: &[
            "online",
            "typing...",
            "typing…",
            "recording audio...",
            "delivered",
            "read",
            "today",
            "yesterday",
            "type a message",
            "message",
            "messages and calls are end-to-end encrypted.",
        ],
        system_prefixes: &["last seen", "messages and calls are end-to-end encrypted"],
    }
}

fn tinder() -> AppProfile {
    AppProfile {
        platform: Platform::Tinder,
        dm_gate_ids: &[],
        contact_name_ids: &[],
        toolbar_max_depth: 8,
        header_fraction: 0.12,
        message_list_ids: &[],
        use_labels: true,
        direction: DirectionStrategy::Alignment,
        strip_trailing_time: false,
        message_like_filter: false,
        system_phrases: &[
            "it's a match!",
            "you matched",
            "type a message",
            "send",
            "gif",
            "sent",
            "today",
            "yesterday",
        ],
        system_prefixes: &["you matched with", "your match"],
    }
}

fn bumble() -> AppProfile {
    AppProfile {
        platform: Platform::Bumble,
        dm_gate_ids: &[],
        contact_name_ids: &[],
        toolbar_max_depth: 8,
        header_fraction: 0.15,
        message_list_ids: &[],
        use_labels: true,
        direction: DirectionStrategy::Alignment,
        strip_trailing_time: false,
        message_like_filter: false,
        system_phrases: &[
            "online",
            "typing...",
            "typing…",
            "delivered",
            "seen",
            "write a message...",
            "write a message…",
            "make your move",
            "today",
            "yesterday",
        ],
        system_prefixes: &["you matched", "your move", "time to chat"],
    }
}

fn hinge() -> AppProfile {
    AppProfile {
        platform: Platform::Hinge,
        dm_gate_ids: &[],
        contact_name_ids: &[],
        toolbar_max_depth: 8,
        header_fraction: 0.12,
        message_list_ids: &[],
        use_labels: true,
        direction: DirectionStrategy::Alignment,
        strip_trailing_time: false,
        message_like_filter: false,
        system_phrases: &[
            "matched",
            "send a message",
            "sent",
            "seen",
            "today",
            "yesterday",
        ],
        system_prefixes: &["liked your", "you matched", "matched with"],
    }
}

fn instagram() -> AppProfile {
    AppProfile {
        platform: Platform::Instagram,
        dm_gate_ids: &[
            "com.instagram.android:id/thread_title",
            "com.instagram.android:id/message_list",
            "com.instagram.android:id/row_thread_composer_edittext",
            "com.instagram.android:id/thread_toolbar",
        ],
        contact_name_ids: &["com.instagram.android:id/thread_title"],
        toolbar_max_depth: 6,
        header_fraction: 0.12,
        message_list_ids: &["com.instagram.android:id/message_list"],
        use_labels: false,
        direction: DirectionStrategy::Alignment,
        strip_trailing_time: false,
        message_like_filter: true,
        system_phrases: &[
            "active now",
            "seen",
            "typing...",
            "typing…",
            "message...",
            "message…",
            "sent",
            "today",
            "yesterday",
        ],
        system_prefixes: &["active ", "liked your", "reacted to", "replied to"],
    }
}
