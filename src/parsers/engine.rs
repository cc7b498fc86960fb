//! Shared parse skeleton for all target apps.
//!
//! One engine walks the tree the same way for every app; the per-app
//! differences (resource ids, system-text lists, direction strategy) come in
//! through the `AppProfile`. The walk never mutates the tree, never panics
//! past `parse`, and skips stale branches instead of aborting.

use crate::node::UiNode;
use crate::parsers::profile::{AppProfile, DirectionStrategy};
use crate::parsers::ParseError;
use crate::tree;
use crate::types::{ParsedConversation, ParsedMessage, UiEventType};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

/// Depth bound for the generic scrollable-container search.
const SCROLLABLE_SEARCH_DEPTH: usize = 10;

/// Depth bound for message collection below the container.
const MESSAGE_SEARCH_DEPTH: usize = 20;

/// A stored conversation keeps at most this many messages.
pub const MAX_MESSAGES: usize = 30;

/// Assumed screen size when the root reports empty bounds.
const FALLBACK_SCREEN_WIDTH: i32 = 1080;
const FALLBACK_SCREEN_HEIGHT: i32 = 2280;

/// Ancestor resource-id fragments marking message direction. Checked
/// outgoing-first per ancestor, nearest ancestor first.
const OUT_MARKERS: &[&str] = &["out", "outgoing", "sent", "_out"];
const IN_MARKERS: &[&str] = &["in", "incoming", "received", "_in"];

/// Class-name fragments identifying a message list container.
const SCROLL_CLASSES: &[&str] = &["recyclerview", "listview", "scrollview", "lazycolumn"];

/// Resource-id fragments that disqualify a node from being message content
/// (Instagram `is_message_like` check).
const CHROME_ID_WORDS: &[&str] = &[
    "button", "label", "tab", "title", "header", "composer", "edittext",
];

const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

lazy_static! {
    /// A string that is nothing but a clock time ("14:32", "2:05 PM").
    static ref TIME_RE: Regex = Regex::new(r"^\d{1,2}:\d{2}(\s?[AaPp][Mm])?$").unwrap();

    /// A string that is nothing but a numeric date ("12/03", "3.1.2024").
    static ref DATE_RE: Regex = Regex::new(r"^\d{1,2}[./-]\d{1,2}([./-]\d{2,4})?$").unwrap();

    /// Trailing embedded timestamp in an aggregated WhatsApp bubble
    /// ("bora! 14:32", "ok, 2:05 PM").
    static ref TRAILING_TIME_RE: Regex =
        Regex::new(r"[,\s]*(\d{1,2}:\d{2}(?:\s?[AaPp][Mm])?)\s*$").unwrap();
}

#[derive(Debug, Clone, Copy)]
struct ScreenMetrics {
    width: i32,
    height: i32,
}

/// A stateless parser for one application, built from its profile.
pub struct AppParser {
    profile: AppProfile,
}

impl AppParser {
    pub fn new(profile: AppProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &AppProfile {
        &self.profile
    }

    /// Reconstruct the conversation currently on screen.
    ///
    /// Returns `WrongScreen` when the DM gate rejects the screen, `StaleTree`
    /// when the root itself is dead, and `NoMatch` when no messages could be
    /// extracted. A found contact name alone is not a conversation.
    pub fn parse(
        &self,
        root: &UiNode,
        _event: UiEventType,
    ) -> Result<ParsedConversation, ParseError> {
        if root.children().is_err() {
            return Err(ParseError::StaleTree);
        }

        if !self.profile.dm_gate_ids.is_empty() {
            let on_dm_screen = self
                .profile
                .dm_gate_ids
                .iter()
                .any(|id| tree::find_by_resource_id(root, id).is_some());
            if !on_dm_screen {
                trace!(platform = %self.profile.platform, "dm gate rejected screen");
                return Err(ParseError::WrongScreen);
            }
        }

        let screen = screen_metrics(root);
        let contact_name = self
            .resolve_contact_name(root, screen)
            .unwrap_or_else(|| "unknown".to_string());

        let container = self.find_message_container(root).unwrap_or(root);

        let mut messages = Vec::new();
        let mut ancestors: Vec<&UiNode> = Vec::new();
        self.collect_messages(
            container,
            0,
            &mut ancestors,
            screen,
            &contact_name,
            &mut messages,
        );

        if messages.is_empty() {
            return Err(ParseError::NoMatch);
        }

        if messages.len() > MAX_MESSAGES {
            messages.drain(..messages.len() - MAX_MESSAGES);
        }

        debug!(
            platform = %self.profile.platform,
            contact = %contact_name,
            count = messages.len(),
            "parsed conversation"
        );
        Ok(ParsedConversation::new(
            contact_name,
            self.profile.platform,
            messages,
        ))
    }

    /// Contact-name ladder: stable id, then toolbar structure, then the
    /// positional header-region guess. First usable value wins.
    fn resolve_contact_name(&self, root: &UiNode, screen: ScreenMetrics) -> Option<String> {
        for id in self.profile.contact_name_ids {
            if let Some(node) = tree::find_by_resource_id(root, id) {
                if let Some(value) = node_value(node) {
                    if !self.is_system_text(&value) {
                        return Some(value);
                    }
                }
            }
        }

        if let Some(name) = self.toolbar_name(root) {
            return Some(name);
        }

        self.header_region_name(root, screen)
    }

    fn toolbar_name(&self, root: &UiNode) -> Option<String> {
        let toolbar = find_toolbar(root, 0, self.profile.toolbar_max_depth)?;
        first_substantial_text(toolbar, |s| !self.is_system_text(s))
    }

    fn header_region_name(&self, root: &UiNode, screen: ScreenMetrics) -> Option<String> {
        let limit_y = (screen.height as f32 * self.profile.header_fraction) as i32;
        first_header_name(root, limit_y, &|s| !self.is_system_text(s) && is_likely_name(s))
    }

    /// Locate the message list: known ids first, then the first scrollable
    /// (or list-classed) descendant within the depth bound.
    fn find_message_container<'a>(&self, root: &'a UiNode) -> Option<&'a UiNode> {
        for id in self.profile.message_list_ids {
            if let Some(node) = tree::find_by_resource_id(root, id) {
                return Some(node);
            }
        }
        find_scrollable(root, 0, SCROLLABLE_SEARCH_DEPTH)
    }

    /// Depth-bounded pre-order collection. A node that qualifies as a
    /// message contributes exactly once; its descendants are not visited
    /// (nested spans would otherwise duplicate content).
    fn collect_messages<'a>(
        &self,
        node: &'a UiNode,
        depth: usize,
        ancestors: &mut Vec<&'a UiNode>,
        screen: ScreenMetrics,
        contact_name: &str,
        out: &mut Vec<ParsedMessage>,
    ) {
        if depth > MESSAGE_SEARCH_DEPTH {
            return;
        }

        if let Some(message) = self.message_from_node(node, ancestors, screen, contact_name) {
            out.push(message);
            return;
        }

        // A stale child invalidates its branch only; siblings continue.
        let children = match node.children() {
            Ok(children) => children,
            Err(_) => return,
        };
        ancestors.push(node);
        for child in children {
            self.collect_messages(child, depth + 1, ancestors, screen, contact_name, out);
        }
        ancestors.pop();
    }

    fn message_from_node(
        &self,
        node: &UiNode,
        ancestors: &[&UiNode],
        screen: ScreenMetrics,
        contact_name: &str,
    ) -> Option<ParsedMessage> {
        // Primary path: visible text on the node itself.
        if let Ok(Some(text)) = node.text() {
            let trimmed = text.trim();
            if !trimmed.is_empty()
                && !self.is_system_text(trimmed)
                && !trimmed.eq_ignore_ascii_case(contact_name)
            {
                if self.profile.message_like_filter && !is_message_like(node) {
                    return None;
                }

                // Aggregate nested spans into one bubble string.
                let mut content = tree::extract_all_text(node);
                let mut embedded_time = None;
                if self.profile.strip_trailing_time {
                    (content, embedded_time) = strip_trailing_time(&content);
                }
                if content.is_empty() || self.is_system_text(&content) {
                    return None;
                }

                let is_from_user = self.resolve_direction(node, ancestors, screen);
                return Some(ParsedMessage {
                    text: content,
                    is_from_user,
                    timestamp: embedded_time,
                });
            }
            return None;
        }

        // Fallback path for declarative-UI apps: accessibility labels.
        if self.profile.use_labels {
            if let Ok(Some(label)) = node.content_desc() {
                let trimmed = label.trim();
                if !trimmed.is_empty()
                    && !self.is_system_text(trimmed)
                    && !trimmed.eq_ignore_ascii_case(contact_name)
                    && !is_likely_name(trimmed)
                {
                    let is_from_user = self.resolve_direction(node, ancestors, screen);
                    return Some(ParsedMessage::new(trimmed, is_from_user));
                }
            }
        }

        None
    }

    fn resolve_direction(
        &self,
        node: &UiNode,
        ancestors: &[&UiNode],
        screen: ScreenMetrics,
    ) -> bool {
        if let DirectionStrategy::OutgoingMarkers { max_hops } = self.profile.direction {
            for ancestor in ancestors.iter().rev().take(max_hops) {
                if let Ok(Some(id)) = ancestor.resource_id() {
                    let id = id.to_lowercase();
                    if OUT_MARKERS.iter().any(|m| id.contains(m)) {
                        return true;
                    }
                    if IN_MARKERS.iter().any(|m| id.contains(m)) {
                        return false;
                    }
                }
            }
        }
        tree::is_right_aligned(node, screen.width)
    }

    /// Reject UI chrome: clock times, dates, weekday names, presence and
    /// composer strings, anything shorter than two characters.
    pub fn is_system_text(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.chars().count() < 2 {
            return true;
        }
        if TIME_RE.is_match(trimmed) || DATE_RE.is_match(trimmed) {
            return true;
        }
        let lower = trimmed.to_lowercase();
        if WEEKDAYS.contains(&lower.as_str()) {
            return true;
        }
        if self.profile.system_phrases.contains(&lower.as_str()) {
            return true;
        }
        self.profile
            .system_prefixes
            .iter()
            .any(|prefix| lower.starts_with(prefix))
    }
}

/// Plausible-contact-name filter for positional fallbacks: short, leading
/// uppercase, not mostly digits. A heuristic, not a guarantee.
pub fn is_likely_name(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.len() > 5 {
        return false;
    }
    let leads_upper = words[0]
        .chars()
        .next()
        .map(|c| c.is_uppercase())
        .unwrap_or(false);
    if !leads_upper {
        return false;
    }
    let total = trimmed.chars().count();
    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    digits * 10 < total * 3
}

/// Instagram candidate check: a text-rendering, non-editable view whose id
/// does not suggest chrome.
fn is_message_like(node: &UiNode) -> bool {
    let class = node
        .class_name()
        .ok()
        .flatten()
        .map(|c| c.to_lowercase())
        .unwrap_or_default();
    if !class.contains("textview") {
        return false;
    }
    if node.is_editable().unwrap_or(true) {
        return false;
    }
    if let Ok(Some(id)) = node.resource_id() {
        let id = id.to_lowercase();
        if CHROME_ID_WORDS.iter().any(|w| id.contains(w)) {
            return false;
        }
    }
    true
}

/// Strip a trailing embedded `HH:MM[ AM/PM]` from aggregated bubble text,
/// returning the cleaned text and the removed timestamp if any.
fn strip_trailing_time(content: &str) -> (String, Option<String>) {
    if let Some(caps) = TRAILING_TIME_RE.captures(content) {
        let time = caps.get(1).map(|m| m.as_str().to_string());
        let cleaned = TRAILING_TIME_RE.replace(content, "").trim().to_string();
        (cleaned, time)
    } else {
        (content.trim().to_string(), None)
    }
}

fn screen_metrics(root: &UiNode) -> ScreenMetrics {
    let bounds = root.bounds().unwrap_or_default();
    ScreenMetrics {
        width: if bounds.width() > 0 {
            bounds.width()
        } else {
            FALLBACK_SCREEN_WIDTH
        },
        height: if bounds.bottom > 0 {
            bounds.bottom
        } else {
            FALLBACK_SCREEN_HEIGHT
        },
    }
}

fn node_value(node: &UiNode) -> Option<String> {
    if let Ok(Some(text)) = node.text() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    if let Ok(Some(desc)) = node.content_desc() {
        let trimmed = desc.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}

fn find_toolbar(node: &UiNode, depth: usize, max_depth: usize) -> Option<&UiNode> {
    if depth > max_depth {
        return None;
    }
    if let Ok(Some(class)) = node.class_name() {
        let class = class.to_lowercase();
        if class.contains("toolbar") || class.contains("actionbar") {
            return Some(node);
        }
    }
    for child in node.children().ok()? {
        if let Some(found) = find_toolbar(child, depth + 1, max_depth) {
            return Some(found);
        }
    }
    None
}

/// First non-trivial text or label in a subtree, pre-order.
fn first_substantial_text(node: &UiNode, accept: impl Fn(&str) -> bool + Copy) -> Option<String> {
    if let Some(value) = node_value(node) {
        if value.chars().count() >= 2 && accept(&value) {
            return Some(value);
        }
    }
    for child in node.children().ok()? {
        if let Some(found) = first_substantial_text(child, accept) {
            return Some(found);
        }
    }
    None
}

/// First acceptable name-looking value whose node starts inside the header
/// region (top of the screen).
fn first_header_name(node: &UiNode, limit_y: i32, accept: &dyn Fn(&str) -> bool) -> Option<String> {
    if let Ok(bounds) = node.bounds() {
        if bounds.top <= limit_y {
            if let Some(value) = node_value(node) {
                if accept(&value) {
                    return Some(value);
                }
            }
        }
    }
    for child in node.children().ok()? {
        if let Some(found) = first_header_name(child, limit_y, accept) {
            return Some(found);
        }
    }
    None
}

fn find_scrollable(node: &UiNode, depth: usize, max_depth: usize) -> Option<&UiNode> {
    if depth > max_depth {
        return None;
    }
    if node.is_scrollable().unwrap_or(false) {
        return Some(node);
    }
    if let Ok(Some(class)) = node.class_name() {
        let class = class.to_lowercase();
        if SCROLL_CLASSES.iter().any(|c| class.contains(c)) {
            return Some(node);
        }
    }
    for child in node.children().ok()? {
        if let Some(found) = find_scrollable(child, depth + 1, max_depth) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeBounds;
    use crate::parsers::profile::profile_for;
    use crate::types::Platform;

    fn parser(platform: Platform) -> AppParser {
        AppParser::new(profile_for(platform))
    }

    fn screen_root() -> UiNode {
        UiNode::new()
            .with_class("android.widget.FrameLayout")
            .with_bounds(NodeBounds::new(0, 0, 1080, 2280))
    }

    fn left_text(text: &str) -> UiNode {
        UiNode::new()
            .with_class("android.widget.TextView")
            .with_text(text)
            .with_bounds(NodeBounds::new(40, 500, 500, 560))
    }

    fn right_text(text: &str) -> UiNode {
        UiNode::new()
            .with_class("android.widget.TextView")
            .with_text(text)
            .with_bounds(NodeBounds::new(600, 600, 1040, 660))
    }

    #[test]
    fn test_is_likely_name() {
        assert!(is_likely_name("Maria"));
        assert!(is_likely_name("Maria Clara Souza"));
        assert!(!is_likely_name("maria"));
        assert!(!is_likely_name(""));
        assert!(!is_likely_name("one two three four five six"));
        assert!(!is_likely_name("A1234567"));
    }

    #[test]
    fn test_system_text_shared_patterns() {
        let p = parser(Platform::Whatsapp);
        assert!(p.is_system_text("14:32"));
        assert!(p.is_system_text("2:05 PM"));
        assert!(p.is_system_text("12/03"));
        assert!(p.is_system_text("Tuesday"));
        assert!(p.is_system_text("x"));
        assert!(!p.is_system_text("bora sair?"));
    }

    #[test]
    fn test_system_text_per_app_phrases() {
        let wa = parser(Platform::Whatsapp);
        assert!(wa.is_system_text("online"));
        assert!(wa.is_system_text("last seen today at 14:32"));
        let hinge = parser(Platform::Hinge);
        assert!(hinge.is_system_text("Liked your photo"));
        assert!(!hinge.is_system_text("online right now?"));
    }

    #[test]
    fn test_strip_trailing_time() {
        assert_eq!(
            strip_trailing_time("bora! 14:32"),
            ("bora!".to_string(), Some("14:32".to_string()))
        );
        assert_eq!(
            strip_trailing_time("ok, 2:05 PM"),
            ("ok".to_string(), Some("2:05 PM".to_string()))
        );
        assert_eq!(strip_trailing_time("no time here"), ("no time here".to_string(), None));
    }

    #[test]
    fn test_whatsapp_end_to_end() {
        let root = screen_root()
            .with_child(
                UiNode::new()
                    .with_resource_id("com.whatsapp:id/conversation_contact_name")
                    .with_text("Maria")
                    .with_bounds(NodeBounds::new(100, 20, 400, 80)),
            )
            .with_child(
                UiNode::new()
                    .with_resource_id("com.whatsapp:id/message_list")
                    .scrollable()
                    .with_children(vec![
                        left_text("oi"),
                        left_text("bora sair?"),
                        right_text("bora!"),
                    ]),
            );

        let conv = parser(Platform::Whatsapp)
            .parse(&root, UiEventType::WindowContentChanged)
            .unwrap();
        assert_eq!(conv.contact_name, "Maria");
        assert_eq!(conv.platform, Platform::Whatsapp);
        let got: Vec<(&str, bool)> = conv
            .messages
            .iter()
            .map(|m| (m.text.as_str(), m.is_from_user))
            .collect();
        assert_eq!(got, vec![("oi", false), ("bora sair?", false), ("bora!", true)]);
    }

    #[test]
    fn test_whatsapp_direction_markers_beat_alignment() {
        // Left-aligned bubble nested under an outgoing row id.
        let root = screen_root().with_child(
            UiNode::new()
                .with_resource_id("com.whatsapp:id/message_list")
                .scrollable()
                .with_child(
                    UiNode::new()
                        .with_resource_id("com.whatsapp:id/row_message_out")
                        .with_child(left_text("sent from the left edge")),
                )
                .with_child(
                    UiNode::new()
                        .with_resource_id("com.whatsapp:id/row_message_in")
                        .with_child(right_text("received on the right")),
                ),
        );

        let conv = parser(Platform::Whatsapp)
            .parse(&root, UiEventType::WindowContentChanged)
            .unwrap();
        assert!(conv.messages[0].is_from_user);
        assert!(!conv.messages[1].is_from_user);
    }

    #[test]
    fn test_whatsapp_strips_embedded_timestamp() {
        let root = screen_root().with_child(
            UiNode::new()
                .with_resource_id("com.whatsapp:id/message_list")
                .scrollable()
                .with_child(left_text("bora sair? 14:32")),
        );

        let conv = parser(Platform::Whatsapp)
            .parse(&root, UiEventType::WindowContentChanged)
            .unwrap();
        assert_eq!(conv.messages[0].text, "bora sair?");
        assert_eq!(conv.messages[0].timestamp.as_deref(), Some("14:32"));
    }

    #[test]
    fn test_no_recursion_after_match() {
        // A bubble with a nested span must contribute exactly one message.
        let bubble = UiNode::new()
            .with_class("android.view.ViewGroup")
            .with_text("first span")
            .with_bounds(NodeBounds::new(40, 500, 500, 560))
            .with_child(left_text("second span"));
        let root = screen_root().with_child(
            UiNode::new()
                .with_resource_id("com.whatsapp:id/message_list")
                .scrollable()
                .with_child(bubble),
        );

        let conv = parser(Platform::Whatsapp)
            .parse(&root, UiEventType::WindowContentChanged)
            .unwrap();
        assert_eq!(conv.messages.len(), 1);
        // Aggregated, not duplicated.
        assert_eq!(conv.messages[0].text, "first span second span");
    }

    #[test]
    fn test_system_only_tree_yields_no_match() {
        for platform in [Platform::Whatsapp, Platform::Tinder, Platform::Bumble, Platform::Hinge] {
            let p = parser(platform);
            let chrome: Vec<UiNode> = p
                .profile()
                .system_phrases
                .iter()
                .take(4)
                .map(|s| left_text(s))
                .chain([left_text("14:32"), left_text("typing...")])
                .collect();
            let root = screen_root().with_child(
                UiNode::new()
                    .with_class("androidx.recyclerview.widget.RecyclerView")
                    .with_children(chrome),
            );
            assert_eq!(
                p.parse(&root, UiEventType::WindowContentChanged),
                Err(ParseError::NoMatch),
                "{platform}"
            );
        }
    }

    #[test]
    fn test_tinder_label_fallback_and_header_name() {
        let root = screen_root()
            .with_child(
                // Header region: top 12% of 2280 = 273px.
                UiNode::new()
                    .with_text("Julia")
                    .with_bounds(NodeBounds::new(400, 60, 680, 120)),
            )
            .with_child(
                UiNode::new()
                    .with_class("androidx.compose.ui.platform.ComposeView")
                    .scrollable()
                    .with_children(vec![
                        UiNode::new()
                            .with_content_desc("hey, how was the trip?")
                            .with_bounds(NodeBounds::new(40, 500, 500, 560)),
                        UiNode::new()
                            .with_content_desc("amazing! you'd love it")
                            .with_bounds(NodeBounds::new(600, 600, 1040, 660)),
                    ]),
            );

        let conv = parser(Platform::Tinder)
            .parse(&root, UiEventType::WindowContentChanged)
            .unwrap();
        assert_eq!(conv.contact_name, "Julia");
        assert_eq!(conv.messages.len(), 2);
        assert!(!conv.messages[0].is_from_user);
        assert!(conv.messages[1].is_from_user);
    }

    #[test]
    fn test_toolbar_fallback_name() {
        let root = screen_root()
            .with_child(
                UiNode::new()
                    .with_class("androidx.appcompat.widget.Toolbar")
                    .with_child(UiNode::new().with_text("Carla"))
                    .with_bounds(NodeBounds::new(0, 0, 1080, 150)),
            )
            .with_child(
                UiNode::new()
                    .with_class("androidx.recyclerview.widget.RecyclerView")
                    .with_child(left_text("oi, tudo bem?")),
            );

        let conv = parser(Platform::Whatsapp)
            .parse(&root, UiEventType::WindowContentChanged)
            .unwrap();
        assert_eq!(conv.contact_name, "Carla");
    }

    #[test]
    fn test_instagram_dm_gate_rejects_feed() {
        // Plenty of text, none of the four DM indicator ids.
        let root = screen_root().with_child(
            UiNode::new()
                .with_class("androidx.recyclerview.widget.RecyclerView")
                .with_children(vec![left_text("some feed caption"), left_text("another post")]),
        );
        assert_eq!(
            parser(Platform::Instagram).parse(&root, UiEventType::WindowContentChanged),
            Err(ParseError::WrongScreen)
        );
    }

    #[test]
    fn test_instagram_dm_thread_parses() {
        let root = screen_root()
            .with_child(
                UiNode::new()
                    .with_resource_id("com.instagram.android:id/thread_title")
                    .with_text("ana_styles")
                    .with_bounds(NodeBounds::new(300, 30, 780, 90)),
            )
            .with_child(
                UiNode::new()
                    .with_resource_id("com.instagram.android:id/message_list")
                    .scrollable()
                    .with_children(vec![
                        UiNode::new()
                            .with_class("android.widget.TextView")
                            .with_text("loved your last story")
                            .with_bounds(NodeBounds::new(40, 500, 500, 560)),
                        // Composer must be excluded even though it has text.
                        UiNode::new()
                            .with_class("android.widget.EditText")
                            .with_resource_id(
                                "com.instagram.android:id/row_thread_composer_edittext",
                            )
                            .with_text("draft reply")
                            .editable()
                            .with_bounds(NodeBounds::new(40, 2100, 900, 2180)),
                    ]),
            );

        let conv = parser(Platform::Instagram)
            .parse(&root, UiEventType::WindowContentChanged)
            .unwrap();
        assert_eq!(conv.contact_name, "ana_styles");
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].text, "loved your last story");
    }

    #[test]
    fn test_stale_root_is_stale_tree() {
        let root = screen_root().stale();
        assert_eq!(
            parser(Platform::Bumble).parse(&root, UiEventType::WindowContentChanged),
            Err(ParseError::StaleTree)
        );
    }

    #[test]
    fn test_stale_branch_skipped_siblings_survive() {
        let root = screen_root().with_child(
            UiNode::new()
                .with_resource_id("com.whatsapp:id/message_list")
                .scrollable()
                .with_child(UiNode::new().with_child(left_text("lost")).stale())
                .with_child(left_text("still here")),
        );
        let conv = parser(Platform::Whatsapp)
            .parse(&root, UiEventType::WindowContentChanged)
            .unwrap();
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].text, "still here");
    }

    #[test]
    fn test_truncates_to_last_thirty() {
        let bubbles: Vec<UiNode> = (0..45).map(|i| left_text(&format!("message {i}"))).collect();
        let root = screen_root().with_child(
            UiNode::new()
                .with_resource_id("com.whatsapp:id/message_list")
                .scrollable()
                .with_children(bubbles),
        );
        let conv = parser(Platform::Whatsapp)
            .parse(&root, UiEventType::WindowContentChanged)
            .unwrap();
        assert_eq!(conv.messages.len(), MAX_MESSAGES);
        assert_eq!(conv.messages[0].text, "message 15");
        assert_eq!(conv.messages[29].text, "message 44");
    }

    #[test]
    fn test_name_found_but_no_messages_is_no_match() {
        let root = screen_root().with_child(
            UiNode::new()
                .with_resource_id("com.whatsapp:id/conversation_contact_name")
                .with_text("Maria"),
        );
        assert_eq!(
            parser(Platform::Whatsapp).parse(&root, UiEventType::WindowContentChanged),
            Err(ParseError::NoMatch)
        );
    }
}
