//! The accessibility-service event loop: filter, debounce, parse, store.
//!
//! Runs entirely on the single event-delivery thread; parsing is synchronous
//! and finishes before the next event for the same app is looked at. The
//! only rate control is a per-app debounce window, because UI-change events
//! arrive in bursts (scroll, animation, keystroke) and re-walking the whole
//! tree for each one would be wasted work against a mutating tree.

use crate::parsers::ParserRegistry;
use crate::store::ConversationStore;
use crate::types::{Platform, UiEventType};
use crate::node::UiNode;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default minimum spacing between processed events for one app.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// One incoming UI-change notification.
///
/// `root` is the current root of the active window, already resolved by the
/// platform layer; `None` means the window was gone by the time we looked.
/// The dispatcher takes the event by value and drops the root at the end of
/// the call, which is where the platform handle gets recycled.
#[derive(Debug)]
pub struct UiEvent {
    pub package: String,
    pub event_type: UiEventType,
    pub root: Option<UiNode>,
}

/// What the dispatcher did with an event. Every variant short of `Stored`
/// means "wait for the next event"; none of them is an error to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Source app is not on the allow-list.
    Ignored,
    /// Arrived inside the debounce window for its app.
    Debounced,
    /// No window root was available.
    NoRoot,
    /// The parser found nothing usable on this screen.
    ParseFailed,
    /// A conversation was extracted and written to the store.
    Stored,
}

/// Routes qualifying UI events through the matching parser into the store.
pub struct EventDispatcher {
    registry: ParserRegistry,
    store: Arc<ConversationStore>,
    debounce: Duration,
    enabled: HashSet<Platform>,
    last_processed: HashMap<Platform, Instant>,
}

impl EventDispatcher {
    pub fn new(store: Arc<ConversationStore>) -> Self {
        Self::with_debounce(store, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(store: Arc<ConversationStore>, debounce: Duration) -> Self {
        Self {
            registry: ParserRegistry::new(),
            store,
            debounce,
            enabled: Platform::all().iter().copied().collect(),
            last_processed: HashMap::new(),
        }
    }

    /// Restrict dispatch to the given platforms; everything else is treated
    /// like a non-target app. The package allow-list still applies first.
    pub fn with_enabled_platforms(mut self, platforms: &[Platform]) -> Self {
        self.enabled = platforms.iter().copied().collect();
        self
    }

    /// Handle one event. Never panics and never propagates a parse failure;
    /// a single bad event must not take down the long-lived service.
    pub fn on_event(&mut self, event: UiEvent) -> DispatchOutcome {
        // Hard allow-list, for both privacy and cost: anything not targeted
        // is dropped before we look at its tree.
        let platform = match Platform::from_package(&event.package) {
            Some(platform) => platform,
            None => {
                trace!(package = %event.package, "event from non-target app ignored");
                return DispatchOutcome::Ignored;
            }
        };

        if !self.enabled.contains(&platform) {
            trace!(%platform, "platform disabled by configuration");
            return DispatchOutcome::Ignored;
        }

        let now = Instant::now();
        if let Some(last) = self.last_processed.get(&platform) {
            if now.duration_since(*last) < self.debounce {
                trace!(%platform, "event inside debounce window");
                return DispatchOutcome::Debounced;
            }
        }

        let root = match event.root {
            Some(root) => root,
            None => {
                debug!(%platform, "no window root available");
                return DispatchOutcome::NoRoot;
            }
        };

        let parser = match self.registry.get(&event.package) {
            Some(parser) => parser,
            None => return DispatchOutcome::Ignored,
        };

        // Debounce clock starts at processing, whatever the outcome.
        self.last_processed.insert(platform, now);

        match parser.parse(&root, event.event_type) {
            Ok(conversation) if !conversation.messages.is_empty() => {
                debug!(
                    %platform,
                    contact = %conversation.contact_name,
                    messages = conversation.messages.len(),
                    "storing parsed conversation"
                );
                self.store.update_conversation(conversation);
                DispatchOutcome::Stored
            }
            Ok(_) => DispatchOutcome::ParseFailed,
            Err(e) => {
                debug!(%platform, "parse produced no conversation: {e}");
                DispatchOutcome::ParseFailed
            }
        }
        // `root` dropped here: the platform node handle is released whatever
        // happened above.
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }
}
