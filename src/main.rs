//! scraper-replay - feed recorded UI-event snapshots through the pipeline.
//!
//! Reads one or more JSON files, each holding a serialized `UiEvent` (package
//! id, event type, tree snapshot), runs them through the dispatcher exactly
//! as the live service would, and prints what ended up in the store. Useful
//! for debugging a parser profile against a captured screen.

use chat_scraper::{Config, ConversationStore, EventDispatcher, UiEvent};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.general.log_level.clone())),
        )
        .with_target(false)
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: scraper-replay <event.json>...");
        std::process::exit(2);
    }

    let store = Arc::new(ConversationStore::open_default_with_limits(
        &config.data_dir(),
        config.store_limits(),
    ));
    let mut dispatcher = EventDispatcher::with_debounce(
        Arc::clone(&store),
        Duration::from_millis(config.dispatcher.debounce_ms),
    );
    if let Some(platforms) = &config.dispatcher.enabled_platforms {
        dispatcher = dispatcher.with_enabled_platforms(platforms);
    }

    for path in &paths {
        let contents = std::fs::read_to_string(path)?;
        let event: UiEvent = match serde_json::from_str::<ReplayEvent>(&contents) {
            Ok(replay) => replay.into(),
            Err(e) => {
                warn!("skipping {path}: {e}");
                continue;
            }
        };
        let outcome = dispatcher.on_event(event);
        info!("{path}: {outcome:?}");
    }

    for conversation in store.all_conversations() {
        println!(
            "[{}] {} ({} messages)",
            conversation.platform,
            conversation.contact_name,
            conversation.messages.len()
        );
        for message in &conversation.messages {
            let direction = if message.is_from_user { ">" } else { "<" };
            println!("  {direction} {}", message.text);
        }
    }

    Ok(())
}

/// On-disk form of an event; `UiEvent` itself doesn't derive Deserialize
/// because the live service never builds one from JSON.
#[derive(serde::Deserialize)]
struct ReplayEvent {
    package: String,
    event_type: chat_scraper::UiEventType,
    root: Option<chat_scraper::UiNode>,
}

impl From<ReplayEvent> for UiEvent {
    fn from(replay: ReplayEvent) -> Self {
        UiEvent {
            package: replay.package,
            event_type: replay.event_type,
            root: replay.root,
        }
    }
}
