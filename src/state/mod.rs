pub mod broadcast;
pub mod match_data;
pub mod store;

use std::{sync::Arc, time::Duration};

use crate::config::AppConfig;

pub use self::broadcast::{Broadcaster, PublishReport, SubscriberId};
pub use self::store::{StateStore, StoreGuard};

pub type SharedState = Arc<AppState>;

/// Central application state: the match store, the viewer registry and the
/// settings the handlers need at request time.
pub struct AppState {
    store: StateStore,
    broadcaster: Broadcaster,
    subscriber_buffer: usize,
    keep_alive: Option<Duration>,
}

impl AppState {
    /// Wrap `store` into a shared state using the stream settings from `config`.
    pub fn new(store: StateStore, config: &AppConfig) -> SharedState {
        Arc::new(Self {
            store,
            broadcaster: Broadcaster::new(),
            subscriber_buffer: config.subscriber_buffer(),
            keep_alive: config.keep_alive(),
        })
    }

    /// Authoritative store for teams and match data.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Registry of connected viewer streams.
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Queue capacity handed to each new subscriber channel.
    pub fn subscriber_buffer(&self) -> usize {
        self.subscriber_buffer
    }

    /// Interval between SSE keep-alive comments, when enabled.
    pub fn keep_alive(&self) -> Option<Duration> {
        self.keep_alive
    }

    /// Publish the state behind `guard` to every subscriber.
    pub fn publish(&self, guard: &StoreGuard<'_>) -> PublishReport {
        self.broadcaster.publish(guard)
    }
}
