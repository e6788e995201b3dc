//! Namespace -> result broadcast registry. Each namespace
//! gets its own `broadcast` channel lazily, so any number of subscribers
//! can observe the `Result`s emitted for requests on that namespace
//! without the actor needing to know who's listening.
#![allow(dead_code)]
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::result::Result as DistResult;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Registry of per-namespace broadcast channels. Cheap to clone: the
/// inner map is shared behind an `Arc<Mutex<...>>`, matching the
/// non-async shared-state locking idiom for data that's only
/// ever held briefly (insert-if-absent, clone a sender/subscribe).
#[derive(Clone)]
pub struct ResultRouter {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<DistResult>>>>,
    capacity: usize,
}

impl ResultRouter {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    fn sender_for(&self, namespace: &str) -> broadcast::Sender<DistResult> {
        let mut channels = self.channels.lock();
        channels
            .entry(namespace.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Subscribe to a namespace's result stream. Creates the channel if
    /// this is the first subscriber.
    pub fn subscribe(&self, namespace: &str) -> broadcast::Receiver<DistResult> {
        self.sender_for(namespace).subscribe()
    }

    /// Publish a result on its request's namespace. A namespace with no
    /// subscribers drops the result with a warning; dropping is
    /// non-fatal, the actor keeps processing the next request.
    pub fn publish(&self, result: DistResult) {
        let namespace = result.request().namespace.clone();
        let sender = self.sender_for(&namespace);
        if sender.send(result).is_err() {
            warn!(%namespace, "no receiver for result namespace, dropping result");
        }
    }
}

impl Default for ResultRouter {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
