//! # User channels
//!
//! Channels registered at runtime join the actor's select set alongside the
//! inbox, events, and internal channels. The registry owns the receiving
//! half of each channel for as long as it is registered; the sending half
//! stays with whoever created the channel. Each receiver is wrapped in a
//! stream that emits a final close marker, so the dispatch loop observes
//! closure as an item and can notify the callback before deregistering.

use crate::handlers::ChannelCallback;
use crate::id::ChannelId;
use serde_json::Value;
use std::collections::HashMap;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{once, Stream, StreamExt, StreamMap};

/// A channel handed to the actor for registration.
///
/// Wraps the receiving half together with the stable identity the registry
/// keys on. The identity survives registration: keep a clone of the id to
/// unregister later or to match deliveries in a shared callback.
#[derive(Debug)]
pub struct ExternalChannel {
    id: ChannelId,
    rx: mpsc::Receiver<Value>,
}

impl ExternalChannel {
    /// Wrap a receiver under a freshly generated id
    pub fn new(rx: mpsc::Receiver<Value>) -> Self {
        Self {
            id: ChannelId::generate(),
            rx,
        }
    }

    /// Wrap a receiver under a caller-chosen id. Registering a second
    /// channel under an id already in use replaces the first.
    pub fn with_id(id: impl Into<ChannelId>, rx: mpsc::Receiver<Value>) -> Self {
        Self { id: id.into(), rx }
    }

    pub fn id(&self) -> &ChannelId {
        &self.id
    }
}

/// What a registered channel yielded on select
pub(crate) enum ChannelItem {
    /// A value arrived
    Delivered(Value),
    /// The sender side closed the channel
    Closed,
}

type ChannelStream = Pin<Box<dyn Stream<Item = ChannelItem> + Send>>;

/// The select-case set for user channels: one stream per registered channel,
/// plus the callback each channel is bound to.
pub(crate) struct ChannelRegistry<S> {
    streams: StreamMap<ChannelId, ChannelStream>,
    callbacks: HashMap<ChannelId, ChannelCallback<S>>,
}

impl<S> ChannelRegistry<S> {
    pub(crate) fn new() -> Self {
        Self {
            streams: StreamMap::new(),
            callbacks: HashMap::new(),
        }
    }

    /// Insert a channel, replacing any previous registration under its id
    pub(crate) fn insert(&mut self, channel: ExternalChannel, callback: ChannelCallback<S>) {
        let ExternalChannel { id, rx } = channel;
        let stream: ChannelStream = Box::pin(
            ReceiverStream::new(rx)
                .map(ChannelItem::Delivered)
                .chain(once(ChannelItem::Closed)),
        );
        self.streams.insert(id.clone(), stream);
        self.callbacks.insert(id, callback);
    }

    /// Remove a channel; returns whether it was registered. The receiver is
    /// dropped, releasing the channel back to its owner.
    pub(crate) fn remove(&mut self, id: &ChannelId) -> bool {
        let had_stream = self.streams.remove(id).is_some();
        let had_callback = self.callbacks.remove(id).is_some();
        had_stream || had_callback
    }

    pub(crate) fn callback(&self, id: &ChannelId) -> Option<ChannelCallback<S>> {
        self.callbacks.get(id).cloned()
    }

    /// Number of live select cases contributed by user channels
    pub(crate) fn len(&self) -> usize {
        self.streams.len()
    }

    /// Wait for the next item from any registered channel. Resolves to
    /// `None` immediately when the registry is empty, which disables the
    /// corresponding select branch for that iteration.
    pub(crate) async fn next_item(&mut self) -> Option<(ChannelId, ChannelItem)> {
        self.streams.next().await
    }
}
