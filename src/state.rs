//! # Actor state
//!
//! [`ActorState`] wraps the user's state value for the lifetime of a run and
//! carries the mutable registries with it. Handlers receive `&mut
//! ActorState<S>` as their first argument and reach the user state through
//! `Deref`, so `state.field` works as if the helpers were installed on the
//! user's own record.

use crate::channels::{ChannelRegistry, ExternalChannel};
use crate::errors::ActorError;
use crate::handlers::{TopicHandler, RESERVED_PREFIX};
use crate::id::ChannelId;
use crate::messages::{InternalMessage, OutboundMessage, SOURCE_ASYNC};
use crate::reply::Reply;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct ActorState<S> {
    data: S,
    pub(crate) topics: HashMap<String, TopicHandler<S>>,
    pub(crate) channels: ChannelRegistry<S>,
    internal_tx: mpsc::Sender<InternalMessage>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    pid: String,
}

impl<S> ActorState<S> {
    pub(crate) fn new(
        data: S,
        topics: HashMap<String, TopicHandler<S>>,
        internal_tx: mpsc::Sender<InternalMessage>,
        outbound_tx: mpsc::Sender<OutboundMessage>,
        pid: String,
    ) -> Self {
        Self {
            data,
            topics,
            channels: ChannelRegistry::new(),
            internal_tx,
            outbound_tx,
            pid,
        }
    }

    /// Upsert a topic handler. Takes effect from the next dispatch lookup.
    pub fn add_handler<F>(&mut self, topic: impl Into<String>, handler: F) -> Result<(), ActorError>
    where
        F: Fn(&mut ActorState<S>, Value, &str, &str) -> Reply + Send + Sync + 'static,
    {
        let topic = topic.into();
        if topic.is_empty() || topic.starts_with(RESERVED_PREFIX) {
            return Err(ActorError::InvalidHandler(topic));
        }
        debug!(topic = %topic, "adding topic handler");
        self.topics.insert(topic, Arc::new(handler));
        Ok(())
    }

    /// Remove a topic handler; returns whether one was registered.
    /// Lifecycle slots are not reachable from here.
    pub fn remove_handler(&mut self, topic: &str) -> bool {
        let removed = self.topics.remove(topic).is_some();
        if removed {
            debug!(topic = %topic, "removed topic handler");
        }
        removed
    }

    /// Register a user channel under its id, binding it to `callback`.
    /// Registering a channel whose id is already present replaces both the
    /// channel and the callback. The new case is selectable from the next
    /// loop iteration.
    pub fn register_channel<F>(
        &mut self,
        channel: ExternalChannel,
        callback: F,
    ) -> Result<(), ActorError>
    where
        F: Fn(&mut ActorState<S>, Option<Value>, &ChannelId) -> Reply + Send + Sync + 'static,
    {
        if channel.id().is_empty() {
            return Err(ActorError::InvalidChannel("empty channel id".to_string()));
        }
        debug!(channel = %channel.id(), "registering user channel");
        self.channels.insert(channel, Arc::new(callback));
        Ok(())
    }

    /// Unregister a user channel; returns whether it was registered. The
    /// receiving half is dropped, releasing the channel to its owner.
    pub fn unregister_channel(&mut self, id: &ChannelId) -> bool {
        let removed = self.channels.remove(id);
        if removed {
            debug!(channel = %id, "unregistered user channel");
        }
        removed
    }

    /// Run `task` off the actor's thread. If it resolves to [`Reply::Next`],
    /// the re-dispatch is posted to the internal channel and re-enters the
    /// loop as a normal topic dispatch from source `async`. Any other reply
    /// is discarded. The posting task may block on a full internal buffer;
    /// it runs off-loop, so the actor keeps draining.
    pub fn spawn_async<F>(&self, task: F)
    where
        F: Future<Output = Reply> + Send + 'static,
    {
        let internal_tx = self.internal_tx.clone();
        tokio::spawn(async move {
            if let Reply::Next { topic, payload } = task.await {
                let message = InternalMessage::next(topic, payload, SOURCE_ASYNC);
                if internal_tx.send(message).await.is_err() {
                    debug!("actor finished before async completion, dropping re-dispatch");
                }
            }
        });
    }

    /// Post a message to the actor's own internal channel. Types other than
    /// the re-dispatch type are delivered to the internal-message hook on a
    /// later loop iteration. Posted without blocking; a full buffer drops
    /// the message with a warning.
    pub fn post_internal(&self, msg_type: impl Into<String>, payload: Value) {
        let message = InternalMessage {
            msg_type: msg_type.into(),
            topic: None,
            payload: Some(payload),
            from: self.pid.clone(),
        };
        if let Err(e) = self.internal_tx.try_send(message) {
            warn!("internal post dropped: {}", e);
        }
    }

    /// Fire-and-forget send through the host. Delivery failures are logged,
    /// never surfaced.
    pub fn send(&self, to: impl Into<String>, topic: impl Into<String>, payload: Value) {
        let message = OutboundMessage {
            to: to.into(),
            from: self.pid.clone(),
            topic: topic.into(),
            payload,
        };
        debug!("{}", message.to_log());
        if let Err(e) = self.outbound_tx.try_send(message) {
            debug!("outbound send dropped: {}", e);
        }
    }

    /// The identity of this actor's process
    pub fn pid(&self) -> &str {
        &self.pid
    }

    /// Number of user channels currently registered
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Size of the select set the next loop iteration will wait on:
    /// the three core sources plus the registered user channels
    pub fn select_case_count(&self) -> usize {
        crate::dispatch::CORE_SELECT_CASES + self.channels.len()
    }

    #[cfg(test)]
    pub(crate) fn detached(data: S) -> Self {
        let (internal_tx, _internal_rx) = mpsc::channel(1);
        let (outbound_tx, _outbound_rx) = mpsc::channel(1);
        Self::new(
            data,
            HashMap::new(),
            internal_tx,
            outbound_tx,
            "detached".to_string(),
        )
    }
}

impl<S> Deref for ActorState<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.data
    }
}

impl<S> DerefMut for ActorState<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.data
    }
}
