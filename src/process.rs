//! # Process handle
//!
//! The contract the runtime consumes from its host: an inbox of messages,
//! a channel of system events, an identity, and somewhere to put outbound
//! sends. Hosts build a [`ProcessHandle`] and inject it with
//! `Actor::with_process`; [`ProcessHandle::pair`] wires one up against a
//! [`ProcessController`] for tests and in-process hosts.

use crate::config::ActorConfig;
use crate::messages::{Event, Message, OutboundMessage};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

/// The actor-side ends of a process: consumed once by `run`.
pub struct ProcessHandle {
    pub(crate) pid: String,
    pub(crate) mailbox_rx: mpsc::Receiver<Message>,
    pub(crate) events_rx: mpsc::Receiver<Event>,
    pub(crate) outbound_tx: mpsc::Sender<OutboundMessage>,
}

impl ProcessHandle {
    /// Assemble a handle from host-owned channels
    pub fn new(
        pid: impl Into<String>,
        mailbox_rx: mpsc::Receiver<Message>,
        events_rx: mpsc::Receiver<Event>,
        outbound_tx: mpsc::Sender<OutboundMessage>,
    ) -> Self {
        Self {
            pid: pid.into(),
            mailbox_rx,
            events_rx,
            outbound_tx,
        }
    }

    /// Build a handle together with the controlling half, using default
    /// channel capacities
    pub fn pair(pid: impl Into<String>) -> (Self, ProcessController) {
        Self::pair_with_config(pid, &ActorConfig::default())
    }

    /// Build a handle/controller pair with capacities from `config`
    pub fn pair_with_config(
        pid: impl Into<String>,
        config: &ActorConfig,
    ) -> (Self, ProcessController) {
        let (mailbox_tx, mailbox_rx) = mpsc::channel(config.mailbox_capacity);
        let (events_tx, events_rx) = mpsc::channel(config.event_capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(config.mailbox_capacity);
        let handle = Self::new(pid, mailbox_rx, events_rx, outbound_tx);
        let controller = ProcessController {
            mailbox_tx: Some(mailbox_tx),
            events_tx: Some(events_tx),
            outbound_rx,
        };
        (handle, controller)
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }
}

/// The host-side half of a [`ProcessHandle::pair`]: delivers messages and
/// events to the actor and drains its outbound sends. Dropping the
/// controller closes the inbox and events channels, which terminates the
/// actor with the default completion result.
pub struct ProcessController {
    mailbox_tx: Option<mpsc::Sender<Message>>,
    events_tx: Option<mpsc::Sender<Event>>,
    outbound_rx: mpsc::Receiver<OutboundMessage>,
}

impl ProcessController {
    /// Deliver a message to the actor's inbox; returns whether it was
    /// accepted (false once the mailbox is closed or the actor is gone)
    pub async fn deliver(
        &self,
        from: impl Into<String>,
        topic: impl Into<String>,
        payload: Value,
    ) -> bool {
        match &self.mailbox_tx {
            Some(tx) => tx.send(Message::new(from, topic, payload)).await.is_ok(),
            None => false,
        }
    }

    /// Deliver a system event to the actor
    pub async fn deliver_event(&self, event: Event) -> bool {
        match &self.events_tx {
            Some(tx) => {
                debug!("delivering {}", event.to_log());
                tx.send(event).await.is_ok()
            }
            None => false,
        }
    }

    /// Wait for the actor's next outbound send; `None` once the actor has
    /// finished
    pub async fn next_outbound(&mut self) -> Option<OutboundMessage> {
        self.outbound_rx.recv().await
    }

    /// Close the inbox. The actor completes once it observes the closure.
    pub fn close_mailbox(&mut self) {
        self.mailbox_tx.take();
    }

    /// Close the events channel
    pub fn close_events(&mut self) {
        self.events_tx.take();
    }
}
