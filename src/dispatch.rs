//! # Dispatch loop
//!
//! The core of the runtime: one loop that fuses the inbox, the system-events
//! channel, the internal re-entry channel, and every registered user channel
//! into a single serial stream of handler invocations. Handlers never run
//! concurrently with each other; the only suspension point is the select at
//! the top of the loop.
//!
//! Selection is biased in the order inbox, events, internal, user channels.
//! Closure of a core source completes the run; closure of a user channel
//! notifies its callback and removes it from the select set.

use crate::channels::ChannelItem;
use crate::handlers::{LifecycleHooks, FALLBACK_TOPIC};
use crate::id::ChannelId;
use crate::messages::{
    event_kind, Event, InternalMessage, Message, MSG_TYPE_NEXT, SOURCE_EVENT_HANDLER,
};
use crate::metrics::{DispatchSource, MetricsCollector};
use crate::reply::Reply;
use crate::state::ActorState;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// The sources every actor always selects on: inbox, events, internal
pub(crate) const CORE_SELECT_CASES: usize = 3;

/// The result `run` yields when the host closes a core source
pub(crate) fn completed_result() -> Value {
    json!({"status": "completed"})
}

pub(crate) struct DispatchLoop<S> {
    pub(crate) state: ActorState<S>,
    pub(crate) hooks: LifecycleHooks<S>,
    pub(crate) mailbox_rx: mpsc::Receiver<Message>,
    pub(crate) events_rx: mpsc::Receiver<Event>,
    pub(crate) internal_rx: mpsc::Receiver<InternalMessage>,
    pub(crate) internal_tx: mpsc::Sender<InternalMessage>,
    pub(crate) metrics: MetricsCollector,
}

impl<S> DispatchLoop<S> {
    /// Drive the actor to termination and return its result
    pub(crate) async fn run(mut self) -> Value {
        debug!("dispatch loop starting");
        loop {
            tokio::select! {
                biased;

                maybe_message = self.mailbox_rx.recv() => {
                    match maybe_message {
                        Some(message) => {
                            if let Some(result) = self.handle_inbox(message).await {
                                return result;
                            }
                        }
                        None => {
                            info!("inbox closed, completing");
                            return completed_result();
                        }
                    }
                }

                maybe_event = self.events_rx.recv() => {
                    match maybe_event {
                        Some(event) => {
                            if let Some(result) = self.handle_event(event).await {
                                return result;
                            }
                        }
                        None => {
                            info!("events channel closed, completing");
                            return completed_result();
                        }
                    }
                }

                maybe_internal = self.internal_rx.recv() => {
                    match maybe_internal {
                        Some(message) => {
                            if let Some(result) = self.handle_internal(message).await {
                                return result;
                            }
                        }
                        None => {
                            info!("internal channel closed, completing");
                            return completed_result();
                        }
                    }
                }

                Some((id, item)) = self.state.channels.next_item() => {
                    if let Some(result) = self.handle_channel_item(id, item).await {
                        return result;
                    }
                }
            }
        }
    }

    async fn handle_inbox(&mut self, message: Message) -> Option<Value> {
        debug!("{}", message.to_log());
        let Message {
            from,
            topic,
            payload,
        } = message;
        let started = Instant::now();
        let (reply, steps) = self.dispatch_topic(&topic, payload, &from);
        self.metrics
            .record_dispatch(DispatchSource::Inbox, steps, started.elapsed())
            .await;
        match reply {
            Reply::Exit { result } => Some(result),
            _ => None,
        }
    }

    async fn handle_event(&mut self, event: Event) -> Option<Value> {
        debug!("{}", event.to_log());
        let started = Instant::now();
        let mut steps = 0u64;
        let mut exit = None;

        if let Some(hook) = self.hooks.on_event.clone() {
            steps += 1;
            match hook(&mut self.state, &event, &event.kind, &event.from) {
                Reply::Exit { result } => exit = Some(result),
                Reply::Next { topic, payload } => {
                    self.enqueue_next(topic, payload, SOURCE_EVENT_HANDLER);
                }
                Reply::Continue => {}
            }
        }

        // Cancel-kind events additionally reach the cancel hook, even when
        // the event hook already scheduled a re-dispatch.
        if exit.is_none() && event.kind == event_kind::CANCEL {
            if let Some(hook) = self.hooks.on_cancel.clone() {
                steps += 1;
                if let Reply::Exit { result } =
                    hook(&mut self.state, &event, &event.kind, &event.from)
                {
                    exit = Some(result);
                }
            }
        }

        self.metrics
            .record_dispatch(DispatchSource::Event, steps, started.elapsed())
            .await;
        exit
    }

    async fn handle_internal(&mut self, message: InternalMessage) -> Option<Value> {
        debug!("{}", message.to_log());
        let InternalMessage {
            msg_type,
            topic,
            payload,
            from,
        } = message;
        let started = Instant::now();

        match (msg_type.as_str(), topic) {
            (MSG_TYPE_NEXT, Some(topic)) => {
                let payload = payload.unwrap_or(Value::Null);
                let (reply, steps) = self.dispatch_topic(&topic, payload, &from);
                self.metrics
                    .record_dispatch(DispatchSource::Internal, steps, started.elapsed())
                    .await;
                if let Reply::Exit { result } = reply {
                    return Some(result);
                }
            }
            (msg_type, _) => {
                let (exit, steps) = match self.hooks.on_internal.clone() {
                    Some(hook) => {
                        let payload = payload.unwrap_or(Value::Null);
                        let exit = match hook(&mut self.state, payload, msg_type, &from) {
                            Reply::Exit { result } => Some(result),
                            _ => None,
                        };
                        (exit, 1)
                    }
                    None => {
                        debug!(msg_type = %msg_type, "unhandled internal message dropped");
                        (None, 0)
                    }
                };
                self.metrics
                    .record_dispatch(DispatchSource::Internal, steps, started.elapsed())
                    .await;
                if exit.is_some() {
                    return exit;
                }
            }
        }
        None
    }

    async fn handle_channel_item(&mut self, id: ChannelId, item: ChannelItem) -> Option<Value> {
        let started = Instant::now();
        let mut steps = 0u64;
        let exit = match item {
            ChannelItem::Delivered(value) => {
                debug!(channel = %id, "user channel delivery");
                match self.state.channels.callback(&id) {
                    Some(callback) => {
                        steps += 1;
                        match callback(&mut self.state, Some(value), &id) {
                            Reply::Exit { result } => Some(result),
                            _ => None,
                        }
                    }
                    None => {
                        warn!(channel = %id, "delivery on channel with no callback");
                        None
                    }
                }
            }
            ChannelItem::Closed => {
                debug!(channel = %id, "user channel closed, removing from select set");
                let exit = match self.state.channels.callback(&id) {
                    Some(callback) => {
                        steps += 1;
                        match callback(&mut self.state, None, &id) {
                            Reply::Exit { result } => Some(result),
                            _ => None,
                        }
                    }
                    None => None,
                };
                self.state.channels.remove(&id);
                exit
            }
        };
        self.metrics
            .record_dispatch(DispatchSource::Channel, steps, started.elapsed())
            .await;
        exit
    }

    /// Topic dispatch with `Next`-chaining. Runs synchronously: a chain is
    /// never preempted by the outer select. Expressed as a loop so a
    /// ping-ponging chain cannot grow the stack.
    fn dispatch_topic(&mut self, topic: &str, payload: Value, from: &str) -> (Reply, u64) {
        let mut current_topic = topic.to_string();
        let mut current_payload = payload;
        let mut steps = 0u64;
        loop {
            let handler = match self.state.topics.get(&current_topic) {
                Some(handler) => Some(handler.clone()),
                None => self.hooks.fallback.clone(),
            };
            let Some(handler) = handler else {
                debug!(topic = %current_topic, "no handler for topic, dropping");
                return (Reply::Continue, steps);
            };
            steps += 1;
            let reply = handler(&mut self.state, current_payload.clone(), &current_topic, from);
            match reply {
                Reply::Next { topic, payload } => {
                    if let Some(payload) = payload {
                        current_payload = payload;
                    }
                    match topic {
                        Some(topic) if !topic.is_empty() => current_topic = topic,
                        _ => {
                            if self.hooks.fallback.is_some() {
                                current_topic = FALLBACK_TOPIC.to_string();
                            } else {
                                debug!("chain reached an empty topic with no fallback, dropping");
                                return (Reply::Continue, steps);
                            }
                        }
                    }
                }
                reply => return (reply, steps),
            }
        }
    }

    /// Post a re-dispatch to the internal channel without blocking: the
    /// loop is the channel's consumer, so an awaited send from here could
    /// never complete once the buffer fills.
    fn enqueue_next(&self, topic: Option<String>, payload: Option<Value>, source: &str) {
        let message = InternalMessage::next(topic, payload, source);
        if let Err(e) = self.internal_tx.try_send(message) {
            warn!(source = %source, "internal channel full, dropping re-dispatch: {}", e);
        }
    }
}
