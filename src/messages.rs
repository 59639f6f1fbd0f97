//! # Messages
//!
//! The records that flow through an actor's sources: inbox messages, system
//! events, internal re-entry messages, and outbound sends handed back to the
//! host. Event kinds and internal message tags live here too.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// System event kinds delivered on the events channel.
///
/// Hosts may define further kinds; the dispatch loop only interprets
/// [`CANCEL`](event_kind::CANCEL) specially.
pub mod event_kind {
    /// Cooperative cancellation request from the host or a parent process
    pub const CANCEL: &str = "pid.cancel";
    /// A linked process exited normally
    pub const EXIT: &str = "pid.exit";
    /// A linked process went down
    pub const LINK_DOWN: &str = "pid.link_down";
}

/// Internal message type that re-enters topic dispatch
pub const MSG_TYPE_NEXT: &str = "__next";

/// Source tag for re-dispatches enqueued by `__init`
pub const SOURCE_INIT: &str = "init";
/// Source tag for re-dispatches enqueued by the event hook
pub const SOURCE_EVENT_HANDLER: &str = "event_handler";
/// Source tag for re-dispatches posted by the async bridge
pub const SOURCE_ASYNC: &str = "async";

/// An item arriving on the actor's inbox.
///
/// The dispatch loop reads the three fields exactly once per message and
/// passes them positionally to handlers as `(payload, topic, from)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    pub topic: String,
    pub payload: Value,
}

impl Message {
    pub fn new(from: impl Into<String>, topic: impl Into<String>, payload: Value) -> Self {
        Self {
            from: from.into(),
            topic: topic.into(),
            payload,
        }
    }

    pub fn to_log(&self) -> String {
        format!("Message: {} from {}", self.topic, self.from)
    }
}

/// An item arriving on the system-events channel.
///
/// `kind` is matched against [`event_kind`] constants. Extra fields pass
/// through to the event hooks untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub from: String,
    /// Informational deadline (milliseconds since the epoch), if any
    #[serde(default)]
    pub deadline: Option<u64>,
    /// Kind-specific data, e.g. the result carried by an exit event
    #[serde(default)]
    pub data: Option<Value>,
}

impl Event {
    pub fn new(kind: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            from: from.into(),
            deadline: None,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn to_log(&self) -> String {
        format!("Event: {} from {}", self.kind, self.from)
    }
}

/// An item arriving on the actor's own internal channel.
///
/// Only [`MSG_TYPE_NEXT`] is interpreted by the dispatch loop; every other
/// type is handed to the internal-message hook when one is defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalMessage {
    pub msg_type: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
    pub from: String,
}

impl InternalMessage {
    /// Build a re-dispatch message for the given topic
    pub fn next(topic: Option<String>, payload: Option<Value>, from: impl Into<String>) -> Self {
        Self {
            msg_type: MSG_TYPE_NEXT.to_string(),
            topic,
            payload,
            from: from.into(),
        }
    }

    pub fn to_log(&self) -> String {
        match &self.topic {
            Some(topic) => format!("InternalMessage: {} -> {} from {}", self.msg_type, topic, self.from),
            None => format!("InternalMessage: {} from {}", self.msg_type, self.from),
        }
    }
}

/// A fire-and-forget send handed back to the host for delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub to: String,
    pub from: String,
    pub topic: String,
    pub payload: Value,
}

impl OutboundMessage {
    pub fn to_log(&self) -> String {
        format!("OutboundMessage: {} to {}", self.topic, self.to)
    }
}
