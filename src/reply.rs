//! # Handler replies
//!
//! Every handler returns a [`Reply`]. Replies are plain values: they steer
//! the dispatch loop purely by being inspected after the handler returns.
//! `Exit` terminates the run, `Next` re-dispatches under another topic, and
//! `Continue` has no control effect.

use serde_json::Value;

/// A handler's reply token.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Terminate the actor; `run` returns `result`
    Exit { result: Value },
    /// Re-dispatch under `topic` without yielding to the outer select.
    ///
    /// A `payload` of `None` means "reuse the current payload"; `Some`
    /// replaces it, and `Some(Value::Null)` is a real replacement, not an
    /// absence. An empty or missing topic falls through to the fallback
    /// handler.
    Next {
        topic: Option<String>,
        payload: Option<Value>,
    },
    /// No control effect; the loop keeps going
    Continue,
}

impl Default for Reply {
    fn default() -> Self {
        Reply::Continue
    }
}

impl Reply {
    pub fn is_exit(&self) -> bool {
        matches!(self, Reply::Exit { .. })
    }
}

/// Build an [`Reply::Exit`] token carrying the run's result
pub fn exit(result: Value) -> Reply {
    Reply::Exit { result }
}

/// Build a [`Reply::Next`] token that reuses the current payload
pub fn next(topic: impl Into<String>) -> Reply {
    Reply::Next {
        topic: Some(topic.into()),
        payload: None,
    }
}

/// Build a [`Reply::Next`] token that replaces the current payload
pub fn next_with(topic: impl Into<String>, payload: Value) -> Reply {
    Reply::Next {
        topic: Some(topic.into()),
        payload: Some(payload),
    }
}
