//! # Handler table
//!
//! Users describe an actor's behavior as a set of topic handlers plus
//! optional lifecycle hooks. The [`Handlers`] builder collects them; the
//! actor factory partitions the table once into the fixed lifecycle slots
//! and the mutable topic map that handlers may edit at runtime.

use crate::errors::ActorError;
use crate::id::ChannelId;
use crate::messages::Event;
use crate::reply::Reply;
use crate::state::ActorState;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Topic names with this prefix are lifecycle slots, never topic handlers
pub const RESERVED_PREFIX: &str = "__";

/// Topic name the fallback handler sees when a chain carries no topic of
/// its own
pub const FALLBACK_TOPIC: &str = "__default";

/// Handler for a topic dispatch: `(state, payload, topic, from)`
pub type TopicHandler<S> = Arc<dyn Fn(&mut ActorState<S>, Value, &str, &str) -> Reply + Send + Sync>;

/// Hook for system events: `(state, event, kind, from)`
pub type EventHandler<S> = Arc<dyn Fn(&mut ActorState<S>, &Event, &str, &str) -> Reply + Send + Sync>;

/// Hook invoked once before the dispatch loop starts
pub type InitHandler<S> = Arc<dyn Fn(&mut ActorState<S>) -> Reply + Send + Sync>;

/// Hook for internal messages of unrecognized type: `(state, payload, msg_type, from)`
pub type InternalHandler<S> =
    Arc<dyn Fn(&mut ActorState<S>, Value, &str, &str) -> Reply + Send + Sync>;

/// Callback for a registered user channel: `(state, item, channel_id)`.
/// `None` means the channel was observed closed.
pub type ChannelCallback<S> =
    Arc<dyn Fn(&mut ActorState<S>, Option<Value>, &ChannelId) -> Reply + Send + Sync>;

/// The handler table passed to the actor factory.
///
/// Topic handlers are registered by name with [`Handlers::on`]; lifecycle
/// hooks have dedicated methods and are held apart from topic routing.
pub struct Handlers<S> {
    topics: Vec<(String, TopicHandler<S>)>,
    init: Option<InitHandler<S>>,
    on_event: Option<EventHandler<S>>,
    on_cancel: Option<EventHandler<S>>,
    on_internal: Option<InternalHandler<S>>,
    fallback: Option<TopicHandler<S>>,
}

impl<S> Default for Handlers<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Handlers<S> {
    pub fn new() -> Self {
        Self {
            topics: Vec::new(),
            init: None,
            on_event: None,
            on_cancel: None,
            on_internal: None,
            fallback: None,
        }
    }

    /// Register a topic handler. Registering the same topic again replaces
    /// the earlier handler at partition time.
    pub fn on<F>(mut self, topic: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut ActorState<S>, Value, &str, &str) -> Reply + Send + Sync + 'static,
    {
        self.topics.push((topic.into(), Arc::new(handler)));
        self
    }

    /// Hook run exactly once after construction, before the loop starts
    pub fn on_init<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ActorState<S>) -> Reply + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(handler));
        self
    }

    /// Hook invoked for every system event
    pub fn on_event<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ActorState<S>, &Event, &str, &str) -> Reply + Send + Sync + 'static,
    {
        self.on_event = Some(Arc::new(handler));
        self
    }

    /// Hook invoked additionally for cancel-kind events, after the event hook
    pub fn on_cancel<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ActorState<S>, &Event, &str, &str) -> Reply + Send + Sync + 'static,
    {
        self.on_cancel = Some(Arc::new(handler));
        self
    }

    /// Hook invoked for internal messages the loop does not interpret itself
    pub fn on_internal_message<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ActorState<S>, Value, &str, &str) -> Reply + Send + Sync + 'static,
    {
        self.on_internal = Some(Arc::new(handler));
        self
    }

    /// Fallback topic handler: receives dispatches for unknown topics and
    /// terminates `Next` chains whose topic is missing
    pub fn fallback<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ActorState<S>, Value, &str, &str) -> Reply + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(handler));
        self
    }

    /// Split the table into the mutable topic map and the fixed lifecycle
    /// slots, validating topic names on the way.
    pub(crate) fn partition(
        self,
    ) -> Result<(HashMap<String, TopicHandler<S>>, LifecycleHooks<S>), ActorError> {
        let mut topics = HashMap::with_capacity(self.topics.len());
        for (topic, handler) in self.topics {
            if topic.is_empty() || topic.starts_with(RESERVED_PREFIX) {
                return Err(ActorError::InvalidHandlers(topic));
            }
            topics.insert(topic, handler);
        }
        let hooks = LifecycleHooks {
            init: self.init,
            on_event: self.on_event,
            on_cancel: self.on_cancel,
            on_internal: self.on_internal,
            fallback: self.fallback,
        };
        Ok((topics, hooks))
    }
}

/// The reserved lifecycle slots, fixed for the lifetime of a run
pub(crate) struct LifecycleHooks<S> {
    pub(crate) init: Option<InitHandler<S>>,
    pub(crate) on_event: Option<EventHandler<S>>,
    pub(crate) on_cancel: Option<EventHandler<S>>,
    pub(crate) on_internal: Option<InternalHandler<S>>,
    pub(crate) fallback: Option<TopicHandler<S>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::Reply;

    fn noop() -> impl Fn(&mut ActorState<()>, Value, &str, &str) -> Reply + Send + Sync {
        |_state, _payload, _topic, _from| Reply::Continue
    }

    #[test]
    fn test_partition_splits_hooks_from_topics() {
        let handlers = Handlers::<()>::new()
            .on("status", noop())
            .on("stop", noop())
            .fallback(noop())
            .on_init(|_state| Reply::Continue);
        let (topics, hooks) = handlers.partition().unwrap();
        assert_eq!(topics.len(), 2);
        assert!(topics.contains_key("status"));
        assert!(hooks.fallback.is_some());
        assert!(hooks.init.is_some());
        assert!(hooks.on_event.is_none());
    }

    #[test]
    fn test_partition_rejects_reserved_topic() {
        let handlers = Handlers::<()>::new().on("__sneaky", noop());
        match handlers.partition() {
            Err(ActorError::InvalidHandlers(topic)) => assert_eq!(topic, "__sneaky"),
            other => panic!("expected InvalidHandlers, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_partition_rejects_empty_topic() {
        let handlers = Handlers::<()>::new().on("", noop());
        assert!(matches!(
            handlers.partition(),
            Err(ActorError::InvalidHandlers(_))
        ));
    }

    #[test]
    fn test_later_registration_wins() {
        let handlers = Handlers::<()>::new()
            .on("status", |_s, _p, _t, _f| Reply::Continue)
            .on("status", |_s, _p, _t, _f| Reply::Exit {
                result: Value::Null,
            });
        let (topics, _) = handlers.partition().unwrap();
        let handler = topics.get("status").unwrap();
        // A dummy state is enough to observe which registration survived.
        let mut state = crate::state::ActorState::detached(());
        let reply = handler(&mut state, Value::Null, "status", "tester");
        assert!(reply.is_exit());
    }
}
