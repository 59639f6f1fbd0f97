//! # Actor
//!
//! The factory that binds user state to a handler table and runs the
//! dispatch loop. Construction partitions the handler table; `run` installs
//! the state wrapper, fires the init hook, and hands control to the loop
//! until a handler exits or the host closes a core source.

use crate::config::ActorConfig;
use crate::dispatch::DispatchLoop;
use crate::errors::ActorError;
use crate::handlers::{Handlers, LifecycleHooks, TopicHandler};
use crate::messages::{InternalMessage, SOURCE_INIT};
use crate::metrics::MetricsCollector;
use crate::process::ProcessHandle;
use crate::reply::Reply;
use crate::state::ActorState;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// A constructed actor, ready to run once a process is attached.
pub struct Actor<S> {
    state: S,
    topics: HashMap<String, TopicHandler<S>>,
    hooks: LifecycleHooks<S>,
    process: Option<ProcessHandle>,
    config: ActorConfig,
    metrics: MetricsCollector,
}

impl<S> Actor<S> {
    /// Bind `state` to a handler table.
    ///
    /// Fails with [`ActorError::InvalidHandlers`] when the table registers
    /// an empty or reserved topic name.
    pub fn new(state: S, handlers: Handlers<S>) -> Result<Self, ActorError> {
        let (topics, hooks) = handlers.partition()?;
        Ok(Self {
            state,
            topics,
            hooks,
            process: None,
            config: ActorConfig::default(),
            metrics: MetricsCollector::new(),
        })
    }

    /// Attach the process this actor runs inside. Required before `run`.
    pub fn with_process(mut self, process: ProcessHandle) -> Self {
        self.process = Some(process);
        self
    }

    pub fn with_config(mut self, config: ActorConfig) -> Self {
        self.config = config;
        self
    }

    /// A handle onto this run's metrics, usable while the actor is running
    pub fn metrics(&self) -> MetricsCollector {
        self.metrics.clone()
    }

    /// Run the actor to termination.
    ///
    /// Returns the payload of the first `Exit` reply, or
    /// `{"status": "completed"}` when the host closes the inbox or events
    /// channel. Handler panics are not caught and abort the run.
    pub async fn run(self) -> Result<Value, ActorError> {
        let Actor {
            state,
            topics,
            hooks,
            process,
            config,
            metrics,
        } = self;
        let process = process.ok_or(ActorError::ProcessNotAttached)?;
        let ProcessHandle {
            pid,
            mailbox_rx,
            events_rx,
            outbound_tx,
        } = process;

        info!(pid = %pid, "actor starting");
        let (internal_tx, internal_rx) = mpsc::channel(config.internal_capacity);
        let mut state = ActorState::new(state, topics, internal_tx.clone(), outbound_tx, pid);

        if let Some(init) = hooks.init.clone() {
            match init(&mut state) {
                Reply::Exit { result } => {
                    info!("init requested exit before loop start");
                    return Ok(result);
                }
                Reply::Next { topic, payload } => {
                    let message = InternalMessage::next(topic, payload, SOURCE_INIT);
                    if internal_tx.try_send(message).is_err() {
                        warn!("internal channel full before loop start, dropping init re-dispatch");
                    }
                }
                Reply::Continue => {}
            }
        }

        let dispatch = DispatchLoop {
            state,
            hooks,
            mailbox_rx,
            events_rx,
            internal_rx,
            internal_tx,
            metrics,
        };
        let result = dispatch.run().await;
        info!("actor terminated");
        Ok(result)
    }
}
