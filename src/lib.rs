//! # Troupe Actor Runtime
//!
//! Troupe is a runtime for long-running actors: each actor owns private
//! state, consumes a serial stream of messages and events fused from
//! several sources, and steers its own lifecycle through the reply tokens
//! its handlers return.
//!
//! ## Core Features
//!
//! * **Serial dispatch**: one loop selects across the inbox, the system
//!   events channel, an internal re-entry channel, and any number of
//!   dynamically registered user channels, and invokes exactly one handler
//!   chain at a time
//! * **Handler-driven control flow**: handlers return [`Reply`] tokens;
//!   [`exit`] terminates the run, [`next`] re-dispatches under another
//!   topic without yielding to the select
//! * **Dynamic registries**: topic handlers and user channels can be added
//!   and removed from inside handlers
//! * **Async bridge**: fire-and-forget tasks re-enter the loop through the
//!   internal channel, keeping the state single-writer
//!
//! ## Architecture
//!
//! * [`Actor`]: the factory binding state to a handler table; `run` drives
//!   the actor to termination
//! * [`Handlers`]: the handler table, partitioned at construction into
//!   lifecycle hooks and the mutable topic map
//! * [`ActorState`]: the user state wrapper threaded through every handler,
//!   carrying the registry helpers
//! * [`ProcessHandle`]: the host contract of inbox, events, identity, and
//!   outbound sends
//!
//! ## Example
//!
//! ```no_run
//! use serde_json::json;
//! use troupe::{exit, Actor, Handlers, ProcessHandle};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let (process, controller) = ProcessHandle::pair("worker-1");
//! let handlers = Handlers::new().on("status", |state: &mut troupe::ActorState<i64>, _p, _t, _f| {
//!     exit(json!({"status": "ok", "value": **state}))
//! });
//! let actor = Actor::new(0i64, handlers)?.with_process(process);
//! let result = actor.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod channels;
pub mod config;
mod dispatch;
pub mod errors;
pub mod handlers;
pub mod id;
pub mod logging;
pub mod messages;
pub mod metrics;
pub mod process;
pub mod reply;
pub mod state;

pub use actor::Actor;
pub use channels::ExternalChannel;
pub use config::ActorConfig;
pub use errors::ActorError;
pub use handlers::{
    ChannelCallback, EventHandler, Handlers, InitHandler, InternalHandler, TopicHandler,
    FALLBACK_TOPIC, RESERVED_PREFIX,
};
pub use id::ChannelId;
pub use logging::init_logging;
pub use messages::{
    event_kind, Event, InternalMessage, Message, OutboundMessage, MSG_TYPE_NEXT, SOURCE_ASYNC,
    SOURCE_EVENT_HANDLER, SOURCE_INIT,
};
pub use metrics::{DispatchCounts, DispatchMetrics, DispatchSource, HandlerTimings, MetricsCollector};
pub use process::{ProcessController, ProcessHandle};
pub use reply::{exit, next, next_with, Reply};
pub use state::ActorState;
