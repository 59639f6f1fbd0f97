use serde_json::Value;
use tokio::task::JoinHandle;
use troupe::{Actor, ActorError, Handlers, ProcessController, ProcessHandle};

/// Journal state used across the integration tests: handlers append what
/// they observed, and the exit result usually carries the entries back.
#[derive(Default)]
pub struct Journal {
    pub entries: Vec<Value>,
}

impl Journal {
    pub fn record(&mut self, entry: Value) {
        self.entries.push(entry);
    }
}

/// Build an actor against a mocked process and spawn its run
pub fn spawn_actor<S: Send + 'static>(
    state: S,
    handlers: Handlers<S>,
    pid: &str,
) -> (
    JoinHandle<Result<Value, ActorError>>,
    ProcessController,
) {
    let (process, controller) = ProcessHandle::pair(pid);
    let actor = Actor::new(state, handlers)
        .expect("valid handler table")
        .with_process(process);
    (tokio::spawn(actor.run()), controller)
}
