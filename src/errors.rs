use thiserror::Error;

/// # ActorError
///
/// Represents errors raised while constructing an actor or mutating its
/// registries. Handler failures are deliberately not represented here: a
/// panicking handler aborts the run and propagates to the caller uncaught.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// The handler table passed to the factory contained an unusable topic
    #[error("Invalid handler table: topic {0:?} is empty or reserved")]
    InvalidHandlers(String),

    /// `add_handler` was called with an empty or reserved topic
    #[error("Invalid handler: topic {0:?} is empty or reserved")]
    InvalidHandler(String),

    /// `register_channel` was called with an unusable channel
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    /// `run` was called before a process handle was attached
    #[error("No process attached; call with_process before run")]
    ProcessNotAttached,
}
