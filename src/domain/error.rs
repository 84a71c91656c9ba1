use thiserror::Error;

/// Reasons a task or timer operation is declined.
///
/// A declined operation never changes state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    #[error("task name must not be empty")]
    EmptyName,

    #[error("duration must be a positive number of minutes, got {0}")]
    InvalidDuration(f64),

    #[error("no task with id '{0}'")]
    NotFound(String),

    #[error("id prefix '{0}' matches more than one task")]
    AmbiguousId(String),

    #[error("task '{0}' is already completed; reset it first")]
    AlreadyCompleted(String),

    #[error("no task owns the timer")]
    NoTimer,

    #[error("the countdown has not reached zero yet")]
    NotInOvertime,

    #[error("'{0}' is not a drop target")]
    InvalidDropTarget(&'static str),
}
