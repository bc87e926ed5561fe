// Errors raised by the undo coordinator.
//
// Only misuse of the coordinator's contract is reported; every other operation is
// defined for all reachable states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoError {
    /// A caller asked for something the current state cannot satisfy, such as
    /// undoing a closed item while the closed-items list is empty.
    InvariantViolation(String),
}

impl std::fmt::Display for UndoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UndoError::InvariantViolation(s) => write!(f, "Invariant violation: {}", s),
        }
    }
}

impl std::error::Error for UndoError {}

/// A specialized `Result` type for undo coordinator operations.
pub type Result<T> = std::result::Result<T, UndoError>;
