//! Queue error types.

/// Errors returned by queue mutations that take a caller-supplied position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The position does not exist in the queue.
    #[error("queue index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
