//! Memory stack error types.

use std::error::Error;
use std::fmt;

/// Errors reported while constructing a memory stack.
///
/// Allocation itself has no recoverable failure mode: exhaustion is fatal
/// and marker misuse is a contract violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackError {
    /// A [`StackConfig`](crate::StackConfig) parameter is out of range.
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => {
                write!(f, "invalid stack config: {reason}")
            }
        }
    }
}

impl Error for StackError {}
