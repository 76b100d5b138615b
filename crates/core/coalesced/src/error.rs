use std::fmt;

use dashboard_result::create_error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
/// Failures raised by the coalescer itself, never by the wrapped operation.
pub enum Error {
    /// The caller driving the operation was dropped before it settled
    Abandoned,
    /// Reached the `max_concurrent` amount of operations in flight
    MaxConcurrent { max: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Abandoned => write!(f, "Shared operation was dropped before it settled"),
            Error::MaxConcurrent { max } => write!(f, "Max number of operations in flight ({max})"),
        }
    }
}

impl std::error::Error for Error {}

impl From<Error> for dashboard_result::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Abandoned => create_error!(OperationAbandoned),
            Error::MaxConcurrent { max } => create_error!(TooManyInFlight { max }),
        }
    }
}
