#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

use std::fmt;

/// Result type with custom Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error information
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// Type of error and additional information
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub error_type: ErrorType,

    /// Where this error occurred
    pub location: String,
}

/// Possible error types
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    // ? Caller bugs
    /// Input could not be turned into an operation key
    ProgrammerError {
        error: String,
    },

    // ? Transport related errors
    NetworkError,
    ServerError {
        code: u16,
    },
    ClientError {
        code: u16,
    },
    /// Access denied because a prerequisite entitlement is missing
    EntitlementDenied {
        entitlement: String,
    },
    InvalidResponse {
        error: String,
    },

    // ? Coalescer related errors
    /// The caller driving a shared operation went away before it settled
    OperationAbandoned,
    TooManyInFlight {
        max: usize,
    },

    // ? General errors
    FailedValidation {
        error: String,
    },
    InternalError,
}

impl Error {
    /// Whether this error came back from the transport as a failed call
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self.error_type,
            ErrorType::NetworkError
                | ErrorType::ServerError { .. }
                | ErrorType::ClientError { .. }
                | ErrorType::EntitlementDenied { .. }
        )
    }

    /// Whether this error means the user lacks an entitlement (e.g. premium)
    pub fn is_entitlement_denied(&self) -> bool {
        matches!(self.error_type, ErrorType::EntitlementDenied { .. })
    }

    /// Message suitable for showing to the end user
    pub fn user_message(&self) -> &'static str {
        match &self.error_type {
            ErrorType::EntitlementDenied { .. } => {
                "This feature requires an upgraded account."
            }
            ErrorType::NetworkError => "Could not reach the server, please try again.",
            ErrorType::ServerError { .. } | ErrorType::OperationAbandoned => {
                "Something went wrong on our end, please try again."
            }
            ErrorType::TooManyInFlight { .. } => "Too many requests at once, please slow down.",
            ErrorType::FailedValidation { .. } => "Some of the provided values are invalid.",
            ErrorType::ClientError { .. }
            | ErrorType::InvalidResponse { .. }
            | ErrorType::ProgrammerError { .. }
            | ErrorType::InternalError => "The request could not be completed.",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorType::ProgrammerError { error } => write!(f, "Programmer error: {error}"),
            ErrorType::NetworkError => write!(f, "Network error"),
            ErrorType::ServerError { code } => write!(f, "Server error ({code})"),
            ErrorType::ClientError { code } => write!(f, "Client error ({code})"),
            ErrorType::EntitlementDenied { entitlement } => {
                write!(f, "Missing entitlement: {entitlement}")
            }
            ErrorType::InvalidResponse { error } => write!(f, "Invalid response: {error}"),
            ErrorType::OperationAbandoned => {
                write!(f, "Shared operation was abandoned before it settled")
            }
            ErrorType::TooManyInFlight { max } => {
                write!(f, "Max number of operations in flight ({max})")
            }
            ErrorType::FailedValidation { error } => write!(f, "Failed validation: {error}"),
            ErrorType::InternalError => write!(f, "Internal error"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.error_type, self.location)
    }
}

impl std::error::Error for Error {}

#[macro_export]
macro_rules! create_error {
    ( $error: ident $( $tt:tt )? ) => {
        $crate::Error {
            error_type: $crate::ErrorType::$error $( $tt )?,
            location: format!("{}:{}:{}", file!(), line!(), column!()),
        }
    };
}
