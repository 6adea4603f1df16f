//! Errors returned by the AWS control planes.
//!
//! Every SDK error is collapsed into an [`ApiError`] carrying the vendor error
//! code and message. Resources classify failures by code, never by Rust type,
//! so the same checks work against the SDK clients and the in-memory fakes.
use aws_sdk_route53resolver::error::ProvideErrorMetadata;
use aws_smithy_runtime_api::client::result::SdkError;
use snafu::{prelude::*, IntoError};

pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
pub const CONFLICT: &str = "ConflictException";
pub const INVALID_REQUEST: &str = "InvalidRequestException";
pub const LIMIT_EXCEEDED: &str = "LimitExceededException";

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn code_prefix(code: &Option<String>) -> String {
    match code {
        Some(code) => format!("{code}: "),
        None => String::new(),
    }
}

/// An error reported by (or on the way to) a vendor API.
#[derive(Debug, Snafu)]
pub enum ApiError {
    /// The service answered with an error code.
    #[snafu(display("{code}: {message}"))]
    Vendor { code: String, message: String },

    /// The SDK failed, with the vendor code when the service sent one.
    #[snafu(display("{}{message}", code_prefix(code)))]
    Sdk {
        code: Option<String>,
        message: String,
        source: BoxError,
    },
}

/// Formats an error and its full source chain into a single string.
///
/// SDK errors often hide the useful part (eg "connection refused") a few
/// levels down the chain.
fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

impl ApiError {
    /// Creates an error with the given vendor code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        VendorSnafu {
            code: code.into(),
            message: message.into(),
        }
        .build()
    }

    /// A vendor "not found" error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RESOURCE_NOT_FOUND, message)
    }

    /// Converts an SDK error, keeping the vendor code and message.
    pub fn from_sdk<E, R>(err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug + Send + Sync + 'static,
    {
        let code = err.code().map(str::to_owned);
        let message = match err.message() {
            Some(message) => message.to_owned(),
            None => format_err_chain(&err),
        };
        SdkSnafu { code, message }.into_error(Box::new(err))
    }

    /// Converts an error raised while building a request.
    pub fn from_build(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        SdkSnafu {
            code: None,
            message: format_err_chain(&err),
        }
        .into_error(Box::new(err))
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Vendor { code, .. } => Some(code),
            ApiError::Sdk { code, .. } => code.as_deref(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Vendor { message, .. } | ApiError::Sdk { message, .. } => message,
        }
    }

    /// Returns `true` if the vendor error code equals `code`.
    pub fn is_a(&self, code: &str) -> bool {
        self.code() == Some(code)
    }

    /// Returns `true` if the vendor code equals `code` and the message
    /// contains `needle`, ignoring ASCII case.
    pub fn is_a_message_contains(&self, code: &str, needle: &str) -> bool {
        self.is_a(code)
            && self
                .message()
                .to_ascii_lowercase()
                .contains(&needle.to_ascii_lowercase())
    }

    pub fn is_not_found(&self) -> bool {
        self.is_a(RESOURCE_NOT_FOUND)
    }
}

/// Maps a vendor not-found error to `Ok(None)`.
pub fn not_found_as_none<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(t) => Ok(Some(t)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Maps a vendor not-found error to `Ok(())`.
///
/// Used by deletes, which must succeed when the object is already gone.
pub fn ignore_not_found(result: Result<(), ApiError>) -> Result<(), ApiError> {
    not_found_as_none(result).map(|_| ())
}
