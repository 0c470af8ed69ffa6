use core::fmt::{Display, Formatter, Result as FmtResult};
use serde::Deserialize;
use std::sync::Arc;

/// Error code the service uses when single-or-none mode sees more than one row.
pub const MULTIPLE_ROWS_CODE: &str = "PGRST116";

/// Error payload returned by the database service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    /// HTTP status of the response that carried the error.
    #[serde(skip)]
    pub status: u16,

    /// Service or database error code (e.g. `42501`, `PGRST116`).
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub details: Option<String>,

    #[serde(default)]
    pub hint: Option<String>,
}

impl ApiError {
    /// Decode an error body, falling back to the raw text when it isn't the usual JSON shape.
    #[must_use]
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<Self>(body) {
            Ok(mut error) => {
                error.status = status;
                error
            }
            Err(_) => Self {
                status,
                message: String::from_utf8_lossy(body).trim().to_string(),
                ..Self::default()
            },
        }
    }

    /// The error raised when a single-or-none read matches more than one row.
    #[must_use]
    pub fn multiple_rows(count: usize) -> Self {
        Self {
            status: 406,
            code: Some(MULTIPLE_ROWS_CODE.to_string()),
            message: "JSON object requested, multiple (or no) rows returned".to_string(),
            details: Some(format!("The result contains {count} rows")),
            hint: None,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.message.is_empty() {
            write!(f, "request failed with HTTP {}", self.status)?;
        } else {
            write!(f, "{}", self.message)?;
        }

        if let Some(code) = &self.code {
            write!(f, " (code {code})")?;
        }

        Ok(())
    }
}

impl core::error::Error for ApiError {}

/// Failure of a query against the remote source.
#[derive(Debug, Clone)]
pub enum QueryError {
    /// A required identifier was absent, so no remote call was attempted.
    MissingIdentifier(&'static str),

    /// The service answered with an error payload.
    Api(ApiError),

    /// The request could not be sent, or its response could not be decoded.
    Transport(Arc<ohno::AppError>),
}

impl QueryError {
    pub fn transport(error: impl Into<ohno::AppError>) -> Self {
        Self::Transport(Arc::new(error.into()))
    }

    /// Returns `true` for precondition failures raised before any remote call.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingIdentifier(_))
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::MissingIdentifier(name) => write!(f, "missing required identifier: {name}"),
            Self::Api(error) => write!(f, "{error}"),
            Self::Transport(error) => write!(f, "{error}"),
        }
    }
}

impl core::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Api(error) => Some(error),
            Self::MissingIdentifier(_) | Self::Transport(_) => None,
        }
    }
}

impl From<ApiError> for QueryError {
    fn from(error: ApiError) -> Self {
        Self::Api(error)
    }
}
