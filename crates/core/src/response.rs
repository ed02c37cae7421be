use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Machine-readable failure category carried by [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The remote renderer failed or was unreachable.
    RenderingFailed,
    /// The object store rejected or failed a write.
    StorageFailure,
    /// A storage key could not be derived from a reference.
    InvalidReference,
    /// A stored object does not exist.
    NotFound,
    /// Writing document metadata failed.
    PersistenceFailure,
    /// No visible document has the requested identifier.
    DocumentNotFound,
    /// The caller supplied invalid input.
    ValidationFailed,
    /// The request deadline elapsed before the operation finished.
    DeadlineExceeded,
}

/// Structured error detail of a failed [`ApiResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message. Never contains internal error detail.
    pub message: String,
    /// Failure category, when one applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    /// Per-field validation messages.
    #[serde(default)]
    pub validation_errors: Vec<String>,
    /// Reference of a stored object left without a metadata row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orphaned_reference: Option<String>,
    /// When the error was produced.
    pub timestamp: DateTime<Utc>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            validation_errors: Vec::new(),
            orphaned_reference: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_validation_errors(mut self, errors: Vec<String>) -> Self {
        self.validation_errors = errors;
        self
    }

    #[must_use]
    pub fn with_orphaned_reference(mut self, reference: impl Into<String>) -> Self {
        self.orphaned_reference = Some(reference.into());
        self
    }
}

/// Uniform outcome of every fallible operation.
///
/// Exactly one of payload or error exists, and which one is encoded in the
/// variant. Components pass envelopes to each other unchanged; only the
/// transport boundary turns one into a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    Success { data: T, status_code: u16 },
    Failure { error: ApiError, status_code: u16 },
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::success_with_status(data, 200)
    }

    pub fn success_with_status(data: T, status_code: u16) -> Self {
        Self::Success { data, status_code }
    }

    pub fn created(data: T) -> Self {
        Self::success_with_status(data, 201)
    }

    pub fn failure(message: impl Into<String>, status_code: u16) -> Self {
        Self::Failure {
            error: ApiError::new(message),
            status_code,
        }
    }

    pub fn from_error(error: ApiError, status_code: u16) -> Self {
        Self::Failure { error, status_code }
    }

    pub fn bad_request(message: impl Into<String>, validation_errors: Vec<String>) -> Self {
        Self::from_error(
            ApiError::new(message).with_validation_errors(validation_errors),
            400,
        )
    }

    pub fn unauthorized() -> Self {
        Self::failure("Unauthorized access", 401)
    }

    pub fn forbidden() -> Self {
        Self::failure("Forbidden", 403)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::failure(message, 404)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::failure(message, 500)
    }

    /// Tag a failure with a kind. Successes are returned unchanged.
    #[must_use]
    pub fn with_kind(self, kind: ErrorKind) -> Self {
        match self {
            Self::Failure { error, status_code } => Self::Failure {
                error: error.with_kind(kind),
                status_code,
            },
            success @ Self::Success { .. } => success,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success { status_code, .. } | Self::Failure { status_code, .. } => *status_code,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    /// Failure category, if this is a failure with a kind.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.error().and_then(|e| e.kind)
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// Split into the payload or the error together with its status code.
    pub fn into_result(self) -> Result<T, (ApiError, u16)> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Failure { error, status_code } => Err((error, status_code)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            Self::Success { data, status_code } => ApiResponse::Success {
                data: f(data),
                status_code,
            },
            Self::Failure { error, status_code } => ApiResponse::Failure { error, status_code },
        }
    }
}

impl ApiResponse<()> {
    pub fn ok() -> Self {
        Self::success(())
    }

    pub fn no_content() -> Self {
        Self::success_with_status((), 204)
    }
}

#[derive(Serialize)]
struct Wire<'a, T> {
    success: bool,
    status_code: u16,
    data: Option<&'a T>,
    error: Option<&'a ApiError>,
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Wire {
            success: self.is_success(),
            status_code: self.status_code(),
            data: self.data(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}
