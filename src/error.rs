use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenancyErrorCode {
    Encode,
    Decode,
    Format,
    TenantAlreadyExists,
    TenantNotFound,
    VersionTooOld,
    Conflict,
    InvalidConfig,
    Validation,
    Signing,
}

impl TenancyErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            TenancyErrorCode::Encode => "encode",
            TenancyErrorCode::Decode => "decode",
            TenancyErrorCode::Format => "format",
            TenancyErrorCode::TenantAlreadyExists => "tenant_already_exists",
            TenancyErrorCode::TenantNotFound => "tenant_not_found",
            TenancyErrorCode::VersionTooOld => "version_too_old",
            TenancyErrorCode::Conflict => "conflict",
            TenancyErrorCode::InvalidConfig => "invalid_config",
            TenancyErrorCode::Validation => "validation",
            TenancyErrorCode::Signing => "signing",
        }
    }
}

#[derive(Debug, Error)]
pub enum TenancyError {
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("malformed tenant record: {0}")]
    Format(String),
    #[error("tenant '{name}' already exists")]
    TenantAlreadyExists { name: String },
    #[error("tenant '{name}' not found")]
    TenantNotFound { name: String },
    #[error(
        "requested version {requested} has been garbage collected (oldest readable version: {oldest_readable})"
    )]
    VersionTooOld {
        requested: u64,
        oldest_readable: u64,
    },
    #[error("commit conflict: {0}")]
    Conflict(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl TenancyError {
    pub fn code(&self) -> TenancyErrorCode {
        match self {
            TenancyError::Encode(_) => TenancyErrorCode::Encode,
            TenancyError::Decode(_) => TenancyErrorCode::Decode,
            TenancyError::Format(_) => TenancyErrorCode::Format,
            TenancyError::TenantAlreadyExists { .. } => TenancyErrorCode::TenantAlreadyExists,
            TenancyError::TenantNotFound { .. } => TenancyErrorCode::TenantNotFound,
            TenancyError::VersionTooOld { .. } => TenancyErrorCode::VersionTooOld,
            TenancyError::Conflict(_) => TenancyErrorCode::Conflict,
            TenancyError::InvalidConfig(_) => TenancyErrorCode::InvalidConfig,
            TenancyError::Validation(_) => TenancyErrorCode::Validation,
            TenancyError::Signing(_) => TenancyErrorCode::Signing,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }
}
