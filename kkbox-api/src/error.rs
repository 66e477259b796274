//! Error types for the KKBOX API client.

use thiserror::Error;

/// Errors that can occur when interacting with the KKBOX API.
#[derive(Debug, Error)]
pub enum KkboxError {
    /// Static keys or device id rejected at construction.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Login, session renewal, or device authorization was refused.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// HTTP transport error (connection refused, timeout, TLS failure, etc.).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response envelope could not be decrypted into JSON, or lacked a
    /// field every response of its kind carries.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// The ticket host answered with a status that has no recovery rule.
    #[error("couldn't get track URLs (status {status})")]
    TicketAcquisition {
        /// Status code returned by `api-ticket`.
        status: i64,
    },

    /// The configured ticket attempt cap was reached before a terminal status.
    #[error("ticket request still unresolved after {attempts} attempts")]
    TicketRetriesExhausted {
        /// Number of ticket requests issued.
        attempts: u32,
    },

    /// The edge server answered the media request with a non-2xx status.
    #[error("media download failed with HTTP {status}")]
    Download {
        /// HTTP status code.
        status: u16,
    },

    /// A metadata lookup returned a non-`OK` status.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An authenticated call was attempted before `login`.
    #[error("not logged in")]
    NotLoggedIn,

    /// Writing decrypted media to the sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sub-reasons for [`KkboxError::Auth`].
///
/// | Status | Endpoint        | Variant               |
/// |--------|-----------------|-----------------------|
/// | `-1`   | `login.php`     | `AccountNotFound`     |
/// | `-2`   | `login.php`     | `InvalidCredentials`  |
/// | `-4`   | `login.php`     | `RegionBlocked`       |
/// | `1`    | `login.php`     | `AccountExpired`      |
/// | other  | `login.php`     | `LoginFailed`         |
/// | ≠ 2, 3 | `check.php`     | `SessionRenewalFailed`|
/// | ≠ 1    | `active_sid.php`| `DeviceAuthFailed`    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("email not found")]
    AccountNotFound,
    #[error("incorrect password")]
    InvalidCredentials,
    #[error("IP address is in an unsupported region")]
    RegionBlocked,
    #[error("account expired")]
    AccountExpired,
    #[error("login failed, status code {0}")]
    LoginFailed(i64),
    #[error("session renewal failed, status code {0}")]
    SessionRenewalFailed(i64),
    #[error("couldn't auth device, status code {0}")]
    DeviceAuthFailed(i64),
}

/// Convenience alias for `Result<T, KkboxError>`.
pub type Result<T> = std::result::Result<T, KkboxError>;
