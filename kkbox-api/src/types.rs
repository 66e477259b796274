//! Small value types shared across the client.

use std::fmt;

/// API host prefix; requests go to `https://api-{host}.kkbox.com.tw/{path}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Host {
    /// `login.php`, `check.php`.
    Login,
    /// Catalog endpoints and `active_sid.php`.
    Ds,
    /// `v1/ticket`; the only host that takes a JSON body.
    Ticket,
}

impl Host {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Ds => "ds",
            Self::Ticket => "ticket",
        }
    }

    pub fn url(self, path: &str) -> String {
        format!("https://api-{}.kkbox.com.tw/{path}", self.as_str())
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio quality tier an account may be entitled to.
///
/// | Variant | Wire name |
/// |---------|-----------|
/// | `K128`  | `128k`    |
/// | `K192`  | `192k`    |
/// | `K320`  | `320k`    |
/// | `Hifi`  | `hifi`    |
/// | `Hires` | `hires`   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    K128,
    K192,
    K320,
    Hifi,
    Hires,
}

impl Quality {
    /// Tiers every active account has.
    pub const BASE: [Self; 3] = [Self::K128, Self::K192, Self::K320];
    /// Tiers appended when the server sets `high_quality`.
    pub const HIGH: [Self; 2] = [Self::Hifi, Self::Hires];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::K128 => "128k",
            Self::K192 => "192k",
            Self::K320 => "320k",
            Self::Hifi => "hifi",
            Self::Hires => "hires",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback URIs for one song, valid only briefly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub uris: Vec<String>,
}

/// Outcome of a media download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadReport {
    /// Decrypted bytes written to the sink.
    pub bytes_written: u64,
    /// `Content-Length` of the ranged response, if the server sent one.
    pub expected_len: Option<u64>,
}
