//! Client construction parameters.
//!
//! Nothing here is read from or written to disk; callers assemble a
//! [`ClientConfig`] from whatever source they like (the CLI uses flags and
//! environment variables).

use crate::error::{KkboxError, Result};
use rand::Rng;
use std::time::Duration;

/// Default HTTP timeout for API and media requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay before re-requesting a ticket after status `2`.
pub const DEFAULT_BUSY_DELAY: Duration = Duration::from_millis(500);

/// Static secrets shipped with the official app.
///
/// Both are 32 lowercase hex characters. The ASCII text itself is the key
/// material: the `kc1` key seeds the envelope cipher and the secret key is
/// hashed into every request signature.
#[derive(Clone)]
pub struct StaticCredentials {
    transport_key: String,
    signing_key: String,
}

impl StaticCredentials {
    pub fn new(transport_key: &str, signing_key: &str) -> Result<Self> {
        if !is_key(transport_key) {
            return Err(KkboxError::Configuration(
                "kc1_key must be 32 lowercase hex characters".into(),
            ));
        }
        if !is_key(signing_key) {
            return Err(KkboxError::Configuration(
                "secret_key must be 32 lowercase hex characters".into(),
            ));
        }
        Ok(Self {
            transport_key: transport_key.to_owned(),
            signing_key: signing_key.to_owned(),
        })
    }

    pub fn transport_key(&self) -> &[u8] {
        self.transport_key.as_bytes()
    }

    pub fn signing_key(&self) -> &[u8] {
        self.signing_key.as_bytes()
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticCredentials { .. }")
    }
}

fn is_key(s: &str) -> bool {
    s.len() == 32 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// The `kkid` device identifier, fixed for the lifetime of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// 128 random bits rendered as 32 uppercase hex digits.
    pub fn random() -> Self {
        let id: u128 = rand::rng().random();
        Self(format!("{id:032X}"))
    }

    pub fn new(kkid: impl Into<String>) -> Result<Self> {
        let kkid = kkid.into();
        if kkid.is_empty() {
            return Err(KkboxError::Configuration("kkid must not be empty".into()));
        }
        Ok(Self(kkid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Retry behavior of the ticket protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketPolicy {
    /// Maximum ticket requests per acquisition; `None` retries until the
    /// server returns a terminal status.
    pub max_attempts: Option<u32>,
    /// Sleep before retrying after a "busy" (`2`) status.
    pub busy_delay: Duration,
}

impl Default for TicketPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            busy_delay: DEFAULT_BUSY_DELAY,
        }
    }
}

/// Everything needed to construct a [`KkboxClient`](crate::KkboxClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub kc1_key: String,
    pub secret_key: String,
    /// Device id; random when `None`.
    pub kkid: Option<String>,
    /// Proxy URL applied to every scheme.
    pub proxy: Option<String>,
    pub timeout: Duration,
    pub ticket: TicketPolicy,
}

impl ClientConfig {
    pub fn new(kc1_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            kc1_key: kc1_key.into(),
            secret_key: secret_key.into(),
            kkid: None,
            proxy: None,
            timeout: DEFAULT_TIMEOUT,
            ticket: TicketPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_kkid(mut self, kkid: impl Into<String>) -> Self {
        self.kkid = Some(kkid.into());
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_ticket_policy(mut self, policy: TicketPolicy) -> Self {
        self.ticket = policy;
        self
    }

    pub(crate) fn credentials(&self) -> Result<StaticCredentials> {
        StaticCredentials::new(&self.kc1_key, &self.secret_key)
    }

    pub(crate) fn identity(&self) -> Result<ClientIdentity> {
        match &self.kkid {
            Some(kkid) => ClientIdentity::new(kkid.clone()),
            None => Ok(ClientIdentity::random()),
        }
    }
}
