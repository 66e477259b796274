//! Playback ticket acquisition.
//!
//! Endpoint: `POST api-ticket/v1/ticket` with a JSON body that repeats the
//! protocol constants inline:
//!
//! ```json
//! { "sid": "...", "song_id": "...", "ver": "06120082", "os": "android",
//!   "osver": "13", "kkid": "...", "dist": "0021", "dist2": "0021",
//!   "timestamp": 1700000000, "play_mode": null }
//! ```
//!
//! The response `status` drives a small recovery loop:
//!
//! | Status | Meaning              | Action                              |
//! |--------|----------------------|-------------------------------------|
//! | `1`    | ok                   | return `uris`                       |
//! | `-1`   | session stale        | [`renew`](KkboxClient::renew), retry |
//! | `-4`   | device binding stale | [`auth_device`](KkboxClient::auth_device), retry |
//! | `2`    | server busy          | sleep `busy_delay`, retry           |
//! | other  |                      | fail                                |
//!
//! Retries are unbounded unless [`TicketPolicy::max_attempts`] is set.
//!
//! [`TicketPolicy::max_attempts`]: crate::config::TicketPolicy::max_attempts

use crate::client::{KkboxClient, status_of};
use crate::error::{KkboxError, Result};
use crate::signing::{self, Params};
use crate::transport::Transport;
use crate::types::{Host, Ticket};
use serde_json::{Value, json};
use std::thread;
use tracing::{debug, warn};

/// What to do after one ticket response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Done,
    RenewSession,
    AuthDevice,
    WaitAndRetry,
    Fail,
}

impl Next {
    fn from_status(status: i64) -> Self {
        match status {
            1 => Self::Done,
            -1 => Self::RenewSession,
            -4 => Self::AuthDevice,
            2 => Self::WaitAndRetry,
            _ => Self::Fail,
        }
    }
}

impl<T: Transport> KkboxClient<T> {
    /// Get playback URIs for a song.
    ///
    /// Stale sessions and device bindings are repaired transparently; the
    /// caller only sees terminal failures.
    ///
    /// # Errors
    ///
    /// - [`KkboxError::TicketAcquisition`]: unrecoverable status
    /// - [`KkboxError::TicketRetriesExhausted`]: attempt cap reached
    /// - [`KkboxError::Auth`]: renewal or device auth failed during recovery
    pub fn ticket(&self, song_id: &str, play_mode: Option<&str>) -> Result<Ticket> {
        let policy = self.ticket_policy;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let resp = self.request_ticket(song_id, play_mode)?;
            let status = status_of(&resp)?;
            let next = Next::from_status(status);
            debug!(song_id, status, attempts, ?next, "ticket response");

            match next {
                Next::Done => return parse_uris(&resp),
                Next::Fail => return Err(KkboxError::TicketAcquisition { status }),
                _ if policy.max_attempts.is_some_and(|max| attempts >= max) => {
                    return Err(KkboxError::TicketRetriesExhausted { attempts });
                }
                Next::RenewSession => {
                    warn!(song_id, "ticket: session stale, renewing");
                    self.renew()?;
                }
                Next::AuthDevice => {
                    warn!(song_id, "ticket: device binding stale, re-authorizing");
                    self.auth_device()?;
                }
                Next::WaitAndRetry => {
                    warn!(song_id, delay = ?policy.busy_delay, "ticket: server busy, retrying");
                    thread::sleep(policy.busy_delay);
                }
            }
        }
    }

    fn request_ticket(&self, song_id: &str, play_mode: Option<&str>) -> Result<Value> {
        let sid = self.session_id().ok_or(KkboxError::NotLoggedIn)?;
        let payload = json!({
            "sid": sid,
            "song_id": song_id,
            "ver": signing::VERSION,
            "os": signing::OS,
            "osver": signing::OS_VERSION,
            "kkid": self.kkid(),
            "dist": signing::DIST,
            "dist2": signing::DIST,
            "timestamp": signing::unix_timestamp(),
            "play_mode": play_mode,
        });
        self.call_json_as(&sid, Host::Ticket, "v1/ticket", Params::new(), Some(&payload))
    }
}

fn parse_uris(resp: &Value) -> Result<Ticket> {
    let uris = resp["uris"]
        .as_array()
        .ok_or_else(|| KkboxError::Protocol("ticket response has no uris".into()))?
        .iter()
        .map(|u| {
            u.as_str()
                .map(String::from)
                .ok_or_else(|| KkboxError::Protocol("ticket uri is not a string".into()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Ticket { uris })
}
