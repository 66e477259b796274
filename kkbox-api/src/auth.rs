//! Session state machine: login, renewal, device authorization.
//!
//! ```text
//! Unauthenticated --login--> Authenticated --renew--> Authenticated
//!                                          --auth_device--> (same session)
//! ```
//!
//! # Endpoints
//!
//! ## `login`: `POST api-login/login.php` (form)
//!
//! Request: `{ uid, passwd: md5(password), kkid, registration_id: "" }`
//!
//! ## `renew`: `GET api-login/check.php`
//!
//! Both answer with:
//! ```json
//! { "status": 2, "sid": "...", "lic_content_key": "...", "high_quality": true }
//! ```
//!
//! `status` 2 (active) and 3 (trial) apply the session. Anything else is
//! terminal.
//!
//! ## `auth_device`: `POST api-ds/active_sid.php` (form)
//!
//! Rebinds the device to the current session. Success is `status` 1.

use crate::client::{KkboxClient, empty_body, status_of};
use crate::error::{AuthError, KkboxError, Result};
use crate::signing::{self, Params};
use crate::transport::Transport;
use crate::types::{Host, Quality};
use serde_json::{Value, json};
use tracing::info;

/// An authenticated session, replaced wholesale by every login or renewal.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
    content_key: Vec<u8>,
    qualities: Vec<Quality>,
}

impl Session {
    /// Build a session from a successful login/renewal response.
    ///
    /// Pure: the same response always yields the same session.
    pub fn from_response(resp: &Value) -> Result<Self> {
        let id = resp["sid"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| KkboxError::Protocol("session response has no sid".into()))?;
        let content_key = resp["lic_content_key"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                KkboxError::Protocol("session response has no lic_content_key".into())
            })?;

        let mut qualities = Quality::BASE.to_vec();
        if is_truthy(&resp["high_quality"]) {
            qualities.extend(Quality::HIGH);
        }

        Ok(Self {
            id: id.to_owned(),
            content_key: content_key.as_bytes().to_vec(),
            qualities,
        })
    }

    /// The `sid` attached to every subsequent request.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Key material for [`MediaCipher`](crate::cipher::MediaCipher).
    pub fn content_key(&self) -> &[u8] {
        &self.content_key
    }

    /// Entitled tiers: always `128k, 192k, 320k`, then `hifi, hires` for
    /// high-quality accounts.
    pub fn qualities(&self) -> &[Quality] {
        &self.qualities
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("qualities", &self.qualities)
            .finish_non_exhaustive()
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        _ => false,
    }
}

fn login_error(status: i64) -> AuthError {
    match status {
        -1 => AuthError::AccountNotFound,
        -2 => AuthError::InvalidCredentials,
        -4 => AuthError::RegionBlocked,
        1 => AuthError::AccountExpired,
        other => AuthError::LoginFailed(other),
    }
}

fn is_active(status: i64) -> bool {
    matches!(status, 2 | 3)
}

impl<T: Transport> KkboxClient<T> {
    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// - [`KkboxError::Auth`]: see [`AuthError`] for the status mapping
    /// - [`KkboxError::Protocol`]: response missing `status`, `sid` or key
    pub fn login(&self, email: &str, password: &str) -> Result<()> {
        let payload = json!({
            "uid": email,
            "passwd": signing::md5_hex(password),
            "kkid": self.kkid(),
            "registration_id": "",
        });
        let resp = self
            .send_signed(
                self.session_id().as_deref(),
                Host::Login,
                "login.php",
                Params::new(),
                Some(&payload),
            )?
            .ok_or_else(|| empty_body(Host::Login, "login.php"))?;

        let status = status_of(&resp)?;
        if !is_active(status) {
            return Err(login_error(status).into());
        }
        self.apply_session(&resp)?;
        info!(status, "logged in");
        Ok(())
    }

    /// Re-validate the current session; the caller must log in again on
    /// failure.
    pub fn renew(&self) -> Result<()> {
        let resp = self.call_json(Host::Login, "check.php", Params::new(), None)?;
        let status = status_of(&resp)?;
        if !is_active(status) {
            return Err(AuthError::SessionRenewalFailed(status).into());
        }
        self.apply_session(&resp)?;
        info!("session renewed");
        Ok(())
    }

    /// Replace the current session with the one described by `resp`.
    ///
    /// The previous session is left untouched if `resp` is malformed.
    pub fn apply_session(&self, resp: &Value) -> Result<()> {
        let session = Session::from_response(resp)?;
        info!(qualities = ?session.qualities(), "session applied");
        *self.session.write() = Some(session);
        Ok(())
    }

    /// Re-activate this device's binding to the current session.
    pub fn auth_device(&self) -> Result<()> {
        let sid = self.session_id().ok_or(KkboxError::NotLoggedIn)?;
        let payload = json!({
            "ui_lang": signing::LANG,
            "of": signing::OUTPUT_FORMAT,
            "os": signing::OS,
            "enc": signing::ENCODING,
            "sid": sid,
            "ver": signing::VERSION,
            "kkid": self.kkid(),
            "lang": signing::LANG,
            "oenc": signing::OUTPUT_ENCODING,
            "osver": signing::OS_VERSION,
        });
        let resp =
            self.call_json_as(&sid, Host::Ds, "active_sid.php", Params::new(), Some(&payload))?;
        let status = status_of(&resp)?;
        if status != 1 {
            return Err(AuthError::DeviceAuthFailed(status).into());
        }
        info!("device authorized");
        Ok(())
    }

    /// Quality tiers of the current session, empty before login.
    pub fn available_qualities(&self) -> Vec<Quality> {
        self.session
            .read()
            .as_ref()
            .map(|s| s.qualities().to_vec())
            .unwrap_or_default()
    }
}
