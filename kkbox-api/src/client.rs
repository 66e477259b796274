//! Signed, envelope-encrypted API calls.
//!
//! Every request goes through the same steps:
//!
//! 1. Merge caller params with the protocol constants and the current `sid`
//! 2. Sign: `secret = md5(ver ‖ timestamp ‖ secret_key)`, attach `timestamp`
//! 3. Send: GET, or POST when a payload is given (JSON body for the ticket
//!    host, form-encoded everywhere else)
//! 4. RC4-decrypt the whole response body with the `kc1` key and parse it as
//!    JSON; an empty body yields `None`
//!
//! Nothing is retried here. Recovery lives in
//! [`ticket`](KkboxClient::ticket).

use crate::auth::Session;
use crate::cipher::EnvelopeCipher;
use crate::config::{ClientConfig, ClientIdentity, StaticCredentials, TicketPolicy};
use crate::error::{KkboxError, Result};
use crate::signing::{self, Params};
use crate::transport::{ApiRequest, Body, HttpTransport, Transport};
use crate::types::Host;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

/// Blocking client for the KKBOX private API.
///
/// Holds the static keys, the device id, and the current [`Session`].
/// API methods are implemented in separate modules (`auth`, `ticket`,
/// `download`, `song`, `album`, `artist`, `playlist`, `search`) as
/// `impl KkboxClient` blocks.
///
/// The client is `Sync` when its transport is: calls read the session under a
/// shared lock, and login/renewal replace it under an exclusive one.
pub struct KkboxClient<T = HttpTransport> {
    transport: T,
    credentials: StaticCredentials,
    identity: ClientIdentity,
    pub(crate) session: RwLock<Option<Session>>,
    pub(crate) ticket_policy: TicketPolicy,
}

impl KkboxClient<HttpTransport> {
    /// Create a client that talks to the real service.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> KkboxClient<T> {
    /// Create a client over an explicit [`Transport`].
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self> {
        Ok(Self {
            transport,
            credentials: config.credentials()?,
            identity: config.identity()?,
            session: RwLock::new(None),
            ticket_policy: config.ticket,
        })
    }

    /// The `kkid` device identifier sent with login, tickets and device auth.
    pub fn kkid(&self) -> &str {
        self.identity.as_str()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// A snapshot of the current session.
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    pub(crate) fn session_id(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.id().to_owned())
    }

    pub(crate) fn require_session(&self) -> Result<Session> {
        self.session().ok_or(KkboxError::NotLoggedIn)
    }

    /// Send a signed call on behalf of a logged-in user.
    ///
    /// `payload` must be a JSON object; `None` or an empty object sends a GET.
    ///
    /// # Errors
    ///
    /// - [`KkboxError::NotLoggedIn`]: no session yet
    /// - [`KkboxError::Transport`]: network failure
    /// - [`KkboxError::Protocol`]: body did not decrypt to JSON
    pub fn call(
        &self,
        host: Host,
        path: &str,
        params: Params,
        payload: Option<&Value>,
    ) -> Result<Option<Value>> {
        let sid = self.session_id().ok_or(KkboxError::NotLoggedIn)?;
        self.send_signed(Some(&sid), host, path, params, payload)
    }

    /// Like [`call`](Self::call) but treats an empty body as a protocol error.
    pub(crate) fn call_json(
        &self,
        host: Host,
        path: &str,
        params: Params,
        payload: Option<&Value>,
    ) -> Result<Value> {
        let sid = self.session_id().ok_or(KkboxError::NotLoggedIn)?;
        self.call_json_as(&sid, host, path, params, payload)
    }

    /// [`call_json`](Self::call_json) pinned to a session id the caller has
    /// already read, for payloads that repeat the `sid` in their body.
    pub(crate) fn call_json_as(
        &self,
        sid: &str,
        host: Host,
        path: &str,
        params: Params,
        payload: Option<&Value>,
    ) -> Result<Value> {
        self.send_signed(Some(sid), host, path, params, payload)?
            .ok_or_else(|| empty_body(host, path))
    }

    /// Sign and send as `sid`, which `login` may leave out.
    pub(crate) fn send_signed(
        &self,
        sid: Option<&str>,
        host: Host,
        path: &str,
        params: Params,
        payload: Option<&Value>,
    ) -> Result<Option<Value>> {
        let query = signing::signed_params(
            params,
            sid,
            signing::unix_timestamp(),
            self.credentials.signing_key(),
        );
        let request = ApiRequest {
            host,
            path: path.to_owned(),
            query: query.into_iter().collect(),
            body: encode_body(host, payload)?,
        };

        debug!(%host, path, post = request.body.is_some(), "signed call");
        let raw = self.transport.execute(&request)?;
        if raw.is_empty() {
            return Ok(None);
        }

        let text = EnvelopeCipher::new(self.credentials.transport_key())?.open(&raw)?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| KkboxError::Protocol(format!("{host}/{path}: {e}")))
    }
}

pub(crate) fn empty_body(host: Host, path: &str) -> KkboxError {
    KkboxError::Protocol(format!("{host}/{path}: empty response"))
}

/// Read the integer `status` field carried by auth and ticket responses.
pub(crate) fn status_of(resp: &Value) -> Result<i64> {
    resp["status"]
        .as_i64()
        .ok_or_else(|| KkboxError::Protocol("response has no integer status".into()))
}

/// Catalog responses report success as `status.type == "OK"`.
pub(crate) fn ensure_ok(resp: &Value, what: &'static str) -> Result<()> {
    if resp["status"]["type"] == "OK" {
        Ok(())
    } else {
        Err(KkboxError::NotFound(what))
    }
}

/// Move the value at JSON `pointer` out of `resp`.
pub(crate) fn take_field(resp: &mut Value, pointer: &str) -> Result<Value> {
    resp.pointer_mut(pointer)
        .map(Value::take)
        .ok_or_else(|| KkboxError::Protocol(format!("response has no {pointer}")))
}

fn encode_body(host: Host, payload: Option<&Value>) -> Result<Option<Body>> {
    let Some(payload) = payload else {
        return Ok(None);
    };
    if payload.as_object().is_some_and(serde_json::Map::is_empty) || payload.is_null() {
        return Ok(None);
    }
    if host == Host::Ticket {
        let text = serde_json::to_string(payload)
            .map_err(|e| KkboxError::Protocol(format!("unencodable payload: {e}")))?;
        return Ok(Some(Body::Json(text)));
    }
    let fields = payload
        .as_object()
        .ok_or_else(|| KkboxError::Protocol("form payload must be a JSON object".into()))?
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), v)
        })
        .collect();
    Ok(Some(Body::Form(fields)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::{VERSION, signature};
    use crate::testing::{TEST_SECRET, logged_in_client, scripted_client};
    use serde_json::json;

    #[test]
    fn client_is_shareable_across_threads() {
        fn assert_send_sync<C: Send + Sync>() {}
        assert_send_sync::<KkboxClient>();
    }

    #[test]
    fn call_before_login_is_rejected() {
        let client = scripted_client(vec![Some(json!({"status": {"type": "OK"}}))]);
        let err = client
            .call(Host::Ds, "v1/album/1", Params::new(), None)
            .unwrap_err();
        assert!(matches!(err, KkboxError::NotLoggedIn));
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn call_signs_and_decrypts() {
        let client = logged_in_client(vec![Some(json!({"hello": "world"}))]);
        let mut params = Params::new();
        params.insert("album".into(), "7".into());

        let resp = client
            .call(Host::Ds, "album_more.php", params, None)
            .unwrap();
        assert_eq!(resp, Some(json!({"hello": "world"})));

        let req = client.transport().last_request();
        assert_eq!(req.url(), "https://api-ds.kkbox.com.tw/album_more.php");
        assert_eq!(req.body, None);
        assert_eq!(req.query_value("album"), Some("7"));
        assert_eq!(req.query_value("sid"), Some("S1"));
        assert_eq!(req.query_value("oenc"), Some("kc1"));

        let ts: u64 = req.query_value("timestamp").unwrap().parse().unwrap();
        assert_eq!(
            req.query_value("secret"),
            Some(signature(VERSION, ts, TEST_SECRET.as_bytes()).as_str())
        );
    }

    #[test]
    fn empty_body_is_absent_result() {
        let client = logged_in_client(vec![None]);
        let resp = client.call(Host::Ds, "x", Params::new(), None).unwrap();
        assert_eq!(resp, None);
    }

    #[test]
    fn garbage_body_is_protocol_error() {
        let client = logged_in_client(vec![]);
        client.transport().push_raw(b"\x00\x01\x02not json".to_vec());
        let err = client.call(Host::Ds, "x", Params::new(), None).unwrap_err();
        assert!(matches!(err, KkboxError::Protocol(_)));
    }

    #[test]
    fn ticket_payload_is_json_other_payloads_are_form() {
        let payload = json!({"a": "1", "b": 2, "c": null});

        let Some(Body::Json(text)) = encode_body(Host::Ticket, Some(&payload)).unwrap() else {
            panic!("ticket body should be JSON");
        };
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, payload);

        let Some(Body::Form(fields)) = encode_body(Host::Ds, Some(&payload)).unwrap() else {
            panic!("ds body should be a form");
        };
        assert_eq!(
            fields,
            vec![("a".to_owned(), "1".to_owned()), ("b".to_owned(), "2".to_owned())]
        );
    }

    #[test]
    fn empty_payload_means_get() {
        assert_eq!(encode_body(Host::Ds, Some(&json!({}))).unwrap(), None);
        assert_eq!(encode_body(Host::Ticket, None).unwrap(), None);
    }

    #[test]
    fn catalog_status_and_field_extraction() {
        let mut resp = json!({"status": {"type": "OK"}, "data": {"songs": [1, 2]}});
        ensure_ok(&resp, "Track").unwrap();
        assert_eq!(take_field(&mut resp, "/data/songs").unwrap(), json!([1, 2]));
        assert!(matches!(
            take_field(&mut resp, "/data/albums"),
            Err(KkboxError::Protocol(_))
        ));
        assert!(matches!(
            ensure_ok(&json!({"status": {"type": "ERROR"}}), "Album"),
            Err(KkboxError::NotFound("Album"))
        ));
    }

    #[test]
    fn status_field_is_required() {
        assert_eq!(status_of(&json!({"status": -4})).unwrap(), -4);
        assert!(matches!(
            status_of(&json!({"sid": "x"})),
            Err(KkboxError::Protocol(_))
        ));
    }
}
