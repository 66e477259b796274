//! Scripted [`Transport`] for unit tests.

use crate::auth::Session;
use crate::cipher::EnvelopeCipher;
use crate::client::KkboxClient;
use crate::config::{ClientConfig, TicketPolicy};
use crate::error::{KkboxError, Result};
use crate::transport::{ApiRequest, MediaStream, Transport};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::io::Cursor;
use std::time::Duration;

pub const TEST_KC1: &str = "0123456789abcdef0123456789abcdef";
pub const TEST_SECRET: &str = "fedcba9876543210fedcba9876543210";
pub const TEST_KKID: &str = "00000000000000000000000000000ABC";

/// Replays canned responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    bodies: Mutex<VecDeque<Vec<u8>>>,
    requests: Mutex<Vec<ApiRequest>>,
    media: Mutex<Option<(u16, Vec<u8>)>>,
    media_requests: Mutex<Vec<(String, u64)>>,
}

impl ScriptedTransport {
    /// Queue a JSON response (encrypted with the test `kc1` key), or an empty
    /// body for `None`.
    pub fn push(&self, resp: Option<Value>) {
        let body = resp.map_or_else(Vec::new, |v| {
            EnvelopeCipher::new(TEST_KC1.as_bytes())
                .unwrap()
                .seal(&v.to_string())
        });
        self.push_raw(body);
    }

    pub fn push_raw(&self, body: Vec<u8>) {
        self.bodies.lock().push_back(body);
    }

    pub fn set_media(&self, status: u16, ciphertext: Vec<u8>) {
        *self.media.lock() = Some((status, ciphertext));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.path.clone()).collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.path == path).count()
    }

    pub fn last_request(&self) -> ApiRequest {
        self.requests.lock().last().cloned().unwrap()
    }

    pub fn media_requests(&self) -> Vec<(String, u64)> {
        self.media_requests.lock().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &ApiRequest) -> Result<Vec<u8>> {
        self.requests.lock().push(request.clone());
        self.bodies
            .lock()
            .pop_front()
            .ok_or_else(|| KkboxError::Protocol(format!("unscripted call to {}", request.path)))
    }

    fn open_media(&self, url: &str, offset: u64) -> Result<MediaStream> {
        self.media_requests.lock().push((url.to_owned(), offset));
        let (status, data) = self.media.lock().clone().unwrap_or((404, Vec::new()));
        if !(200..300).contains(&status) {
            return Err(KkboxError::Download { status });
        }
        Ok(MediaStream {
            content_length: Some(data.len() as u64),
            body: Box::new(Cursor::new(data)),
        })
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new(TEST_KC1, TEST_SECRET)
        .with_kkid(TEST_KKID)
        .with_ticket_policy(TicketPolicy {
            max_attempts: None,
            busy_delay: Duration::ZERO,
        })
}

/// Client with no session and the given responses queued.
pub fn scripted_client(responses: Vec<Option<Value>>) -> KkboxClient<ScriptedTransport> {
    let client = KkboxClient::with_transport(&test_config(), ScriptedTransport::default()).unwrap();
    for resp in responses {
        client.transport().push(resp);
    }
    client
}

pub fn session_response(sid: &str, high_quality: bool) -> Value {
    json!({
        "status": 2,
        "sid": sid,
        "lic_content_key": "00112233445566778899aabbccddeeff0",
        "high_quality": high_quality,
    })
}

/// Client already holding session `S1`, with the given responses queued.
pub fn logged_in_client(responses: Vec<Option<Value>>) -> KkboxClient<ScriptedTransport> {
    let client = scripted_client(responses);
    *client.session.write() = Some(Session::from_response(&session_response("S1", false)).unwrap());
    client
}
