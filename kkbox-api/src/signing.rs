//! Fixed protocol parameters and the per-call request signature.
//!
//! Every request carries the constants below plus:
//!
//! - `timestamp`: current Unix time in seconds
//! - `secret`: `hex(md5(VERSION ‖ timestamp ‖ secret_key))`
//! - `sid`: once a session exists
//!
//! The wire format is fixed to what Android app 06.12.0082 sends.

use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

pub const VERSION: &str = "06120082";
pub const OS: &str = "android";
pub const OS_VERSION: &str = "13";
pub const LANG: &str = "en";
pub const DIST: &str = "0021";
pub const RESOLUTION: &str = "411x841";
pub const OUTPUT_FORMAT: &str = "j";
pub const OUTPUT_ENCODING: &str = "kc1";
pub const ENCODING: &str = "u";

/// Query parameters, keyed by name.
pub type Params = BTreeMap<String, String>;

/// Protocol constants sent with every call.
pub fn protocol_params() -> [(&'static str, &'static str); 11] {
    [
        ("enc", ENCODING),
        ("ver", VERSION),
        ("os", OS),
        ("osver", OS_VERSION),
        ("lang", LANG),
        ("ui_lang", LANG),
        ("dist", DIST),
        ("dist2", DIST),
        ("resolution", RESOLUTION),
        ("of", OUTPUT_FORMAT),
        ("oenc", OUTPUT_ENCODING),
    ]
}

/// Lowercase hex MD5 of `version ‖ timestamp ‖ signing_key`.
pub fn signature(version: &str, timestamp: u64, signing_key: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(version.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(signing_key);
    hex::encode(hasher.finalize())
}

/// Lowercase hex MD5 of a UTF-8 string (login `passwd`).
pub fn md5_hex(text: &str) -> String {
    hex::encode(Md5::digest(text.as_bytes()))
}

pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Merge caller params with the protocol constants, session id, and a fresh
/// signature. Protocol values win over caller values of the same name.
pub fn signed_params(
    caller: Params,
    sid: Option<&str>,
    timestamp: u64,
    signing_key: &[u8],
) -> Params {
    let mut params = caller;
    for (k, v) in protocol_params() {
        params.insert(k.to_owned(), v.to_owned());
    }
    if let Some(sid) = sid {
        params.insert("sid".to_owned(), sid.to_owned());
    }
    params.insert(
        "secret".to_owned(),
        signature(VERSION, timestamp, signing_key),
    );
    params.insert("timestamp".to_owned(), timestamp.to_string());
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn signature_matches_manual_md5() {
        let expected = md5_hex(&format!(
            "{VERSION}1700000000{}",
            std::str::from_utf8(KEY).unwrap()
        ));
        assert_eq!(signature(VERSION, 1_700_000_000, KEY), expected);
    }

    #[test]
    fn signature_is_deterministic_and_lowercase() {
        let a = signature(VERSION, 1_700_000_000, KEY);
        assert_eq!(a, signature(VERSION, 1_700_000_000, KEY));
        assert_eq!(a.len(), 32);
        assert!(a.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn signature_depends_on_every_input() {
        let base = signature(VERSION, 1_700_000_000, KEY);
        assert_ne!(base, signature("06120083", 1_700_000_000, KEY));
        assert_ne!(base, signature(VERSION, 1_700_000_001, KEY));
        assert_ne!(
            base,
            signature(VERSION, 1_700_000_000, b"fedcba9876543210fedcba9876543210")
        );
    }

    #[test]
    fn md5_of_known_string() {
        assert_eq!(md5_hex("password"), "5f4dcc3b5aa765d61d8327deb882cf99");
    }

    #[test]
    fn signed_params_layout() {
        let mut caller = Params::new();
        caller.insert("album".into(), "42".into());
        caller.insert("ver".into(), "bogus".into());

        let params = signed_params(caller, Some("S1"), 1_700_000_000, KEY);
        assert_eq!(params["album"], "42");
        assert_eq!(params["ver"], VERSION);
        assert_eq!(params["oenc"], "kc1");
        assert_eq!(params["sid"], "S1");
        assert_eq!(params["timestamp"], "1700000000");
        assert_eq!(params["secret"], signature(VERSION, 1_700_000_000, KEY));
    }

    #[test]
    fn signed_params_without_session() {
        let params = signed_params(Params::new(), None, 1, KEY);
        assert!(!params.contains_key("sid"));
        assert_eq!(params.len(), protocol_params().len() + 2);
    }
}
