//! Playlist API.
//!
//! Endpoint: `GET api-ds/v1/playlists?playlist_ids=id1,id2`
//!
//! Response:
//! ```json
//! { "status": { "type": "OK" }, "data": { "playlists": [ { ... } ] } }
//! ```

use crate::client::{KkboxClient, ensure_ok, take_field};
use crate::error::Result;
use crate::signing::Params;
use crate::transport::Transport;
use crate::types::Host;
use serde_json::Value;

impl<T: Transport> KkboxClient<T> {
    /// Fetch one or more playlists. Returns `data.playlists`.
    pub fn playlists(&self, ids: &[&str]) -> Result<Value> {
        let mut params = Params::new();
        params.insert("playlist_ids".into(), ids.join(","));
        let mut resp = self.call_json(Host::Ds, "v1/playlists", params, None)?;
        ensure_ok(&resp, "Playlist")?;
        take_field(&mut resp, "/data/playlists")
    }
}

#[cfg(test)]
mod tests {
    use crate::error::KkboxError;
    use crate::testing::logged_in_client;
    use serde_json::json;

    #[test]
    fn playlists_joins_ids() {
        let client = logged_in_client(vec![Some(json!({
            "status": {"type": "OK"},
            "data": {"playlists": []},
        }))]);
        assert_eq!(client.playlists(&["p1", "p2"]).unwrap(), json!([]));
        let req = client.transport().last_request();
        assert_eq!(req.query_value("playlist_ids"), Some("p1,p2"));
    }

    #[test]
    fn missing_playlist() {
        let client = logged_in_client(vec![Some(json!({"status": {"type": "ERROR"}}))]);
        assert!(matches!(
            client.playlists(&["p"]),
            Err(KkboxError::NotFound("Playlist"))
        ));
    }
}
