//! Album API.
//!
//! - `album`: `GET api-ds/v1/album/{id}`, returns `data`
//! - `album_more`: `GET api-ds/album_more.php?album={raw_id}`, returned as-is
//!
//! `raw_id` is the numeric album id found in `album_more_url`, distinct from
//! the encrypted id used by the `v1` endpoint.

use crate::client::{KkboxClient, ensure_ok, take_field};
use crate::error::Result;
use crate::signing::Params;
use crate::transport::Transport;
use crate::types::Host;
use serde_json::Value;

impl<T: Transport> KkboxClient<T> {
    pub fn album(&self, id: &str) -> Result<Value> {
        let mut resp = self.call_json(Host::Ds, &format!("v1/album/{id}"), Params::new(), None)?;
        ensure_ok(&resp, "Album")?;
        take_field(&mut resp, "/data")
    }

    pub fn album_more(&self, raw_id: &str) -> Result<Option<Value>> {
        let mut params = Params::new();
        params.insert("album".into(), raw_id.into());
        self.call(Host::Ds, "album_more.php", params, None)
    }
}
