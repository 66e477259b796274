//! Artist API.
//!
//! - `artist`: `GET api-ds/v3/artist/{id}`, returns `data`
//! - `artist_albums`: `GET api-ds/v2/artist/{raw_id}/album?limit=&offset=`,
//!   returns `data.album`

use crate::client::{KkboxClient, ensure_ok, take_field};
use crate::error::Result;
use crate::signing::Params;
use crate::transport::Transport;
use crate::types::Host;
use serde_json::Value;

impl<T: Transport> KkboxClient<T> {
    pub fn artist(&self, id: &str) -> Result<Value> {
        let mut resp = self.call_json(Host::Ds, &format!("v3/artist/{id}"), Params::new(), None)?;
        ensure_ok(&resp, "Artist")?;
        take_field(&mut resp, "/data")
    }

    /// One page of an artist's albums.
    pub fn artist_albums(&self, raw_id: &str, limit: u32, offset: u32) -> Result<Value> {
        let mut params = Params::new();
        params.insert("limit".into(), limit.to_string());
        params.insert("offset".into(), offset.to_string());
        let mut resp = self.call_json(
            Host::Ds,
            &format!("v2/artist/{raw_id}/album"),
            params,
            None,
        )?;
        ensure_ok(&resp, "Artist")?;
        take_field(&mut resp, "/data/album")
    }
}
