//! Song metadata and lyrics.
//!
//! # Endpoints
//!
//! ## `songs`: `POST api-ds/v2/song` (form)
//!
//! Request: `{ "ids": "id1,id2", "fields": "artist_role,song_idx,..." }`
//!
//! Response:
//! ```json
//! { "status": { "type": "OK" }, "data": { "songs": [ { ... } ] } }
//! ```
//!
//! ## `song_lyrics`: `GET api-ds/v1/song/{id}/lyrics`
//!
//! Returned as-is; instrumental tracks may yield an empty body.

use crate::client::{KkboxClient, ensure_ok, take_field};
use crate::error::Result;
use crate::signing::Params;
use crate::transport::Transport;
use crate::types::Host;
use serde_json::{Value, json};

/// Extra fields requested alongside the default song payload.
const SONG_FIELDS: &str = "artist_role,song_idx,album_photo_info,song_is_explicit,\
    song_more_url,album_more_url,artist_more_url,genre_name,is_lyrics,audio_quality";

impl<T: Transport> KkboxClient<T> {
    /// Fetch song metadata for one or more ids. Returns `data.songs`.
    ///
    /// # Errors
    ///
    /// [`KkboxError::NotFound`](crate::KkboxError::NotFound) when the status
    /// type is not `OK`.
    pub fn songs(&self, ids: &[&str]) -> Result<Value> {
        let payload = json!({
            "ids": ids.join(","),
            "fields": SONG_FIELDS,
        });
        let mut resp = self.call_json(Host::Ds, "v2/song", Params::new(), Some(&payload))?;
        ensure_ok(&resp, "Track")?;
        take_field(&mut resp, "/data/songs")
    }

    /// Raw lyrics response for a song.
    pub fn song_lyrics(&self, id: &str) -> Result<Option<Value>> {
        self.call(Host::Ds, &format!("v1/song/{id}/lyrics"), Params::new(), None)
    }
}
