//! Search API.
//!
//! Endpoint: `GET api-ds/search_music.php`
//!
//! Query parameters:
//! - `sf`: comma-separated result types (`song`, `album`, `artist`, `playlist`)
//! - `limit`: page size
//! - `query`: search text
//! - `search_ranking`: always `sc-A`
//!
//! The response is returned unchanged.

use crate::client::KkboxClient;
use crate::error::Result;
use crate::signing::Params;
use crate::transport::Transport;
use crate::types::Host;
use serde_json::Value;

impl<T: Transport> KkboxClient<T> {
    pub fn search(&self, query: &str, types: &[&str], limit: u32) -> Result<Option<Value>> {
        let mut params = Params::new();
        params.insert("sf".into(), types.join(","));
        params.insert("limit".into(), limit.to_string());
        params.insert("query".into(), query.into());
        params.insert("search_ranking".into(), "sc-A".into());
        self.call(Host::Ds, "search_music.php", params, None)
    }
}
