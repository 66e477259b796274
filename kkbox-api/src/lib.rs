//! KKBOX private API client library.
//!
//! Logs in with the Android app's protocol, keeps the signed session alive,
//! fetches playback tickets, and decrypts KKDRM media streams.
//!
//! # Usage
//!
//! ```no_run
//! use kkbox_api::{ClientConfig, KkboxClient};
//!
//! let config = ClientConfig::new(
//!     "0123456789abcdef0123456789abcdef", // kc1 key
//!     "fedcba9876543210fedcba9876543210", // secret key
//! );
//! let client = KkboxClient::new(&config).unwrap();
//! client.login("me@example.com", "password").unwrap();
//!
//! let ticket = client.ticket("SONG_ID", None).unwrap();
//! client
//!     .download(&ticket.uris[0], std::path::Path::new("song.m4a"))
//!     .unwrap();
//! ```
//!
//! # API endpoint mapping
//!
//! | Method                                | Host / path                    | Description            |
//! |---------------------------------------|--------------------------------|------------------------|
//! | [`KkboxClient::login`]                | `login` `login.php`            | Email/password login   |
//! | [`KkboxClient::renew`]                | `login` `check.php`            | Session renewal        |
//! | [`KkboxClient::auth_device`]          | `ds` `active_sid.php`          | Device re-binding      |
//! | [`KkboxClient::ticket`]               | `ticket` `v1/ticket`           | Playback URIs          |
//! | [`KkboxClient::download`]             | (ticket URI)                   | Decrypt media to file  |
//! | [`KkboxClient::songs`]                | `ds` `v2/song`                 | Song metadata          |
//! | [`KkboxClient::song_lyrics`]          | `ds` `v1/song/{id}/lyrics`     | Lyrics                 |
//! | [`KkboxClient::album`]                | `ds` `v1/album/{id}`           | Album                  |
//! | [`KkboxClient::album_more`]           | `ds` `album_more.php`          | Album extras           |
//! | [`KkboxClient::artist`]               | `ds` `v3/artist/{id}`          | Artist                 |
//! | [`KkboxClient::artist_albums`]        | `ds` `v2/artist/{id}/album`    | Artist discography     |
//! | [`KkboxClient::playlists`]            | `ds` `v1/playlists`            | Playlists              |
//! | [`KkboxClient::search`]               | `ds` `search_music.php`        | Search                 |
//!
//! # Encryption
//!
//! Requests are signed with MD5 over the app version, timestamp and secret
//! key. Responses and media are RC4 streams; see [`cipher`] for the two
//! configurations.

pub mod auth;
pub mod cipher;
pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod signing;
pub mod transport;
pub mod types;

mod album;
mod artist;
mod playlist;
mod search;
mod song;
mod ticket;

#[cfg(test)]
mod testing;

pub use auth::Session;
pub use client::KkboxClient;
pub use config::{ClientConfig, TicketPolicy};
pub use download::StreamDecryptor;
pub use error::{AuthError, KkboxError, Result};
pub use transport::{HttpTransport, Transport};
pub use types::{DownloadReport, Host, Quality, Ticket};
