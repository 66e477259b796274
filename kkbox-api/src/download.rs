//! KKDRM media download.
//!
//! A ticket URI points at an RC4-encrypted file on an edge server. The first
//! [`MEDIA_HEADER_LEN`] bytes are skipped with a `Range` request; the rest is
//! decrypted with the session's content key after dropping
//! [`MEDIA_KEYSTREAM_DROP`](crate::cipher::MEDIA_KEYSTREAM_DROP) keystream
//! bytes, [`CHUNK_SIZE`] bytes at a time, straight into the sink.
//!
//! A failed download may leave a partial file behind; removing it is up to
//! the caller.

use crate::cipher::MediaCipher;
use crate::client::KkboxClient;
use crate::error::Result;
use crate::transport::Transport;
use crate::types::DownloadReport;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use tracing::debug;

/// Bytes of the media file that are never requested.
pub const MEDIA_HEADER_LEN: u64 = 1024;

/// Read/decrypt/write granularity.
pub const CHUNK_SIZE: usize = 4096;

/// Decrypts one media stream. Not reusable: each download needs its own.
pub struct StreamDecryptor {
    cipher: MediaCipher,
}

impl StreamDecryptor {
    pub fn new(content_key: &[u8]) -> Result<Self> {
        Ok(Self {
            cipher: MediaCipher::new(content_key)?,
        })
    }

    /// Decrypt `reader` to `sink` until EOF. Returns the bytes written.
    pub fn decrypt<R: Read, W: Write>(mut self, reader: &mut R, sink: &mut W) -> Result<u64> {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut written = 0u64;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.cipher.decrypt_in_place(&mut buf[..n]);
            sink.write_all(&buf[..n])?;
            written += n as u64;
        }

        sink.flush()?;
        Ok(written)
    }
}

impl<T: Transport> KkboxClient<T> {
    /// Download and decrypt a ticket URI into `sink`.
    ///
    /// # Errors
    ///
    /// - [`KkboxError::NotLoggedIn`](crate::KkboxError::NotLoggedIn): no content key yet
    /// - [`KkboxError::Download`](crate::KkboxError::Download): non-2xx from the edge server
    /// - [`KkboxError::Io`](crate::KkboxError::Io): reading the body or writing the sink
    pub fn download_to<W: Write>(&self, url: &str, sink: &mut W) -> Result<DownloadReport> {
        let session = self.require_session()?;
        let decryptor = StreamDecryptor::new(session.content_key())?;

        let mut media = self.transport().open_media(url, MEDIA_HEADER_LEN)?;
        let bytes_written = decryptor.decrypt(&mut media.body, sink)?;

        debug!(bytes_written, expected = ?media.content_length, "download finished");
        Ok(DownloadReport {
            bytes_written,
            expected_len: media.content_length,
        })
    }

    /// Download and decrypt a ticket URI to a file at `dest`.
    pub fn download(&self, url: &str, dest: &Path) -> Result<DownloadReport> {
        let mut writer = BufWriter::new(File::create(dest)?);
        self.download_to(url, &mut writer)
    }
}
