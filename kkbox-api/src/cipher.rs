//! RC4 keystream and the two cipher configurations built on it.
//!
//! The service uses plain RC4 twice, for unrelated purposes:
//!
//! - [`EnvelopeCipher`]: every API response body, keyed by the static
//!   transport (`kc1`) key, keystream used from byte 0.
//! - [`MediaCipher`]: the audio file, keyed by the session's
//!   `lic_content_key`, first [`MEDIA_KEYSTREAM_DROP`] keystream bytes dropped.
//!
//! They are separate types so a content key can never decrypt an envelope
//! or vice versa.

use crate::error::{KkboxError, Result};

/// Keystream bytes discarded before the first media plaintext byte.
pub const MEDIA_KEYSTREAM_DROP: usize = 512;

/// Standard RC4 state (KSA + PRGA).
#[derive(Clone)]
struct Rc4 {
    sbox: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Run the key scheduling algorithm. `key` must not be empty.
    #[allow(clippy::cast_possible_truncation)]
    fn new(key: &[u8]) -> Self {
        let mut sbox = [0u8; 256];
        for (i, slot) in sbox.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut j: u8 = 0;
        for i in 0..256 {
            j = j.wrapping_add(sbox[i]).wrapping_add(key[i % key.len()]);
            sbox.swap(i, j as usize);
        }

        Self { sbox, i: 0, j: 0 }
    }

    #[inline]
    fn next_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.sbox[self.i as usize]);
        self.sbox.swap(self.i as usize, self.j as usize);
        let k = self.sbox[self.i as usize].wrapping_add(self.sbox[self.j as usize]);
        self.sbox[k as usize]
    }

    fn discard(&mut self, n: usize) {
        for _ in 0..n {
            self.next_byte();
        }
    }

    fn apply_keystream(&mut self, buf: &mut [u8]) {
        for b in buf {
            *b ^= self.next_byte();
        }
    }
}

/// Decrypts whole API response bodies.
pub struct EnvelopeCipher(Rc4);

impl EnvelopeCipher {
    pub fn new(transport_key: &[u8]) -> Result<Self> {
        if transport_key.is_empty() {
            return Err(KkboxError::Configuration("empty transport key".into()));
        }
        Ok(Self(Rc4::new(transport_key)))
    }

    /// Decrypt a complete response body into its UTF-8 JSON text.
    pub fn open(mut self, body: &[u8]) -> Result<String> {
        let mut buf = body.to_vec();
        self.0.apply_keystream(&mut buf);
        String::from_utf8(buf)
            .map_err(|e| KkboxError::Protocol(format!("envelope is not UTF-8: {e}")))
    }

    /// Inverse of [`open`](Self::open); RC4 is symmetric.
    #[cfg(test)]
    pub fn seal(mut self, plaintext: &str) -> Vec<u8> {
        let mut buf = plaintext.as_bytes().to_vec();
        self.0.apply_keystream(&mut buf);
        buf
    }
}

/// Decrypts one media download. Consumed strictly in stream order; create a
/// fresh instance per download.
pub struct MediaCipher(Rc4);

impl MediaCipher {
    pub fn new(content_key: &[u8]) -> Result<Self> {
        if content_key.is_empty() {
            return Err(KkboxError::Protocol("empty content key".into()));
        }
        let mut rc4 = Rc4::new(content_key);
        rc4.discard(MEDIA_KEYSTREAM_DROP);
        Ok(Self(rc4))
    }

    /// Decrypt the next chunk of the stream in place.
    pub fn decrypt_in_place(&mut self, chunk: &mut [u8]) {
        self.0.apply_keystream(chunk);
    }
}
