//! Wire-level request model and the HTTP implementation.
//!
//! [`Transport`] is the seam between protocol logic and the network. The
//! signing and envelope decryption in [`client`](crate::client) sit on top of
//! it; [`HttpTransport`] is the production implementation.

use crate::config::ClientConfig;
use crate::error::{KkboxError, Result};
use crate::types::Host;
use reqwest::blocking::Client;
use reqwest::header::RANGE;
use std::io::Read;
use tracing::debug;

const USER_AGENT: &str = "okhttp/3.14.9";

/// Request body, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Pre-serialized JSON text (ticket host).
    Json(String),
    /// `application/x-www-form-urlencoded` fields (every other host).
    Form(Vec<(String, String)>),
}

/// A fully signed API request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub host: Host,
    pub path: String,
    pub query: Vec<(String, String)>,
    /// `None` means GET.
    pub body: Option<Body>,
}

impl ApiRequest {
    pub fn url(&self) -> String {
        self.host.url(&self.path)
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A ranged media response, positioned at the first body byte.
pub struct MediaStream {
    /// `Content-Length` of the ranged response.
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

/// Sends requests on behalf of [`KkboxClient`](crate::KkboxClient).
pub trait Transport {
    /// Send an API request and return the raw (still encrypted) body.
    /// An empty vector means the server sent no body.
    fn execute(&self, request: &ApiRequest) -> Result<Vec<u8>>;

    /// GET `url` starting at byte `offset`. Non-2xx must fail with
    /// [`KkboxError::Download`].
    fn open_media(&self, url: &str, offset: u64) -> Result<MediaStream>;
}

/// Blocking reqwest transport.
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout);
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    fn send(&self, url: &str, request: &ApiRequest) -> Result<Vec<u8>> {
        let req = match &request.body {
            None => self.http.get(url),
            Some(Body::Json(text)) => self.http.post(url).body(text.clone()),
            Some(Body::Form(fields)) => self.http.post(url).form(fields),
        };
        let resp = req.query(&request.query).send()?;
        debug!(host = %request.host, path = %request.path, status = %resp.status(), "api response");
        Ok(resp.error_for_status()?.bytes()?.to_vec())
    }
}

impl Transport for HttpTransport {
    /// Non-2xx statuses fail with [`KkboxError::Transport`].
    fn execute(&self, request: &ApiRequest) -> Result<Vec<u8>> {
        self.send(&request.url(), request)
    }

    fn open_media(&self, url: &str, offset: u64) -> Result<MediaStream> {
        let resp = self
            .http
            .get(url)
            .header(RANGE, format!("bytes={offset}-"))
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(KkboxError::Download {
                status: status.as_u16(),
            });
        }
        Ok(MediaStream {
            content_length: resp.content_length(),
            body: Box::new(resp),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve one canned HTTP response; the handle yields the request head.
    fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            reader.get_mut().write_all(response.as_bytes()).unwrap();
            head
        });
        (base, handle)
    }

    fn local_transport() -> HttpTransport {
        HttpTransport {
            http: Client::builder().no_proxy().build().unwrap(),
        }
    }

    fn get_request() -> ApiRequest {
        ApiRequest {
            host: Host::Ds,
            path: "x".into(),
            query: vec![("sid".into(), "S1".into())],
            body: None,
        }
    }

    #[test]
    fn server_error_is_transport_error() {
        let (base, server) =
            serve_once("HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let err = local_transport()
            .send(&format!("{base}/x"), &get_request())
            .unwrap_err();
        assert!(matches!(err, KkboxError::Transport(_)));
        server.join().unwrap();
    }

    #[test]
    fn success_returns_raw_body() {
        let (base, server) =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabc");
        let body = local_transport()
            .send(&format!("{base}/x"), &get_request())
            .unwrap();
        assert_eq!(body, b"abc");
        let head = server.join().unwrap();
        assert!(head.starts_with("GET /x?sid=S1 "), "{head}");
    }

    #[test]
    fn media_request_skips_header_with_range() {
        let (base, server) = serve_once(
            "HTTP/1.1 206 Partial Content\r\nContent-Length: 4\r\nConnection: close\r\n\r\nwxyz",
        );
        let mut media = local_transport()
            .open_media(&format!("{base}/song"), 1024)
            .unwrap();
        let mut data = Vec::new();
        media.body.read_to_end(&mut data).unwrap();
        assert_eq!(data, b"wxyz");
        assert_eq!(media.content_length, Some(4));

        let head = server.join().unwrap().to_ascii_lowercase();
        assert!(head.contains("range: bytes=1024-\r\n"), "{head}");
    }

    #[test]
    fn media_error_status_is_download_error() {
        let (base, server) =
            serve_once("HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let err = local_transport()
            .open_media(&format!("{base}/song"), 1024)
            .err()
            .unwrap();
        assert!(matches!(err, KkboxError::Download { status: 403 }));
        server.join().unwrap();
    }
}
