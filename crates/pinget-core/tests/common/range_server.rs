//! Minimal HTTP/1.1 server that supports HEAD and Range GET for integration tests.
//!
//! Serves a single static body, over plain TCP or TLS (fixture certificate).
//! Responds to HEAD with Content-Length and Accept-Ranges: bytes; responds to
//! GET with Range with 206 Partial Content. Every request is recorded so tests
//! can assert on Range, User-Agent and proxy headers. Absolute-form request
//! targets are accepted, so the server doubles as a forward proxy.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{ServerConfig, ServerConnection, StreamOwned};

pub const CERT_DER: &[u8] = include_bytes!("../fixtures/cert.der");
pub const KEY_DER: &[u8] = include_bytes!("../fixtures/key.der");

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, HEAD returns 405 (simulates servers that block HEAD).
    pub head_allowed: bool,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If false, omit `Accept-Ranges: bytes` header even if ranges work.
    pub advertise_ranges: bool,
    /// Advertise ranges but answer every GET with 200 and the full body.
    pub ignore_range: bool,
    /// The first `truncate_gets` GET responses stop after this many body bytes.
    pub truncate_after: Option<usize>,
    pub truncate_gets: usize,
    /// Answer every GET with this status and an empty body.
    pub get_status: Option<u16>,
    /// Content-Length reported by HEAD instead of the real body length.
    pub head_length: Option<u64>,
    /// Ranged GETs are served from this many bytes before the requested start.
    pub skew_range_start: u64,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            head_allowed: true,
            support_ranges: true,
            advertise_ranges: true,
            ignore_range: false,
            truncate_after: None,
            truncate_gets: 0,
            get_status: None,
            head_length: None,
            skew_range_start: 0,
        }
    }
}

/// One request as the server saw it.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub range: Option<String>,
    pub user_agent: Option<String>,
    pub proxy_authorization: Option<String>,
}

/// Handle to a running server. The server runs until the process exits.
#[derive(Clone)]
pub struct RangeServer {
    pub url: String,
    pub port: u16,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl RangeServer {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method.eq_ignore_ascii_case("GET"))
            .collect()
    }
}

struct Shared {
    body: Vec<u8>,
    opts: RangeServerOptions,
    requests: Arc<Mutex<Vec<Recorded>>>,
    gets_served: AtomicUsize,
    tls: Option<Arc<ServerConfig>>,
}

/// Starts a plain HTTP server in a background thread serving `body`.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

/// Like `start` but allows customizing server behavior (HEAD blocked, ranges missing, etc.).
pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    spawn(body, opts, None, "http")
}

/// HTTPS server presenting the fixture certificate.
pub fn start_tls(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    spawn(body, opts, Some(tls_config()), "https")
}

fn tls_config() -> Arc<ServerConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(KEY_DER.to_vec()));
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![CertificateDer::from(CERT_DER.to_vec())], key)
        .expect("fixture certificate");
    Arc::new(config)
}

fn spawn(
    body: Vec<u8>,
    opts: RangeServerOptions,
    tls: Option<Arc<ServerConfig>>,
    scheme: &str,
) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let shared = Arc::new(Shared {
        body,
        opts,
        requests: Arc::clone(&requests),
        gets_served: AtomicUsize::new(0),
        tls,
    });
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
                let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
                match &shared.tls {
                    Some(config) => {
                        let Ok(conn) = ServerConnection::new(Arc::clone(config)) else {
                            return;
                        };
                        let mut tls = StreamOwned::new(conn, stream);
                        handle(&mut tls, &shared);
                        tls.conn.send_close_notify();
                        let _ = tls.flush();
                    }
                    None => {
                        let mut stream = stream;
                        handle(&mut stream, &shared);
                    }
                }
            });
        }
    });
    RangeServer {
        url: format!("{}://127.0.0.1:{}/", scheme, port),
        port,
        requests,
    }
}

/// A port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().unwrap().port()
}

fn handle<S: Read + Write>(stream: &mut S, shared: &Shared) {
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let recorded = parse_request(request);
    shared.requests.lock().unwrap().push(recorded.clone());

    let opts = shared.opts;
    let body = shared.body.as_slice();
    let total = body.len() as u64;
    let accept_ranges = if opts.advertise_ranges && opts.support_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };

    if recorded.method.eq_ignore_ascii_case("HEAD") {
        if !opts.head_allowed {
            let _ = stream.write_all(
                b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
            return;
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
            opts.head_length.unwrap_or(total),
            accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if !recorded.method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let served = shared.gets_served.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = opts.get_status {
        let response = format!(
            "HTTP/1.1 {} Test\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            status
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    let range = if opts.support_ranges && !opts.ignore_range {
        recorded.range.as_deref().and_then(parse_range)
    } else {
        None
    };
    let (status, content_range, slice) = match range {
        Some((start, end_incl)) => {
            let end_incl = end_incl.min(total.saturating_sub(1));
            if start >= total || start > end_incl {
                (
                    "416 Range Not Satisfiable",
                    format!("bytes */{}", total),
                    &body[0..0],
                )
            } else {
                let start = start.saturating_sub(opts.skew_range_start) as usize;
                let end_excl = (end_incl + 1) as usize;
                (
                    "206 Partial Content",
                    format!("bytes {}-{}/{}", start, end_excl - 1, total),
                    &body[start..end_excl],
                )
            }
        }
        None => (
            "200 OK",
            format!("bytes 0-{}/{}", total.saturating_sub(1), total),
            body,
        ),
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Range: {}\r\n{}Connection: close\r\n\r\n",
        status,
        slice.len(),
        content_range,
        accept_ranges
    );
    let _ = stream.write_all(response.as_bytes());
    let slice = match opts.truncate_after {
        Some(limit) if served < opts.truncate_gets => &slice[..limit.min(slice.len())],
        _ => slice,
    };
    let _ = stream.write_all(slice);
    let _ = stream.flush();
}

fn parse_request(request: &str) -> Recorded {
    let mut recorded = Recorded::default();
    for (i, line) in request.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if i == 0 {
            let mut parts = line.split_whitespace();
            recorded.method = parts.next().unwrap_or("").to_string();
            recorded.target = parts.next().unwrap_or("").to_string();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = Some(value.trim().to_string());
            if name.eq_ignore_ascii_case("range") {
                recorded.range = value;
            } else if name.eq_ignore_ascii_case("user-agent") {
                recorded.user_agent = value;
            } else if name.eq_ignore_ascii_case("proxy-authorization") {
                recorded.proxy_authorization = value;
            }
        }
    }
    recorded
}

/// (start, end_inclusive) for `bytes=X-Y` or `bytes=X-`.
fn parse_range(value: &str) -> Option<(u64, u64)> {
    let part = value.trim().strip_prefix("bytes=")?;
    let (a, b) = part.split_once('-')?;
    let start = a.trim().parse::<u64>().ok()?;
    let end = b.trim();
    let end_incl = if end.is_empty() {
        u64::MAX
    } else {
        end.parse::<u64>().ok()?
    };
    Some((start, end_incl))
}
