//! Minimal HTTP/1.1 service that shows the lease table as a web page.
//!
//! There is one route, `GET /`. Every request re-parses the lease file on
//! the blocking pool and renders a fresh page; nothing is cached between
//! requests. Connections are closed after one response.

use std::net::SocketAddr;
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::html::HtmlPage;
use crate::lease::parse_file;
use crate::render::Render;

const LISTEN_BACKLOG: i32 = 128;
const MAX_REQUEST_HEAD_SIZE: usize = 8 * 1024;
const READ_BUFFER_SIZE: usize = 1024;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

pub struct LeaseServer {
    config: Arc<Config>,
    listener: TcpListener,
}

impl LeaseServer {
    pub async fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let listener = Self::create_listener(config.listen_address)?;

        info!(
            "Lease web service listening on {} (lease file: {})",
            listener.local_addr()?,
            config.leases_file.display()
        );

        Ok(Self { config, listener })
    }

    fn create_listener(address: SocketAddr) -> Result<TcpListener> {
        let socket = Socket::new(
            Domain::for_address(address),
            Type::STREAM,
            Some(Protocol::TCP),
        )
        .map_err(|error| Error::Socket(format!("Failed to create socket: {}", error)))?;

        socket
            .set_reuse_address(true)
            .map_err(|error| Error::Socket(format!("Failed to set SO_REUSEADDR: {}", error)))?;

        socket
            .set_nonblocking(true)
            .map_err(|error| Error::Socket(format!("Failed to set non-blocking: {}", error)))?;

        socket
            .bind(&address.into())
            .map_err(|error| Error::Socket(format!("Failed to bind to {}: {}", address, error)))?;

        socket
            .listen(LISTEN_BACKLOG)
            .map_err(|error| Error::Socket(format!("Failed to listen on {}: {}", address, error)))?;

        let std_listener: std::net::TcpListener = socket.into();
        TcpListener::from_std(std_listener).map_err(|error| {
            Error::Socket(format!("Failed to convert to tokio listener: {}", error))
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run(&self) -> Result<()> {
        info!("Lease web service ready");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let config = Arc::clone(&self.config);
                    tokio::spawn(async move {
                        if let Err(error) = handle_connection(config, stream, peer).await {
                            warn!("Error handling connection from {}: {}", peer, error);
                        }
                    });
                }
                Err(error) => {
                    error!("Error accepting connection: {}", error);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Request {
    method: String,
    path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Response {
    status: u16,
    reason: &'static str,
    content_type: &'static str,
    allow: Option<&'static str>,
    body: Vec<u8>,
}

impl Response {
    fn html(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            reason: "OK",
            content_type: HTML_CONTENT_TYPE,
            allow: None,
            body,
        }
    }

    fn text(status: u16, reason: &'static str, message: impl Into<String>) -> Self {
        let mut body = message.into().into_bytes();
        body.push(b'\n');
        Self {
            status,
            reason,
            content_type: TEXT_CONTENT_TYPE,
            allow: None,
            body,
        }
    }

    fn bad_request() -> Self {
        Self::text(400, "Bad Request", "Bad Request")
    }

    fn not_found() -> Self {
        Self::text(404, "Not Found", "Not Found")
    }

    fn method_not_allowed() -> Self {
        Self {
            allow: Some("GET"),
            ..Self::text(405, "Method Not Allowed", "Method Not Allowed")
        }
    }

    fn internal_error(message: impl Into<String>) -> Self {
        Self::text(500, "Internal Server Error", message)
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n",
            self.status,
            self.reason,
            self.content_type,
            self.body.len()
        );
        if let Some(allow) = self.allow {
            head.push_str(&format!("Allow: {}\r\n", allow));
        }
        head.push_str("Connection: close\r\n\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

async fn handle_connection(
    config: Arc<Config>,
    mut stream: TcpStream,
    peer: SocketAddr,
) -> Result<()> {
    let response = match read_request_head(&mut stream).await? {
        Some(head) => match parse_request_head(&head) {
            Some(request) => {
                debug!("{} {} from {}", request.method, request.path, peer);
                respond(config, &request).await
            }
            None => Response::bad_request(),
        },
        None => Response::bad_request(),
    };

    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Reads until the blank line ending the request head.
///
/// Returns `None` if the peer closes early or the head exceeds
/// [`MAX_REQUEST_HEAD_SIZE`].
async fn read_request_head(stream: &mut TcpStream) -> Result<Option<Vec<u8>>> {
    let mut head = Vec::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        let size = stream.read(&mut buffer).await?;
        if size == 0 {
            return Ok(None);
        }
        head.extend_from_slice(&buffer[..size]);

        if let Some(end) = find_head_end(&head) {
            head.truncate(end);
            return Ok(Some(head));
        }
        if head.len() > MAX_REQUEST_HEAD_SIZE {
            return Ok(None);
        }
    }
}

fn find_head_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|window| window == b"\r\n\r\n")
}

fn parse_request_head(head: &[u8]) -> Option<Request> {
    let head = std::str::from_utf8(head).ok()?;
    let request_line = head.lines().next()?;
    let mut parts = request_line.split_whitespace();

    let method = parts.next()?;
    let target = parts.next()?;
    let version = parts.next()?;
    if !version.starts_with("HTTP/") || parts.next().is_some() {
        return None;
    }

    let path = target.split('?').next().unwrap_or(target);

    Some(Request {
        method: method.to_string(),
        path: path.to_string(),
    })
}

async fn respond(config: Arc<Config>, request: &Request) -> Response {
    if request.path != "/" {
        return Response::not_found();
    }
    if request.method != "GET" {
        return Response::method_not_allowed();
    }

    match tokio::task::spawn_blocking(move || render_lease_page(&config)).await {
        Ok(Ok(body)) => Response::html(body),
        Ok(Err(error)) => {
            error!("Failed to render lease page: {}", error);
            Response::internal_error(error.to_string())
        }
        Err(error) => {
            error!("Lease page task failed: {}", error);
            Response::internal_error("Internal Server Error")
        }
    }
}

/// Parses the configured lease file and renders it as an HTML document.
pub fn render_lease_page(config: &Config) -> Result<Vec<u8>> {
    let parsed = parse_file(&config.leases_file, config.parse_mode)?;
    let mut body = Vec::new();
    HtmlPage::new(&config.leases_file).render(&parsed.records, &mut body)?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddrV4};
    use std::path::Path;

    const LEASE_LINES: &str = "\
1700000000 aa:bb:cc:dd:ee:ff 192.168.1.50 myhost 01:aa:bb:cc:dd:ee:ff
broken
1700000100 11:22:33:44:55:66 192.168.1.51 *
";

    fn test_config(leases_file: &Path) -> Config {
        Config {
            leases_file: leases_file.to_path_buf(),
            listen_address: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0)),
            ..Default::default()
        }
    }

    async fn start_server(config: Config) -> SocketAddr {
        let server = LeaseServer::new(config).await.unwrap();
        let address = server.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        address
    }

    async fn send(address: SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(address).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8(response).unwrap()
    }

    #[test]
    fn test_parse_request_head() {
        let request = parse_request_head(b"GET /?refresh=1 HTTP/1.1\r\nHost: x").unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/");

        assert!(parse_request_head(b"GET /").is_none());
        assert!(parse_request_head(b"GET / FTP/1.0").is_none());
        assert!(parse_request_head(b"").is_none());
        assert!(parse_request_head(b"\xff\xfe / HTTP/1.1").is_none());
    }

    #[test]
    fn test_find_head_end() {
        assert_eq!(find_head_end(b"GET / HTTP/1.1\r\n\r\n"), Some(14));
        assert_eq!(find_head_end(b"GET / HTTP/1.1\r\n"), None);
    }

    #[test]
    fn test_response_bytes() {
        let response = Response::method_not_allowed();
        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        assert!(text.contains("Allow: GET\r\n"));
        assert!(text.contains("Content-Length: 19\r\n"));
        assert!(text.contains("Connection: close\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_routing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(test_config(&dir.path().join("missing")));

        let other_path = Request {
            method: "GET".to_string(),
            path: "/health".to_string(),
        };
        assert_eq!(respond(Arc::clone(&config), &other_path).await.status, 404);

        let post = Request {
            method: "POST".to_string(),
            path: "/".to_string(),
        };
        assert_eq!(respond(Arc::clone(&config), &post).await.status, 405);
    }

    #[test]
    fn test_render_lease_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dnsmasq.leases");
        std::fs::write(&path, LEASE_LINES).unwrap();

        let body = String::from_utf8(render_lease_page(&test_config(&path)).unwrap()).unwrap();
        assert!(body.contains("<td>myhost</td>"));
        assert!(body.contains("<td>192.168.1.51</td>"));
        assert!(body.contains("<td>N/A</td>"));
    }

    #[tokio::test]
    async fn test_get_root_serves_html() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dnsmasq.leases");
        std::fs::write(&path, LEASE_LINES).unwrap();
        let address = start_server(test_config(&path)).await;

        let response = send(address, "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: text/html; charset=utf-8\r\n"));
        assert!(response.contains("<td>aa:bb:cc:dd:ee:ff</td>"));
        assert!(response.contains(&path.display().to_string()));
    }

    #[tokio::test]
    async fn test_each_request_rereads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dnsmasq.leases");
        std::fs::write(&path, "").unwrap();
        let address = start_server(test_config(&path)).await;

        let empty = send(address, "GET / HTTP/1.1\r\n\r\n").await;
        assert!(empty.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(empty.contains(crate::html::NO_ACTIVE_LEASES));

        std::fs::write(&path, LEASE_LINES).unwrap();
        let filled = send(address, "GET / HTTP/1.1\r\n\r\n").await;
        assert!(filled.contains("<td>myhost</td>"));
        assert!(!filled.contains(crate::html::NO_ACTIVE_LEASES));
    }

    #[tokio::test]
    async fn test_missing_file_returns_500_naming_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.leases");
        let address = start_server(test_config(&path)).await;

        let response = send(address, "GET / HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(response.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(response.contains("nope.leases"));
    }

    #[tokio::test]
    async fn test_bad_request_over_the_wire() {
        let dir = tempfile::tempdir().unwrap();
        let address = start_server(test_config(&dir.path().join("x"))).await;

        let response = send(address, "NONSENSE\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }
}
