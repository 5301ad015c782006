//! A scripted HTTP server standing in for the remote service.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// A request received by a [`TestServer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    /// The path and query, as sent on the request line.
    pub target: String,
    pub content_type: Option<String>,
    pub body: String,
}

type Routes = Arc<Mutex<HashMap<String, (u16, String)>>>;
type Requests = Arc<Mutex<Vec<RecordedRequest>>>;

/// An HTTP/1.1 server on a local port that answers each request target with a scripted status
/// and body, and 404 for anything not scripted. Every request is recorded.
pub struct TestServer {
    addr: SocketAddr,
    routes: Routes,
    requests: Requests,
    accept_handle: JoinHandle<()>,
}

impl TestServer {
    /// Starts a server on a free local port.
    pub async fn start() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let routes = Routes::default();
        let requests = Requests::default();

        let routes_clone = routes.clone();
        let requests_clone = requests.clone();
        let accept_handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = routes_clone.clone();
                let requests = requests_clone.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, routes, requests).await;
                });
            }
        });

        Ok(TestServer {
            addr,
            routes,
            requests,
            accept_handle,
        })
    }

    /// Returns the base URL of the server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answers requests for `target` (path and query) with `status` and `body`.
    pub fn reply(&self, target: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(target.to_string(), (status, body.to_string()));
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.accept_handle.abort();
    }
}

/// Reads one request from `stream`, records it, and writes the scripted response.
async fn handle_connection(
    mut stream: TcpStream,
    routes: Routes,
    requests: Requests,
) -> io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0; 1024];

    // Read until the end of the headers
    let head_end = loop {
        if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break i + 4;
        }

        let bytes = stream.read(&mut chunk).await?;
        if bytes == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..bytes]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    let mut content_type = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().unwrap_or(0),
                "content-type" => content_type = Some(value.to_string()),
                _ => {}
            }
        }
    }

    // Read the rest of the body
    while buf.len() < head_end + content_length {
        let bytes = stream.read(&mut chunk).await?;
        if bytes == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..bytes]);
    }
    let body_end = buf.len().min(head_end + content_length);
    let body = String::from_utf8_lossy(&buf[head_end..body_end]).into_owned();

    let (status, reply) = routes
        .lock()
        .unwrap()
        .get(&target)
        .cloned()
        .unwrap_or_else(|| (404, "Not Found".to_string()));

    requests.lock().unwrap().push(RecordedRequest {
        method,
        target,
        content_type,
        body,
    });

    let response = format!(
        "HTTP/1.1 {} Scripted\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reply.len(),
        reply,
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
