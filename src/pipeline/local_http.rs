//! One-shot HTTP/1.1 listener on 127.0.0.1 for exercising the real
//! `reqwest` paths in unit tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// What the listener does after reading the request.
pub(crate) enum Reply {
    /// Answer with this status line suffix (e.g. `"200 OK"`), content type and body.
    Respond {
        status: &'static str,
        content_type: &'static str,
        body: Vec<u8>,
    },
    /// Hold the connection open without answering.
    Stall,
}

/// A request as seen on the wire.
pub(crate) struct Captured {
    /// Request line and headers, lower-cased.
    pub head: String,
    pub body: Vec<u8>,
}

/// Bind an ephemeral port, accept one connection and apply `reply`.
/// Returns the base URL and a handle resolving to the captured request.
pub(crate) async fn serve_once(reply: Reply) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let captured = read_request(&mut stream).await;
        match reply {
            Reply::Respond {
                status,
                content_type,
                body,
            } => {
                let head = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                stream.write_all(head.as_bytes()).await.unwrap();
                stream.write_all(&body).await.unwrap();
                stream.flush().await.unwrap();
            }
            Reply::Stall => sleep(Duration::from_secs(30)).await,
        }
        captured
    });
    (format!("http://{addr}"), handle)
}

async fn read_request(stream: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Captured {
        head,
        body: buf[head_end..].to_vec(),
    }
}
