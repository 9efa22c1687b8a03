//! End-to-end tests over a real TCP connection.
//!
//! Each test binds its own server on an ephemeral port with a fresh
//! workspace and speaks raw HTTP/1.1 through `TcpStream`. They verify:
//! - The upload form, confirmation, and download pages come back over
//!   the wire with the right status, headers, and markup
//! - A full upload round trip produces a downloadable document
//! - A later upload replaces the earlier batch
//! - Unknown paths, wrong methods, and malformed requests get their
//!   error statuses
//! - Every response is length-framed and closes the connection

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use photo2docx::pages;
use photo2docx::server::Server;
use photo2docx::workspace::Workspace;

// ─── Helpers ────────────────────────────────────────────────────

/// Spin up a server with its own workspace on an ephemeral port. The
/// accept loop runs on a detached thread for the life of the test
/// process.
fn start_server() -> SocketAddr {
    let workspace = Arc::new(Workspace::create().expect("create workspace"));
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    thread::spawn(move || {
        let server = Server::new(workspace);
        let _ = server.serve(listener);
    });
    addr
}

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Write one raw request and read the whole reply. The server closes
/// the connection after each response, so reading to end of stream
/// yields exactly one reply.
fn send(addr: SocketAddr, request: &[u8]) -> Reply {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .expect("set timeout");
    stream.write_all(request).expect("write request");
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).expect("read reply");

    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("reply has a head/body split");
    let head = std::str::from_utf8(&raw[..split]).expect("reply head is UTF-8");
    let body = raw[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines.next().expect("status line");
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .expect("status code")
        .parse()
        .expect("numeric status");
    let headers = lines
        .map(|line| {
            let (name, value) = line.split_once(':').expect("header colon");
            (name.trim().to_string(), value.trim().to_string())
        })
        .collect();
    Reply { status, headers, body }
}

fn get(addr: SocketAddr, path: &str) -> Reply {
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    send(addr, request.as_bytes())
}

fn make_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |_, _| image::Rgb([10, 200, 90]));
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgb8)
        .unwrap();
    buf
}

/// Build a full multipart POST to `/upload`, one part per file.
fn upload(addr: SocketAddr, files: &[(&str, &[u8])]) -> Reply {
    let boundary = "----EndToEndBoundary42";
    let mut body = Vec::new();
    for (file_name, data) in files {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let mut request = format!(
        "POST /upload HTTP/1.1\r\n\
         Host: localhost\r\n\
         Content-Type: multipart/form-data; boundary={boundary}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    request.extend_from_slice(&body);
    send(addr, &request)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ─── Pages over the Wire ────────────────────────────────────────

#[test]
fn test_index_serves_the_upload_form() {
    let addr = start_server();
    let reply = get(addr, "/");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some("text/html; charset=utf-8"));
    let text = reply.text();
    assert!(text.contains("이미지 업로드"));
    assert!(text.contains("enctype=\"multipart/form-data\""));
}

#[test]
fn test_download_routes_before_any_upload_report_missing_file() {
    let addr = start_server();
    for path in ["/download", "/download_file"] {
        let reply = get(addr, path);
        assert_eq!(reply.status, 200, "{path} stays 200 with no document");
        assert_eq!(reply.body, pages::NOT_FOUND_FRAGMENT.as_bytes());
    }
}

#[test]
fn test_unknown_path_is_404() {
    let addr = start_server();
    assert_eq!(get(addr, "/missing").status, 404);
}

#[test]
fn test_wrong_method_is_405_with_allow_header() {
    let addr = start_server();

    let reply = get(addr, "/upload");
    assert_eq!(reply.status, 405);
    assert_eq!(reply.header("Allow"), Some("POST"));

    let reply = send(
        addr,
        b"DELETE / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert_eq!(reply.status, 405);
    assert_eq!(reply.header("Allow"), Some("GET"));
}

#[test]
fn test_malformed_request_line_is_rejected() {
    let addr = start_server();
    let reply = send(addr, b"complete nonsense\r\n\r\n");
    assert_eq!(reply.status, 400);
}

// ─── Upload Round Trip ──────────────────────────────────────────

#[test]
fn test_upload_then_download_round_trip() {
    let addr = start_server();
    let png = make_test_png(40, 30);

    let reply = upload(addr, &[("first.png", &png), ("second.png", &png)]);
    assert_eq!(reply.status, 200);
    assert!(reply.text().contains("총 2 개의 이미지 업로드됨."));

    let page = get(addr, "/download");
    assert_eq!(page.status, 200);
    assert!(page.text().contains("파일 다운로드가 곧 시작됩니다"));

    let file = get(addr, "/download_file");
    assert_eq!(file.status, 200);
    assert_eq!(
        file.header("Content-Type"),
        Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
    );
    assert_eq!(
        file.header("Content-Disposition"),
        Some("attachment; filename=\"output.docx\"")
    );
    assert!(file.body.starts_with(b"PK\x03\x04"));
    let advertised: usize = file.header("Content-Length").unwrap().parse().unwrap();
    assert_eq!(advertised, file.body.len());
}

#[test]
fn test_second_upload_replaces_the_first_batch() {
    let addr = start_server();
    let png = make_test_png(20, 20);

    upload(addr, &[("one.png", &png), ("two.png", &png)]);
    let reply = upload(addr, &[("three.png", &png)]);
    assert!(reply.text().contains("총 1 개의 이미지 업로드됨."));

    let file = get(addr, "/download_file");
    assert!(contains(&file.body, b"word/media/image1.png"));
    assert!(
        !contains(&file.body, b"word/media/image2"),
        "the replaced batch must not leak into the new document"
    );
}

#[test]
fn test_empty_file_input_counts_zero_and_still_generates() {
    let addr = start_server();
    let reply = upload(addr, &[("", b"")]);
    assert_eq!(reply.status, 200);
    assert!(reply.text().contains("총 0 개의 이미지 업로드됨."));

    let file = get(addr, "/download_file");
    assert_eq!(file.status, 200);
    assert!(file.body.starts_with(b"PK\x03\x04"));
}

#[test]
fn test_broken_upload_is_a_server_error() {
    let addr = start_server();
    let reply = upload(addr, &[("broken.png", b"not pixels")]);
    assert_eq!(reply.status, 500);
}

// ─── Connection Behavior ────────────────────────────────────────

#[test]
fn test_every_reply_closes_the_connection() {
    let addr = start_server();
    let reply = get(addr, "/");
    assert_eq!(reply.header("Connection"), Some("close"));
    let advertised: usize = reply.header("Content-Length").unwrap().parse().unwrap();
    assert_eq!(advertised, reply.body.len());
}

#[test]
fn test_concurrent_requests_are_all_served() {
    let addr = start_server();
    let handles: Vec<_> = (0..4)
        .map(|_| thread::spawn(move || get(addr, "/").status))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 200);
    }
}
