//! # HTTP Server
//!
//! A small synchronous HTTP/1.1 server on `std::net`, one thread per
//! connection, `Connection: close` on every response. Four routes drive
//! the whole flow: the upload form, the multipart upload that regenerates
//! the document, the download page, and the file endpoint. The workspace
//! handle is injected rather than ambient, so every handler works against
//! an explicit [`Workspace`].
//!
//! The server assumes one interactive local user. Concurrent uploads are
//! serialized by the workspace's upload lock; beyond that there is no
//! session isolation, and the latest completed upload owns the output.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::docx::DOCX_MIME;
use crate::multipart;
use crate::pages;
use crate::workspace::{Workspace, OUTPUT_FILE_NAME};

/// Form field that carries the uploaded images. Parts under any other
/// name are ignored.
pub const UPLOAD_FIELD: &str = "image";

/// Upper bound on a request body. A batch of photos fits comfortably;
/// anything larger is rejected before allocation.
const MAX_BODY_BYTES: usize = 256 * 1024 * 1024;

const MAX_HEADER_LINE_BYTES: usize = 8 * 1024;
const MAX_HEADER_COUNT: usize = 100;

/// Idle connections (browser preconnects and the like) are dropped after
/// this long without a complete request.
const READ_TIMEOUT: Duration = Duration::from_secs(60);

// ──────────────────────────────────────────────────────────────────────────
// Request / response types
// ──────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Request {
    pub method: String,
    /// Request path with any query string stripped.
    pub path: String,
    headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug)]
pub struct Response {
    pub status: u16,
    headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    fn new(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body,
        }
    }

    pub fn html(status: u16, body: Vec<u8>) -> Self {
        Self::new(status, "text/html; charset=utf-8", body)
    }

    /// The generated document as a download.
    pub fn attachment(body: Vec<u8>) -> Self {
        let mut response = Self::new(200, DOCX_MIME, body);
        response.headers.push((
            "Content-Disposition".to_string(),
            format!("attachment; filename=\"{OUTPUT_FILE_NAME}\""),
        ));
        response
    }

    fn text(status: u16, message: &str) -> Self {
        Self::new(status, "text/plain; charset=utf-8", message.as_bytes().to_vec())
    }

    pub fn bad_request() -> Self {
        Self::text(400, "Bad Request")
    }

    pub fn not_found() -> Self {
        Self::text(404, "Not Found")
    }

    pub fn method_not_allowed(allow: &str) -> Self {
        let mut response = Self::text(405, "Method Not Allowed");
        response
            .headers
            .push(("Allow".to_string(), allow.to_string()));
        response
    }

    pub fn internal_error() -> Self {
        Self::text(500, "Internal Server Error")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// ──────────────────────────────────────────────────────────────────────────
// Accept loop
// ──────────────────────────────────────────────────────────────────────────

pub struct Server {
    workspace: Arc<Workspace>,
}

impl Server {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }

    /// Accept connections forever, one thread per connection. The caller
    /// binds the listener so tests can use an ephemeral port.
    pub fn serve(&self, listener: TcpListener) -> io::Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "listening");
        }
        loop {
            let (stream, peer) = match listener.accept() {
                Ok(pair) => pair,
                Err(error) => {
                    warn!(%error, "failed to accept a connection");
                    thread::sleep(Duration::from_millis(50));
                    continue;
                }
            };
            let workspace = Arc::clone(&self.workspace);
            thread::spawn(move || {
                if let Err(error) = handle_connection(&workspace, stream) {
                    debug!(%error, %peer, "connection ended with an error");
                }
            });
        }
    }
}

fn handle_connection(workspace: &Workspace, mut stream: TcpStream) -> io::Result<()> {
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let request = match read_request(&mut stream) {
        Ok(Some(request)) => request,
        // Peer opened the connection and closed it without a request.
        Ok(None) => return Ok(()),
        Err(ReadError::Malformed(reason)) => {
            debug!(reason, "rejecting malformed request");
            return write_response(&mut stream, &Response::bad_request());
        }
        Err(ReadError::Io(error)) => return Err(error),
    };
    let response = route(workspace, &request);
    info!(
        method = %request.method,
        path = %request.path,
        status = response.status,
        "handled request"
    );
    write_response(&mut stream, &response)
}

// ──────────────────────────────────────────────────────────────────────────
// Routing
// ──────────────────────────────────────────────────────────────────────────

fn route(workspace: &Workspace, request: &Request) -> Response {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/") => Response::html(200, pages::UPLOAD_FORM.into()),
        ("POST", "/upload") => handle_upload(workspace, request),
        ("GET", "/download") => handle_download_page(workspace),
        ("GET", "/download_file") => handle_download_file(workspace),
        (_, "/upload") => Response::method_not_allowed("POST"),
        (_, "/" | "/download" | "/download_file") => Response::method_not_allowed("GET"),
        _ => Response::not_found(),
    }
}

/// Reset the workspace, persist the accepted parts, regenerate the
/// document, confirm with the count. Any filesystem or image failure
/// fails the whole request.
fn handle_upload(workspace: &Workspace, request: &Request) -> Response {
    let Some(boundary) = request
        .header("content-type")
        .and_then(multipart::boundary_from_content_type)
    else {
        debug!("upload without a multipart content type");
        return Response::bad_request();
    };
    let parts = match multipart::parse(&request.body, &boundary) {
        Ok(parts) => parts,
        Err(reason) => {
            debug!(%reason, "rejecting unparseable upload body");
            return Response::bad_request();
        }
    };

    let _guard = workspace.lock_upload();
    if let Err(error) = workspace.reset() {
        error!(%error, "workspace reset failed");
        return Response::internal_error();
    }

    let mut saved: Vec<PathBuf> = Vec::new();
    for part in &parts {
        if part.name != UPLOAD_FIELD {
            continue;
        }
        // An empty filename is an empty file-input submission, not a file.
        let Some(file_name) = part.file_name.as_deref() else {
            continue;
        };
        if file_name.is_empty() {
            continue;
        }
        match workspace.save_upload(file_name, &part.data) {
            Ok(path) => saved.push(path),
            Err(error) => {
                error!(%error, file_name, "failed to store an upload");
                return Response::internal_error();
            }
        }
    }

    if let Err(error) = crate::generate_to_file(&saved, &workspace.output_path()) {
        error!(%error, "document generation failed");
        return Response::internal_error();
    }
    info!(images = saved.len(), "generated document");
    Response::html(200, pages::result_page(saved.len()).into_bytes())
}

fn handle_download_page(workspace: &Workspace) -> Response {
    if workspace.output_exists() {
        Response::html(200, pages::DOWNLOAD_PAGE.into())
    } else {
        Response::html(200, pages::NOT_FOUND_FRAGMENT.into())
    }
}

fn handle_download_file(workspace: &Workspace) -> Response {
    let path = workspace.output_path();
    match std::fs::read(&path) {
        Ok(bytes) => Response::attachment(bytes),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            Response::html(200, pages::NOT_FOUND_FRAGMENT.into())
        }
        Err(error) => {
            error!(%error, path = %path.display(), "failed to read the generated document");
            Response::internal_error()
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────
// Wire reading and writing
// ──────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum ReadError {
    Io(io::Error),
    Malformed(&'static str),
}

impl From<io::Error> for ReadError {
    fn from(error: io::Error) -> Self {
        ReadError::Io(error)
    }
}

/// Read one request. `Ok(None)` means the peer closed the connection
/// before sending anything.
fn read_request<R: Read>(stream: R) -> Result<Option<Request>, ReadError> {
    let mut reader = BufReader::new(stream);

    let Some(request_line) = read_line(&mut reader)? else {
        return Ok(None);
    };
    let mut pieces = request_line.split_whitespace();
    let (Some(method), Some(target), Some(version)) =
        (pieces.next(), pieces.next(), pieces.next())
    else {
        return Err(ReadError::Malformed("request line does not have three fields"));
    };
    if !version.starts_with("HTTP/") {
        return Err(ReadError::Malformed("unrecognized protocol version"));
    }
    let path = match target.find('?') {
        Some(query) => &target[..query],
        None => target,
    };

    let mut headers = Vec::new();
    loop {
        let Some(line) = read_line(&mut reader)? else {
            return Err(ReadError::Malformed("connection closed inside the header block"));
        };
        if line.is_empty() {
            break;
        }
        if headers.len() >= MAX_HEADER_COUNT {
            return Err(ReadError::Malformed("too many headers"));
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(ReadError::Malformed("header line without a colon"));
        };
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let content_length = match headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
    {
        Some((_, value)) => value
            .trim()
            .parse::<usize>()
            .map_err(|_| ReadError::Malformed("unparseable content-length"))?,
        None => 0,
    };
    if content_length > MAX_BODY_BYTES {
        return Err(ReadError::Malformed("body larger than the accepted limit"));
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    Ok(Some(Request {
        method: method.to_string(),
        path: path.to_string(),
        headers,
        body,
    }))
}

/// Read a CRLF-terminated line, stripping the terminator. `Ok(None)` on
/// immediate end of stream.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, ReadError> {
    let mut line = Vec::new();
    let n = reader
        .take((MAX_HEADER_LINE_BYTES + 1) as u64)
        .read_until(b'\n', &mut line)?;
    if n == 0 {
        return Ok(None);
    }
    if line.len() > MAX_HEADER_LINE_BYTES {
        return Err(ReadError::Malformed("header line too long"));
    }
    while line.last() == Some(&b'\n') || line.last() == Some(&b'\r') {
        line.pop();
    }
    String::from_utf8(line)
        .map(Some)
        .map_err(|_| ReadError::Malformed("header bytes are not valid UTF-8"))
}

fn write_response<W: Write>(writer: &mut W, response: &Response) -> io::Result<()> {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\n",
        response.status,
        status_reason(response.status)
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
    head.push_str("Connection: close\r\n\r\n");
    writer.write_all(head.as_bytes())?;
    writer.write_all(&response.body)?;
    writer.flush()
}

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "",
    }
}
