//! # Multipart Form Parsing
//!
//! Parses `multipart/form-data` request bodies the way browsers emit them:
//! dash-boundary delimiter lines, per-part headers, raw content up to the
//! next delimiter, a `--` suffix on the final one. Framing is byte-exact
//! (a delimiter only counts when preceded by CRLF) so binary image content
//! passes through untouched. Parse failures return a reason string the
//! server turns into a 400 response.

/// One part of a parsed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// The form field name.
    pub name: String,
    /// The client-supplied filename. `None` for plain fields; file inputs
    /// submitted empty arrive as `Some("")`.
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// Extract the boundary parameter from a `Content-Type` header value.
/// Returns `None` unless the value is `multipart/form-data` with a
/// non-empty boundary.
pub fn boundary_from_content_type(value: &str) -> Option<String> {
    let mut sections = value.split(';');
    let mime = sections.next()?.trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    for param in sections {
        let (key, val) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            let val = val.trim().trim_matches('"');
            if !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

/// Parse a complete body into its parts, in order.
pub fn parse(body: &[u8], boundary: &str) -> Result<Vec<Part>, String> {
    if boundary.is_empty() {
        return Err("empty boundary".to_string());
    }
    let delimiter = format!("--{boundary}").into_bytes();

    // Anything before the first delimiter is preamble.
    let mut pos = find(body, &delimiter, 0).ok_or("missing opening boundary")?;
    pos += delimiter.len();

    let mut parts = Vec::new();
    loop {
        // After a delimiter: "--" closes the body, CRLF opens a part.
        if body[pos.min(body.len())..].starts_with(b"--") {
            break;
        }
        if !body[pos.min(body.len())..].starts_with(b"\r\n") {
            return Err("malformed boundary line".to_string());
        }
        pos += 2;

        let headers_end = find(body, b"\r\n\r\n", pos).ok_or("part headers not terminated")?;
        let headers = std::str::from_utf8(&body[pos..headers_end])
            .map_err(|_| "part headers are not valid UTF-8".to_string())?;
        let (name, file_name) = parse_content_disposition(headers)?;

        let content_start = headers_end + 4;
        let mut probe = content_start;
        let content_end = loop {
            let hit = find(body, &delimiter, probe).ok_or("missing closing boundary")?;
            if hit >= 2 && &body[hit - 2..hit] == b"\r\n" {
                break hit - 2;
            }
            probe = hit + delimiter.len();
        };

        parts.push(Part {
            name,
            file_name,
            data: body[content_start..content_end].to_vec(),
        });
        pos = content_end + 2 + delimiter.len();
    }
    Ok(parts)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// Pull the field name and optional filename out of a part's header block.
fn parse_content_disposition(headers: &str) -> Result<(String, Option<String>), String> {
    for line in headers.split("\r\n") {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("content-disposition") {
            continue;
        }
        let mut name = None;
        let mut file_name = None;
        for (k, v) in disposition_params(value) {
            match k.as_str() {
                "name" => name = Some(v),
                "filename" => file_name = Some(v),
                _ => {}
            }
        }
        return name
            .map(|n| (n, file_name))
            .ok_or_else(|| "content-disposition missing a field name".to_string());
    }
    Err("part is missing its content-disposition header".to_string())
}

/// Split a header value into parameters, honoring quoted strings so
/// filenames may contain semicolons and escaped quotes.
fn disposition_params(value: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = value.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(';') | Some(' ') | Some('\t')) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ';' {
                break;
            }
            key.push(c);
            chars.next();
        }
        let key = key.trim().to_ascii_lowercase();

        if chars.peek() != Some(&'=') {
            // A bare token such as "form-data".
            if !key.is_empty() {
                params.push((key, String::new()));
            }
            continue;
        }
        chars.next();

        let mut val = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            val.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => val.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ';' {
                    break;
                }
                val.push(c);
                chars.next();
            }
            val = val.trim().to_string();
        }
        params.push((key, val));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "----FormBoundaryAbc123";

    fn build_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, file_name, data) in parts {
            out.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let disposition = match file_name {
                Some(f) => format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n"
                ),
                None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n"),
            };
            out.extend_from_slice(disposition.as_bytes());
            out.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        out
    }

    #[test]
    fn boundary_extraction() {
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=----X"),
            Some("----X".to_string())
        );
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=\"quoted\""),
            Some("quoted".to_string())
        );
        assert_eq!(
            boundary_from_content_type("Multipart/Form-Data; charset=utf-8; boundary=b"),
            Some("b".to_string())
        );
        assert_eq!(boundary_from_content_type("application/json"), None);
        assert_eq!(boundary_from_content_type("multipart/form-data"), None);
        assert_eq!(boundary_from_content_type("multipart/form-data; boundary="), None);
    }

    #[test]
    fn single_file_part() {
        let body = build_body(&[("image", Some("a.jpg"), b"\xFF\xD8jpegbytes")]);
        let parts = parse(&body, BOUNDARY).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "image");
        assert_eq!(parts[0].file_name.as_deref(), Some("a.jpg"));
        assert_eq!(parts[0].data, b"\xFF\xD8jpegbytes");
    }

    #[test]
    fn multiple_parts_keep_order() {
        let body = build_body(&[
            ("image", Some("1.png"), b"one"),
            ("image", Some("2.png"), b"two"),
            ("note", None, b"hello"),
        ]);
        let parts = parse(&body, BOUNDARY).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].file_name.as_deref(), Some("1.png"));
        assert_eq!(parts[1].file_name.as_deref(), Some("2.png"));
        assert_eq!(parts[2].name, "note");
        assert_eq!(parts[2].file_name, None);
        assert_eq!(parts[2].data, b"hello");
    }

    #[test]
    fn empty_file_input_has_an_empty_filename() {
        let body = build_body(&[("image", Some(""), b"")]);
        let parts = parse(&body, BOUNDARY).unwrap();
        assert_eq!(parts[0].file_name.as_deref(), Some(""));
        assert!(parts[0].data.is_empty());
    }

    #[test]
    fn binary_content_with_embedded_crlf_and_dashes_survives() {
        let tricky = b"\r\n--not-the-boundary\r\n\x00\x01--".to_vec();
        let body = build_body(&[("image", Some("t.bin"), &tricky)]);
        let parts = parse(&body, BOUNDARY).unwrap();
        assert_eq!(parts[0].data, tricky);
    }

    #[test]
    fn delimiter_bytes_inside_content_need_a_crlf_to_close() {
        // The delimiter appears mid-content without a preceding CRLF and
        // must not terminate the part.
        let mut data = b"prefix".to_vec();
        data.extend_from_slice(format!("--{BOUNDARY}").as_bytes());
        data.extend_from_slice(b"suffix");
        let body = build_body(&[("image", Some("t.bin"), &data)]);
        let parts = parse(&body, BOUNDARY).unwrap();
        assert_eq!(parts[0].data, data);
    }

    #[test]
    fn unicode_filenames_pass_through() {
        let body = build_body(&[("image", Some("사진 1.png"), b"x")]);
        let parts = parse(&body, BOUNDARY).unwrap();
        assert_eq!(parts[0].file_name.as_deref(), Some("사진 1.png"));
    }

    #[test]
    fn quoted_filename_with_semicolon_and_escaped_quote() {
        let raw = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
             filename=\"a;b\\\"c.png\"\r\n\r\nx\r\n--{BOUNDARY}--\r\n"
        );
        let parts = parse(raw.as_bytes(), BOUNDARY).unwrap();
        assert_eq!(parts[0].file_name.as_deref(), Some("a;b\"c.png"));
    }

    #[test]
    fn missing_closing_boundary_is_an_error() {
        let mut body = build_body(&[("image", Some("a.png"), b"data")]);
        body.truncate(body.len() - (BOUNDARY.len() + 6));
        assert!(parse(&body, BOUNDARY).is_err());
    }

    #[test]
    fn missing_opening_boundary_is_an_error() {
        assert!(parse(b"no delimiters here", BOUNDARY).is_err());
    }

    #[test]
    fn part_without_disposition_is_an_error() {
        let raw = format!("--{BOUNDARY}\r\nContent-Type: text/plain\r\n\r\nx\r\n--{BOUNDARY}--\r\n");
        assert!(parse(raw.as_bytes(), BOUNDARY).is_err());
    }

    #[test]
    fn preamble_before_the_first_boundary_is_ignored() {
        let mut body = b"This is the preamble.\r\n".to_vec();
        body.extend_from_slice(&build_body(&[("image", Some("a.png"), b"data")]));
        let parts = parse(&body, BOUNDARY).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].data, b"data");
    }
}
