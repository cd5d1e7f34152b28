use super::error::FilterError;

#[cfg(windows)]
pub const LINE_ENDING: &[u8] = b"\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &[u8] = b"\n";

/// A single header field.
///
/// Parsed headers keep their physical source lines so that anything we don't
/// touch is written back byte for byte. `value` is the unfolded text used for
/// lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: String,
    lines: Vec<Vec<u8>>,
}

impl Header {
    /// Build a new single-line header
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            lines: vec![format!("{}: {}", name, value).into_bytes()],
        }
    }

    /// Build a header from its physical lines (first line plus continuations).
    /// Lines that don't look like `name: value` become opaque headers with an
    /// empty name.
    fn from_lines(lines: Vec<Vec<u8>>) -> Self {
        let first = &lines[0];

        let (name, value_start) = match first.iter().position(|&b| b == b':') {
            Some(colon) => {
                let name = String::from_utf8_lossy(&first[..colon]);
                let name = name.trim_end();
                if is_field_name(name) {
                    (name.to_string(), colon + 1)
                } else {
                    (String::new(), 0)
                }
            }
            None => (String::new(), 0),
        };

        // Unfold: continuation lines are joined with a single space
        let mut value = String::from_utf8_lossy(&first[value_start..])
            .trim()
            .to_string();
        for line in &lines[1..] {
            let part = String::from_utf8_lossy(line);
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(part);
        }

        Self { name, value, lines }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Original lines, without line terminators
    pub fn raw_lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    /// Case-insensitive name match. Opaque headers never match.
    pub fn is_named(&self, name: &str) -> bool {
        !self.name.is_empty() && self.name.eq_ignore_ascii_case(name)
    }
}

/// RFC 5322 field names: printable ASCII, no space, no colon
fn is_field_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| (33..=126).contains(&b) && b != b':')
}

/// An email split into an ordered header list and an opaque body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    headers: Vec<Header>,
    body: Vec<u8>,
}

impl Message {
    /// Parse a raw message. Accepts LF and CRLF line endings and folded
    /// headers. The only failure is a missing blank line between headers and
    /// body.
    pub fn parse(raw: &[u8]) -> Result<Self, FilterError> {
        let mut headers = Vec::new();
        let mut current: Vec<Vec<u8>> = Vec::new();
        let mut pos = 0;

        while let Some(offset) = raw[pos..].iter().position(|&b| b == b'\n') {
            let end = pos + offset;
            let line = strip_cr(&raw[pos..end]);
            pos = end + 1;

            // Empty line marks end of headers
            if line.is_empty() {
                if !current.is_empty() {
                    headers.push(Header::from_lines(std::mem::take(&mut current)));
                }
                return Ok(Self {
                    headers,
                    body: raw[pos..].to_vec(),
                });
            }

            let is_continuation = line[0] == b' ' || line[0] == b'\t';
            if !is_continuation && !current.is_empty() {
                headers.push(Header::from_lines(std::mem::take(&mut current)));
            }
            current.push(line.to_vec());
        }

        Err(FilterError::MissingSeparator)
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// First header with the given name
    pub fn find(&self, name: &str) -> Option<&Header> {
        self.headers.iter().find(|h| h.is_named(name))
    }

    /// All headers with the given name, in message order
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Header> + 'a {
        self.headers.iter().filter(move |h| h.is_named(name))
    }

    /// Append a header after all existing ones
    pub fn append(&mut self, name: &str, value: &str) {
        self.headers.push(Header::new(name, value));
    }

    /// Remove every header with the given name, keeping the order of the rest.
    /// Returns how many were removed.
    pub fn remove_all(&mut self, name: &str) -> usize {
        let before = self.headers.len();
        self.headers.retain(|h| !h.is_named(name));
        before - self.headers.len()
    }

    /// Render back to bytes using the platform line ending for the header
    /// block. The body is copied as is.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + self.headers.len() * 80);
        for header in &self.headers {
            for line in &header.lines {
                out.extend_from_slice(line);
                out.extend_from_slice(LINE_ENDING);
            }
        }
        out.extend_from_slice(LINE_ENDING);
        out.extend_from_slice(&self.body);
        out
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
