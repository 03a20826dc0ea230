//! content::document
//!
//! Front-matter codec: parsing and serializing the metadata+body document
//! format collection members are stored in.
//!
//! # Format
//!
//! An optional leading metadata block of `key: value` lines delimited by
//! `---` marker lines, a blank separator line, then the body:
//!
//! ```text
//! ---
//! title: Hello
//! order: 2
//! ---
//!
//! Body text.
//! ```
//!
//! # Tolerance
//!
//! Parsing never fails. A document with no metadata block, an unterminated
//! opening marker, or malformed attribute lines still parses; whatever
//! cannot be read as metadata is body, and unreadable lines inside a block
//! are skipped. Attribute order is preserved so unknown keys round-trip
//! byte-for-byte in serialization order.

use indexmap::IndexMap;

/// Marker line delimiting the metadata block.
const DELIMITER: &str = "---";

/// Attribute key carrying the explicit document title.
const TITLE_KEY: &str = "title";

/// Attribute key carrying the collection ordering.
const ORDER_KEY: &str = "order";

/// One attribute value: the open front-matter schema admits strings and
/// numbers only.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Free-form text
    Str(String),
    /// Numeric value (anything that reads as a finite float)
    Num(f64),
}

impl AttrValue {
    /// Parse a raw attribute value. Finite numbers become `Num`, everything
    /// else stays `Str`.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => AttrValue::Num(n),
            _ => AttrValue::Str(raw.to_string()),
        }
    }

    /// The value as attribute-line text.
    pub fn as_text(&self) -> String {
        match self {
            AttrValue::Str(s) => s.clone(),
            AttrValue::Num(n) => format_number(*n),
        }
    }

    /// The numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Num(n) => Some(*n),
            AttrValue::Str(_) => None,
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

/// Ordered, open attribute mapping.
pub type AttrMap = IndexMap<String, AttrValue>;

/// A parsed collection member.
///
/// Constructed per request from raw repository content and never persisted
/// in memory beyond it; the repository is the only durable store. `id` is
/// the source blob sha, stable until the next edit, which is exactly the
/// lifetime callers may rely on it for.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Source blob sha at fetch time
    pub id: String,
    /// Explicit `title` attribute, else the file stem
    pub title: String,
    /// Repository-relative path
    pub path: String,
    /// Open metadata mapping, insertion-ordered
    pub attributes: AttrMap,
    /// Text after the metadata block
    pub body: String,
}

impl Document {
    /// Parse raw file content into a document. Never fails.
    pub fn parse(raw: &str, path: &str, sha: &str) -> Self {
        let (attributes, body) = split_front_matter(raw);
        let title = attributes
            .get(TITLE_KEY)
            .map(|v| v.as_text())
            .unwrap_or_else(|| file_stem(path).to_string());

        Document {
            id: sha.to_string(),
            title,
            path: path.to_string(),
            attributes,
            body,
        }
    }

    /// Serialize back to the on-disk format.
    ///
    /// Re-emits the metadata block one `key: value` line per attribute in
    /// map order, a blank line, then the body. Documents with no
    /// attributes serialize to the bare body. Left inverse of [`parse`]
    /// over the attributes and body actually present.
    ///
    /// [`parse`]: Document::parse
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        if !self.attributes.is_empty() {
            out.push_str(DELIMITER);
            out.push('\n');
            for (key, value) in &self.attributes {
                out.push_str(key);
                out.push_str(": ");
                out.push_str(&value.as_text());
                out.push('\n');
            }
            out.push_str(DELIMITER);
            out.push_str("\n\n");
        }
        out.push_str(&self.body);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    /// The document's position value within its collection, if any.
    pub fn order(&self) -> Option<f64> {
        self.attributes.get(ORDER_KEY).and_then(|v| v.as_number())
    }

    /// Set the position value, preserving every other attribute.
    pub fn set_order(&mut self, position: usize) {
        self.attributes
            .insert(ORDER_KEY.to_string(), AttrValue::Num(position as f64));
    }
}

/// Split raw content into its metadata block and body.
fn split_front_matter(raw: &str) -> (AttrMap, String) {
    let mut attributes = AttrMap::new();

    let after_open = match raw
        .strip_prefix(DELIMITER)
        .map(|r| r.strip_prefix('\r').unwrap_or(r))
        .and_then(|r| r.strip_prefix('\n'))
    {
        Some(rest) => rest,
        None => return (attributes, trim_trailing_newlines(raw)),
    };

    // Find the closing marker line; without one the whole text is body.
    let mut offset = 0;
    let mut close = None;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            close = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let Some((block_end, body_start)) = close else {
        return (attributes, trim_trailing_newlines(raw));
    };

    for line in after_open[..block_end].lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        attributes.insert(key.to_string(), AttrValue::parse(value.trim()));
    }

    (attributes, body_after_block(&after_open[body_start..]))
}

/// Strip the blank separator line after the closing marker, plus trailing
/// newline runs. Leading content is otherwise preserved verbatim so a body
/// that itself begins with a marker line survives a round trip.
fn body_after_block(rest: &str) -> String {
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);
    trim_trailing_newlines(rest)
}

/// Trailing newline runs are incidental; everything else is content.
fn trim_trailing_newlines(body: &str) -> String {
    body.trim_end_matches(|c| c == '\n' || c == '\r').to_string()
}

/// Base name of a path without its extension.
fn file_stem(path: &str) -> &str {
    let name = path.rsplit_once('/').map_or(path, |(_, name)| name);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Format a number the way attribute lines carry them: integers without a
/// fractional part.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
