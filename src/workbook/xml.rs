//! Small helpers over `roxmltree` for SpreadsheetML parts.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use roxmltree::Node;

use super::WorkbookError;

pub fn decode_text<'a>(name: &str, data: &'a [u8]) -> Result<&'a str, WorkbookError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| WorkbookError::Parse(format!("{} is not UTF-8: {}", name, e)))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

pub fn parse_error(name: &str, err: roxmltree::Error) -> WorkbookError {
    WorkbookError::Parse(format!("{}: {}", name, err))
}

/// Attribute lookup by local name, ignoring the namespace (`r:id`).
pub fn attribute_local<'a>(node: Node<'a, '_>, local: &str) -> Option<&'a str> {
    node.attributes()
        .find(|a| a.name() == local)
        .map(|a| a.value())
}

/// First child element with the given local name.
pub fn child<'a, 'input>(node: Node<'a, 'input>, local: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.is_element() && c.has_tag_name(local))
}

/// Concatenated `<t>` runs of a string item (`<si>` or `<is>`), skipping
/// phonetic runs.
pub fn rich_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.has_tag_name("t"))
        .filter(|n| !n.ancestors().any(|a| a.has_tag_name("rPh")))
        .filter_map(|n| n.text())
        .map(decode_xstring)
        .collect()
}

/// The namespace prefix an element was written with, including the colon
/// (`"x:"`), or `""` for the default namespace.
pub fn element_prefix<'a>(source: &'a str, node: Node<'_, '_>) -> &'a str {
    let tag = &source[node.range().start + 1..];
    let end = tag
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(tag.len());
    let qname = &tag[..end];
    match qname.rfind(':') {
        Some(i) => &qname[..=i],
        None => "",
    }
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Escaped markup for cell text or formula content.
pub fn escape_xstring(text: &str) -> String {
    escape_text(&encode_xstring(text))
}

fn xstring_escape() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("_x([0-9A-Fa-f]{4})_").expect("escape pattern is valid"))
}

/// Whether `text` opens with an `_xHHHH_` escape.
fn starts_with_escape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 7
        && bytes[0] == b'_'
        && bytes[1] == b'x'
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}

/// Writes characters XML cannot carry as `_xHHHH_`. An underscore that
/// would otherwise read as the start of an escape becomes `_x005F_`.
pub fn encode_xstring(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        match c {
            '\t' | '\n' | '\r' => out.push(c),
            '_' if starts_with_escape(&text[i..]) => out.push_str("_x005F_"),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {
                out.push_str(&format!("_x{:04X}_", c as u32))
            }
            c => out.push(c),
        }
    }
    out
}

/// Reverses [`encode_xstring`]. Escaped surrogate pairs are joined and
/// unpaired surrogates become U+FFFD.
pub fn decode_xstring(text: &str) -> String {
    if !text.contains("_x") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut units: Vec<u16> = Vec::new();
    let mut last = 0;

    for caps in xstring_escape().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() != last {
            flush_units(&mut out, &mut units);
            out.push_str(&text[last..whole.start()]);
        }
        if let Ok(unit) = u16::from_str_radix(&caps[1], 16) {
            units.push(unit);
        }
        last = whole.end();
    }

    flush_units(&mut out, &mut units);
    out.push_str(&text[last..]);
    out
}

fn flush_units(out: &mut String, units: &mut Vec<u16>) {
    out.extend(
        char::decode_utf16(units.drain(..)).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
}

/// A pending replacement of a byte range in a part.
#[derive(Debug, Clone)]
pub struct Splice {
    pub range: Range<usize>,
    pub text: String,
}

impl Splice {
    pub fn replace(range: Range<usize>, text: String) -> Self {
        Self { range, text }
    }

    pub fn insert(at: usize, text: String) -> Self {
        Self {
            range: at..at,
            text,
        }
    }
}

/// Applies non-overlapping splices to `source`.
pub fn apply(source: &str, mut splices: Vec<Splice>) -> String {
    splices.sort_by_key(|s| std::cmp::Reverse(s.range.start));
    let mut out = source.to_string();
    for splice in splices {
        out.replace_range(splice.range, &splice.text);
    }
    out
}

/// Removes every element matching `pred` from the part text.
pub fn remove_elements(
    part: &str,
    text: &str,
    pred: impl Fn(Node<'_, '_>) -> bool,
) -> Result<String, WorkbookError> {
    let doc = roxmltree::Document::parse(text).map_err(|e| parse_error(part, e))?;
    let splices = doc
        .descendants()
        .filter(|n| n.is_element() && pred(*n))
        .map(|n| Splice::replace(n.range(), String::new()))
        .collect();
    Ok(apply(text, splices))
}

/// Splice that appends `content` as the last child of `node`, expanding a
/// self-closing element when needed.
pub fn append_child(source: &str, node: Node<'_, '_>, content: &str) -> Splice {
    let range = node.range();
    let element = &source[range.clone()];

    if element.ends_with("/>") {
        let open = element[..element.len() - 2].trim_end();
        let qname = format!(
            "{}{}",
            element_prefix(source, node),
            node.tag_name().name()
        );
        return Splice::replace(range, format!("{}>{}</{}>", open, content, qname));
    }

    let close = element.rfind("</").map_or(range.end, |i| range.start + i);
    Splice::insert(close, content.to_string())
}
