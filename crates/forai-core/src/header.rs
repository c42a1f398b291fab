//! Header codec: the `//FORAI:...//` line embedded in source files.
//!
//! Grammar (one logical line):
//!
//! ```text
//! //FORAI:<file_id>;DEF[<defs>];IMP[<imps>];EXP[<exps>][;LANG[<language>]]//
//! ```
//!
//! All bracket groups are always present, even when empty. Entry splitting
//! inside a group is bracket-depth aware: a comma inside an open `<...>`
//! parent list does not terminate a `DEF[]` entry. Decoding is tolerant —
//! a missing sentinel yields `None`, a malformed group degrades to empty
//! rather than failing, so a corrupted header never blocks re-analysis.

use crate::model::{Definition, FileAnalysis, FileId, Language, ParentRef, SymbolRef};
use crate::placement;

/// Sentinel opening the header line.
pub const SENTINEL_PREFIX: &str = "//FORAI:";

/// Sentinel closing the header line.
pub const SENTINEL_SUFFIX: &str = "//";

/// Headers are only searched for within this many characters of the start
/// of a file.
pub const SCAN_LIMIT: usize = 2000;

/// Serialize an analysis into header text. Deterministic: entry order
/// follows the record; empty groups render as empty bracket pairs. The
/// `LANG[]` group is emitted for non-Python languages only.
pub fn encode(analysis: &FileAnalysis) -> String {
    let defs: Vec<String> = analysis.definitions.iter().map(encode_definition).collect();
    let imps: Vec<String> = analysis.imports.iter().map(|i| i.to_string()).collect();
    let exps: Vec<String> = analysis.exports.iter().map(|e| e.to_string()).collect();

    let mut header = format!(
        "{}{};DEF[{}];IMP[{}];EXP[{}]",
        SENTINEL_PREFIX,
        analysis.file_id,
        defs.join(","),
        imps.join(","),
        exps.join(","),
    );
    if analysis.language != Language::Python {
        header.push_str(&format!(";LANG[{}]", analysis.language.name()));
    }
    header.push_str(SENTINEL_SUFFIX);
    header
}

fn encode_definition(def: &Definition) -> String {
    if def.parents.is_empty() {
        format!("{}:{}", def.id, def.name)
    } else {
        let parents: Vec<String> = def.parents.iter().map(|p| p.to_string()).collect();
        format!("{}:{}<{}>", def.id, def.name, parents.join(","))
    }
}

/// Locate the raw header text (sentinels included) within the scan prefix
/// of a file. Returns the byte range and the text.
pub fn locate(content: &str) -> Option<(std::ops::Range<usize>, &str)> {
    let limit = content
        .char_indices()
        .nth(SCAN_LIMIT)
        .map(|(i, _)| i)
        .unwrap_or(content.len());
    let prefix = &content[..limit];

    let start = prefix.find(SENTINEL_PREFIX)?;
    let body_start = start + SENTINEL_PREFIX.len();
    // Closing sentinel must sit on the same line.
    let line_end = prefix[body_start..]
        .find('\n')
        .map(|i| body_start + i)
        .unwrap_or(prefix.len());
    let rel = prefix[body_start..line_end].find(SENTINEL_SUFFIX)?;
    let end = body_start + rel + SENTINEL_SUFFIX.len();
    Some((start..end, &content[start..end]))
}

/// Extract just the header text from file content, if present.
pub fn extract(content: &str) -> Option<&str> {
    locate(content).map(|(_, text)| text)
}

/// Decode header text into an analysis record. Never fails: a malformed
/// file id degrades to `FileId::UNKNOWN`, malformed groups to empty lists.
pub fn decode(header: &str) -> FileAnalysis {
    let body = header
        .strip_prefix(SENTINEL_PREFIX)
        .and_then(|s| s.strip_suffix(SENTINEL_SUFFIX))
        .unwrap_or(header);

    let (id_part, rest) = match body.split_once(';') {
        Some((id, rest)) => (id, rest),
        None => (body, ""),
    };
    let file_id = id_part.parse::<FileId>().unwrap_or(FileId::UNKNOWN);

    let mut analysis = FileAnalysis::empty(file_id);
    for (tag, inner) in groups(rest) {
        match tag {
            "DEF" => {
                analysis.definitions = split_entries(inner)
                    .into_iter()
                    .filter_map(decode_definition)
                    .collect();
            }
            "IMP" => {
                analysis.imports = split_entries(inner)
                    .into_iter()
                    .filter_map(|e| e.trim().parse::<SymbolRef>().ok())
                    .collect();
            }
            "EXP" => {
                analysis.exports = split_entries(inner)
                    .into_iter()
                    .filter_map(|e| e.trim().parse().ok())
                    .collect();
            }
            "LANG" => {
                analysis.language = Language::from_name(inner.trim());
            }
            _ => {}
        }
    }
    analysis
}

/// Decode the header embedded in file content, if any.
pub fn decode_file(content: &str) -> Option<FileAnalysis> {
    extract(content).map(decode)
}

/// Iterate `TAG[inner]` groups of a header body. Square brackets nest (a
/// malformed inner `[` would otherwise truncate the group).
fn groups(body: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let Some(open_rel) = body[i..].find('[') else {
            break;
        };
        let open = i + open_rel;
        let tag = body[i..open].trim_matches(|c: char| c == ';' || c.is_whitespace());
        let mut depth = 0usize;
        let mut close = None;
        for (j, &b) in bytes.iter().enumerate().skip(open) {
            match b {
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(j);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else { break };
        out.push((tag, &body[open + 1..close]));
        i = close + 1;
    }
    out
}

/// Split a bracket group's comma-delimited entries, ignoring commas nested
/// inside `<...>` parent lists. Mandatory: naive splitting corrupts any
/// definition with more than one parent.
fn split_entries(inner: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    if inner.trim().is_empty() {
        return entries;
    }
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                entries.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&inner[start..]);
    entries
}

fn decode_definition(entry: &str) -> Option<Definition> {
    let entry = entry.trim();
    let (id_part, rest) = entry.split_once(':')?;
    let id = id_part.trim().parse().ok()?;

    let (name, parents) = match rest.find('<') {
        Some(open) => {
            let name = &rest[..open];
            let list = rest[open + 1..].strip_suffix('>').unwrap_or(&rest[open + 1..]);
            let parents = split_entries(list)
                .into_iter()
                .map(|p| ParentRef::parse(p.trim()))
                .collect();
            (name, parents)
        }
        None => (rest, Vec::new()),
    };
    if name.is_empty() {
        return None;
    }
    Some(Definition {
        id,
        name: name.to_string(),
        parents,
    })
}

/// Insert or replace a header in file content.
///
/// An existing header (within the scan prefix) is replaced in place,
/// preserving the rest of the file byte-for-byte; re-running with the same
/// header is a fixed point. Otherwise the header is inserted at the
/// language's placement point with one blank line guaranteed after it.
pub fn locate_or_insert(content: &str, header: &str, language: Language) -> String {
    if let Some((range, existing)) = locate(content) {
        if existing == header {
            return content.to_string();
        }
        let mut out = String::with_capacity(content.len() + header.len());
        out.push_str(&content[..range.start]);
        out.push_str(header);
        out.push_str(&content[range.end..]);
        return out;
    }

    let at = placement::insertion_point(language, content);
    let rest = &content[at..];
    let mut out = String::with_capacity(content.len() + header.len() + 2);
    out.push_str(&content[..at]);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(header);
    out.push('\n');
    // One blank line between the header and following content.
    if !rest.is_empty() && !rest.starts_with('\n') {
        out.push('\n');
    }
    out.push_str(rest);
    out
}
