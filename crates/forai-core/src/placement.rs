//! Per-language header placement rules.
//!
//! Each language declares where a freshly inserted header belongs:
//!
//! - Python: after the shebang, an encoding declaration, and leading blank
//!   lines.
//! - PHP: on the line after the opening `<?php` tag.
//! - JavaScript: after a leading comment block (either a `/* ... */` block
//!   or a run of `//` lines).
//! - Anything else: at the very top.

use crate::model::Language;

/// Byte offset at which a new header line should be inserted.
pub fn insertion_point(language: Language, content: &str) -> usize {
    match language {
        Language::Python => python_point(content),
        Language::Php => php_point(content),
        Language::JavaScript => javascript_point(content),
        Language::Other => 0,
    }
}

fn python_point(content: &str) -> usize {
    let mut offset = 0;
    let mut lines = content.split_inclusive('\n');

    let mut next = lines.next();
    if let Some(line) = next {
        if line.starts_with("#!") {
            offset += line.len();
            next = lines.next();
        }
    }
    if let Some(line) = next {
        if is_coding_line(line) {
            offset += line.len();
            next = lines.next();
        }
    }
    while let Some(line) = next {
        if line.trim().is_empty() && line.ends_with('\n') {
            offset += line.len();
            next = lines.next();
        } else {
            break;
        }
    }
    offset
}

fn is_coding_line(line: &str) -> bool {
    line.starts_with('#') && (line.contains("coding:") || line.contains("coding="))
}

fn php_point(content: &str) -> usize {
    match content.find("<?php") {
        Some(pos) => {
            let tag_end = pos + "<?php".len();
            // Header goes on the next line, after the rest of the tag line.
            match content[tag_end..].find('\n') {
                Some(nl) => tag_end + nl + 1,
                None => content.len(),
            }
        }
        None => 0,
    }
}

fn javascript_point(content: &str) -> usize {
    if content.starts_with("/*") {
        match content.find("*/") {
            Some(end) => {
                let mut offset = end + 2;
                // Consume the remainder of the closing line.
                if let Some(nl) = content[offset..].find('\n') {
                    offset += nl + 1;
                }
                offset
            }
            None => 0,
        }
    } else if content.starts_with("//") {
        let mut offset = 0;
        for line in content.split_inclusive('\n') {
            if line.trim_start().starts_with("//") {
                offset += line.len();
            } else {
                break;
            }
        }
        offset
    } else {
        0
    }
}
