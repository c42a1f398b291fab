//! Core data structures: stable identifiers, symbol references, and the
//! file analysis record that the header codec serializes.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stable identifier for a file, rendered as `F<n>` (e.g. `F101`).
///
/// Ids are monotonically assigned by the registry and never reused, even
/// after the file is removed. `FileId::UNKNOWN` (`F0`) is reserved for
/// degraded decodes of a malformed header; the registry starts its counter
/// at 101 and never allocates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    pub const UNKNOWN: FileId = FileId(0);
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

impl FromStr for FileId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('F')
            .ok_or_else(|| ParseIdError(s.to_string()))?;
        digits
            .parse::<u32>()
            .map(FileId)
            .map_err(|_| ParseIdError(s.to_string()))
    }
}

/// Which per-file counter a symbol id was minted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdSpace {
    /// `C<n>` — class-like symbols.
    Class,
    /// `F<n>` — function- and variable-like symbols.
    Func,
}

impl IdSpace {
    pub fn prefix(self) -> char {
        match self {
            IdSpace::Class => 'C',
            IdSpace::Func => 'F',
        }
    }
}

/// Stable per-file symbol identifier, rendered as `C<n>` or `F<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId {
    pub space: IdSpace,
    pub index: u32,
}

impl SymbolId {
    pub fn new(space: IdSpace, index: u32) -> Self {
        SymbolId { space, index }
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.space.prefix(), self.index)
    }
}

impl FromStr for SymbolId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let space = match chars.next() {
            Some('C') => IdSpace::Class,
            Some('F') => IdSpace::Func,
            _ => return Err(ParseIdError(s.to_string())),
        };
        chars
            .as_str()
            .parse::<u32>()
            .map(|index| SymbolId { space, index })
            .map_err(|_| ParseIdError(s.to_string()))
    }
}

/// Error parsing a textual `F<n>` / `C<n>` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError(pub String);

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid identifier: {:?}", self.0)
    }
}

impl std::error::Error for ParseIdError {}

// Ids serialize as their textual forms so the persisted registry keeps the
// original `{"F101": {...}}` shape.
macro_rules! string_serde {
    ($ty:ty, $expecting:literal) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct V;
                impl<'de> Visitor<'de> for V {
                    type Value = $ty;

                    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        f.write_str($expecting)
                    }

                    fn visit_str<E: de::Error>(self, v: &str) -> Result<$ty, E> {
                        v.parse().map_err(de::Error::custom)
                    }
                }
                deserializer.deserialize_str(V)
            }
        }
    };
}

string_serde!(FileId, "a file id like \"F101\"");
string_serde!(SymbolId, "a symbol id like \"C1\" or \"F2\"");

/// What a cross-file reference points at within the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolTarget {
    /// `*` — the whole file's exported surface.
    Wildcard,
    /// A specific symbol in the target file.
    Named(SymbolId),
    /// File resolved but the symbol is not registered yet (forward
    /// reference). Encodes as the wildcard form; callers re-resolve later.
    Pending,
}

/// A global symbol pointer, serialized as `file_id:symbol_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolRef {
    pub file: FileId,
    pub symbol: SymbolTarget,
}

impl SymbolRef {
    pub fn named(file: FileId, symbol: SymbolId) -> Self {
        SymbolRef {
            file,
            symbol: SymbolTarget::Named(symbol),
        }
    }

    pub fn wildcard(file: FileId) -> Self {
        SymbolRef {
            file,
            symbol: SymbolTarget::Wildcard,
        }
    }

    pub fn pending(file: FileId) -> Self {
        SymbolRef {
            file,
            symbol: SymbolTarget::Pending,
        }
    }

    /// The `file_id:symbol_id` token used for set-based import comparison.
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol {
            SymbolTarget::Named(id) => write!(f, "{}:{}", self.file, id),
            // Pending degrades to the wildcard form on the wire.
            SymbolTarget::Wildcard | SymbolTarget::Pending => write!(f, "{}:*", self.file),
        }
    }
}

impl FromStr for SymbolRef {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (file, symbol) = s.split_once(':').ok_or_else(|| ParseIdError(s.to_string()))?;
        let file: FileId = file.parse()?;
        if symbol == "*" {
            Ok(SymbolRef::wildcard(file))
        } else {
            Ok(SymbolRef::named(file, symbol.parse()?))
        }
    }
}

/// An inheritance/extension relation recorded on a definition.
///
/// Parents may be resolved to a local symbol id, a cross-file reference, or
/// left as a bare name when the parent's file has not been analyzed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// A symbol defined in the same file, rendered as its bare symbol id.
    Local(SymbolId),
    /// A symbol in another file, rendered as `file_id:symbol_id`.
    Remote(SymbolRef),
    /// Unresolved bare name.
    Name(String),
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentRef::Local(id) => write!(f, "{id}"),
            ParentRef::Remote(r) => write!(f, "{r}"),
            ParentRef::Name(name) => write!(f, "{name}"),
        }
    }
}

impl ParentRef {
    /// Grammar: `F<n>:<sym>` is a remote reference, `C<n>`/`F<n>` a local
    /// symbol id, anything else a bare name.
    pub fn parse(s: &str) -> ParentRef {
        if s.contains(':') {
            if let Ok(r) = s.parse::<SymbolRef>() {
                return ParentRef::Remote(r);
            }
        } else if let Ok(id) = s.parse::<SymbolId>() {
            return ParentRef::Local(id);
        }
        ParentRef::Name(s.to_string())
    }
}

/// The kind of a symbol as reported by an analyzer. Only consulted when a
/// symbol id is first minted; the id's prefix carries it from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    Function,
    Variable,
}

impl SymbolKind {
    pub fn id_space(self) -> IdSpace {
        match self {
            SymbolKind::Class => IdSpace::Class,
            SymbolKind::Function | SymbolKind::Variable => IdSpace::Func,
        }
    }
}

/// One definition entry of a header's `DEF[]` group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub id: SymbolId,
    pub name: String,
    pub parents: Vec<ParentRef>,
}

impl Definition {
    pub fn new(id: SymbolId, name: impl Into<String>) -> Self {
        Definition {
            id,
            name: name.into(),
            parents: Vec::new(),
        }
    }
}

/// The structured record a header round-trips: everything the codec needs
/// to render `//FORAI:<id>;DEF[...];IMP[...];EXP[...][LANG[...]]//`.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAnalysis {
    pub file_id: FileId,
    pub language: Language,
    pub definitions: Vec<Definition>,
    pub imports: Vec<SymbolRef>,
    pub exports: Vec<SymbolId>,
}

impl FileAnalysis {
    pub fn empty(file_id: FileId) -> Self {
        FileAnalysis {
            file_id,
            language: Language::Python,
            definitions: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Import tokens as a set, for order- and duplicate-insensitive change
    /// detection.
    pub fn import_set(&self) -> std::collections::BTreeSet<String> {
        self.imports.iter().map(|i| i.token()).collect()
    }
}

/// Normalized output of a per-language analyzer.
/// Names are raw; the resolve step maps them onto registry identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAnalysis {
    pub definitions: Vec<RawDefinition>,
    pub imports: Vec<RawImport>,
    pub exports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawDefinition {
    pub name: String,
    pub kind: SymbolKind,
    /// Parent names as written in source (possibly dotted).
    pub parents: Vec<String>,
}

impl RawDefinition {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        RawDefinition {
            name: name.into(),
            kind,
            parents: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawImport {
    /// Dotted or slashed module path as written in source.
    pub module: String,
    /// Imported symbol name, or `*` for a whole-module import.
    pub symbol: String,
}

/// Supported source languages.
///
/// Python is the protocol default: headers for Python files carry no
/// `LANG[]` group, and decoding a header without one yields Python.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    Php,
    Other,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") | Some("pyi") => Language::Python,
            Some("js") | Some("mjs") | Some("cjs") => Language::JavaScript,
            Some("php") => Language::Php,
            _ => Language::Other,
        }
    }

    /// Detect language from extension, falling back to content sniffing
    /// for extensionless or unrecognized files.
    pub fn detect(path: &Path, content: &str) -> Self {
        match Language::from_path(path) {
            Language::Other => Language::sniff(content),
            lang => lang,
        }
    }

    fn sniff(content: &str) -> Self {
        let head: String = content.chars().take(1000).collect();
        if head.contains("<?php") {
            Language::Php
        } else if head.contains("function")
            && (head.contains("var ") || head.contains("const ") || head.contains("let "))
        {
            Language::JavaScript
        } else if head.contains("def ") && head.contains("import ") {
            Language::Python
        } else {
            Language::Other
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Php => "php",
            Language::Other => "unknown",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "python" => Language::Python,
            "javascript" => Language::JavaScript,
            "php" => Language::Php,
            _ => Language::Other,
        }
    }
}
