//! Display classification
//!
//! Maps a tracked path to a language tag through a static suffix table, and
//! tags content with a coarse style hint. Both are display-only: nothing here
//! can fail and nothing downstream depends on the result for correctness.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

/// Language used to pick a highlighter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    C,
    Cpp,
    Shell,
    Toml,
    Yaml,
    Json,
    Markdown,
    PlainText,
}

/// Coarse grouping of [`Language`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageFamily {
    /// Compiled source languages
    Source,
    /// Interpreted / scripting languages
    Scripting,
    /// Structured data formats
    Data,
    /// Prose and markup
    Prose,
    /// Unknown, shown as plain text
    Plain,
}

impl Language {
    /// Lexer tag, as understood by common highlighters
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Go => "go",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Shell => "bash",
            Self::Toml => "toml",
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::PlainText => "text",
        }
    }

    pub fn family(&self) -> LanguageFamily {
        match self {
            Self::Rust | Self::Go | Self::C | Self::Cpp => LanguageFamily::Source,
            Self::Python | Self::JavaScript | Self::TypeScript | Self::Shell => {
                LanguageFamily::Scripting
            }
            Self::Toml | Self::Yaml | Self::Json => LanguageFamily::Data,
            Self::Markdown => LanguageFamily::Prose,
            Self::PlainText => LanguageFamily::Plain,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for Language {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.tag())
    }
}

/// File extension (lowercase, no dot) to language.
///
/// Adding a format is an edit to this table.
pub static SUFFIX_TABLE: &[(&str, Language)] = &[
    ("rs", Language::Rust),
    ("py", Language::Python),
    ("pyi", Language::Python),
    ("js", Language::JavaScript),
    ("mjs", Language::JavaScript),
    ("cjs", Language::JavaScript),
    ("jsx", Language::JavaScript),
    ("ts", Language::TypeScript),
    ("tsx", Language::TypeScript),
    ("go", Language::Go),
    ("c", Language::C),
    ("h", Language::C),
    ("cc", Language::Cpp),
    ("cpp", Language::Cpp),
    ("cxx", Language::Cpp),
    ("hpp", Language::Cpp),
    ("sh", Language::Shell),
    ("bash", Language::Shell),
    ("toml", Language::Toml),
    ("tml", Language::Toml),
    ("yaml", Language::Yaml),
    ("yml", Language::Yaml),
    ("json", Language::Json),
    ("md", Language::Markdown),
    ("markdown", Language::Markdown),
];

static SUFFIX_INDEX: Lazy<HashMap<&'static str, Language>> =
    Lazy::new(|| SUFFIX_TABLE.iter().copied().collect());

/// Language for `path`, `PlainText` when the suffix is unknown or missing
pub fn classify(path: &str) -> Language {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .and_then(|ext| SUFFIX_INDEX.get(ext.as_str()).copied())
        .unwrap_or(Language::PlainText)
}

/// Advisory style hint for a generation's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStyle {
    /// Contains an iterative construct
    Iterative,
    /// No iterative marker found
    #[default]
    Other,
}

impl CodeStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iterative => "iterative",
            Self::Other => "other",
        }
    }

    pub fn is_iterative(&self) -> bool {
        matches!(self, Self::Iterative)
    }
}

impl fmt::Display for CodeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `for .. in` loop heads, `while`, and `loop {`.
///
/// A bare `for` is not enough: `impl Trait for Type` and prose in comments
/// would match.
static ITERATIVE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bfor\b[^\n{;]*?\bin\b|\bwhile\b|\bloop\s*\{")
        .expect("valid iterative marker regex")
});

/// Tag `text` as iterative or other
///
/// String matching only; comments and string literals count too.
pub fn detect_style(text: &str) -> CodeStyle {
    if ITERATIVE_MARKER.is_match(text) {
        CodeStyle::Iterative
    } else {
        CodeStyle::Other
    }
}
