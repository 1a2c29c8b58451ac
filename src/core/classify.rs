//! Per-line classification and substitution of the module identifier.
//!
//! A line is either part of an import declaration (it starts with the import
//! keyword, or with a quote as a continuation inside an `import ( ... )`
//! block) or it is ordinary code. Import lines prefer the quoted form
//! `"<old>`; everything else gets a plain first-occurrence replacement.
//!
//! At most one occurrence is replaced per line. A line such as
//! `"old/x" // see old/x` keeps its second occurrence.
//!
//! Matching is on the exact identifier string only: a reference through the
//! package alias (the last path segment, e.g. `pkg.Foo()`) contains no
//! occurrence and is left alone.

use std::borrow::Cow;

const QUOTE: char = '"';

/// The module identifier pair being swapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePair {
    pub old: String,
    pub new: String,
}

impl ModulePair {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

/// How a substituted line was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Import-context line with a `"<old>` occurrence
    QuotedImport,
    /// Import-context line with only an unquoted occurrence
    BareImport,
    /// Any other line (qualified reference or plain text)
    Reference,
}

/// Result of classifying one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEdit<'a> {
    Untouched(&'a str),
    Rewritten { line: String, kind: LineKind },
}

impl<'a> LineEdit<'a> {
    pub fn is_rewritten(&self) -> bool {
        matches!(self, LineEdit::Rewritten { .. })
    }

    pub fn text(&self) -> &str {
        match self {
            LineEdit::Untouched(line) => line,
            LineEdit::Rewritten { line, .. } => line,
        }
    }

    pub fn into_text(self) -> Cow<'a, str> {
        match self {
            LineEdit::Untouched(line) => Cow::Borrowed(line),
            LineEdit::Rewritten { line, .. } => Cow::Owned(line),
        }
    }
}

/// Stateless line classifier bound to an identifier pair and import keyword.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    pair: ModulePair,
    import_keyword: String,
    quoted_old: String,
    quoted_new: String,
}

impl LineClassifier {
    pub fn new(pair: ModulePair, import_keyword: impl Into<String>) -> Self {
        let quoted_old = format!("{QUOTE}{}", pair.old);
        let quoted_new = format!("{QUOTE}{}", pair.new);
        Self {
            pair,
            import_keyword: import_keyword.into(),
            quoted_old,
            quoted_new,
        }
    }

    pub fn pair(&self) -> &ModulePair {
        &self.pair
    }

    /// Import-context test on the whitespace-trimmed line.
    pub fn is_import_context(&self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.starts_with(self.import_keyword.as_str()) || trimmed.starts_with(QUOTE)
    }

    /// Classify `line` and apply at most one substitution.
    pub fn classify<'a>(&self, line: &'a str) -> LineEdit<'a> {
        if self.pair.old.is_empty()
            || self.pair.old == self.pair.new
            || !line.contains(self.pair.old.as_str())
        {
            return LineEdit::Untouched(line);
        }

        if !self.is_import_context(line) {
            return LineEdit::Rewritten {
                line: line.replacen(self.pair.old.as_str(), &self.pair.new, 1),
                kind: LineKind::Reference,
            };
        }

        if line.contains(self.quoted_old.as_str()) {
            LineEdit::Rewritten {
                line: line.replacen(self.quoted_old.as_str(), &self.quoted_new, 1),
                kind: LineKind::QuotedImport,
            }
        } else {
            LineEdit::Rewritten {
                line: line.replacen(self.pair.old.as_str(), &self.pair.new, 1),
                kind: LineKind::BareImport,
            }
        }
    }
}
