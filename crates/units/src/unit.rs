use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable unit identifier (`path::qualified_name`).
///
/// Re-parsing an unchanged file yields identical ids, which is what lets the
/// embedding cache survive rebuilds. Ordering is plain string ordering and is
/// used as the deterministic tie-break everywhere in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    #[must_use]
    pub fn new(file_path: &str, qualified_name: &str) -> Self {
        Self(format!("{file_path}::{qualified_name}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UnitId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for UnitId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Module,
    Class,
    Function,
    Method,
}

impl UnitKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Function => "function",
            Self::Method => "method",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location and text of a unit inside its file (1-based, inclusive lines)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
}

impl SourceSpan {
    pub fn new(start_line: usize, end_line: usize, text: impl Into<String>) -> Self {
        Self {
            start_line,
            end_line,
            text: text.into(),
        }
    }

    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// A named, addressable piece of code treated as an atomic context item.
///
/// When deserialized without a language (or with `unknown`), the language is
/// derived from `file_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "UnitRecord")]
pub struct StructuralUnit {
    pub id: UnitId,
    pub kind: UnitKind,
    pub qualified_name: String,
    pub file_path: String,
    pub span: SourceSpan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<UnitId>,
    #[serde(default)]
    pub has_docs: bool,
    pub language: Language,
}

/// Wire form of [`StructuralUnit`]
#[derive(Deserialize)]
struct UnitRecord {
    id: UnitId,
    kind: UnitKind,
    qualified_name: String,
    file_path: String,
    span: SourceSpan,
    #[serde(default)]
    parent: Option<UnitId>,
    #[serde(default)]
    has_docs: bool,
    #[serde(default)]
    language: Option<Language>,
}

impl From<UnitRecord> for StructuralUnit {
    fn from(record: UnitRecord) -> Self {
        let language = match record.language {
            Some(language) if language != Language::Unknown => language,
            _ => Language::from_path(&record.file_path),
        };
        Self {
            id: record.id,
            kind: record.kind,
            qualified_name: record.qualified_name,
            file_path: record.file_path,
            span: record.span,
            parent: record.parent,
            has_docs: record.has_docs,
            language,
        }
    }
}

impl StructuralUnit {
    pub fn new(
        file_path: impl Into<String>,
        qualified_name: impl Into<String>,
        kind: UnitKind,
        span: SourceSpan,
    ) -> Self {
        let file_path = file_path.into();
        let qualified_name = qualified_name.into();
        Self {
            id: UnitId::new(&file_path, &qualified_name),
            kind,
            language: Language::from_path(&file_path),
            qualified_name,
            file_path,
            span,
            parent: None,
            has_docs: false,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: UnitId) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub const fn with_docs(mut self, has_docs: bool) -> Self {
        self.has_docs = has_docs;
        self
    }

    /// Short name: the last segment of the qualified name
    #[must_use]
    pub fn name(&self) -> &str {
        self.qualified_name
            .rsplit(['.', ':'])
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.qualified_name)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.span.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_path_and_qualified_name() {
        let unit = StructuralUnit::new(
            "src/app.py",
            "App.run",
            UnitKind::Method,
            SourceSpan::new(10, 14, "def run(self): ..."),
        );
        assert_eq!(unit.id.as_str(), "src/app.py::App.run");
        assert_eq!(unit.language, Language::Python);
        assert_eq!(unit.name(), "run");
        assert_eq!(unit.span.line_count(), 5);
    }

    #[test]
    fn test_deserialized_unit_derives_language_from_path() {
        let unit: StructuralUnit = serde_json::from_str(
            r#"{
                "id": "a.py::f",
                "kind": "function",
                "qualified_name": "f",
                "file_path": "a.py",
                "span": { "start_line": 1, "end_line": 1, "text": "def f(): pass" }
            }"#,
        )
        .unwrap();
        assert_eq!(unit.language, Language::Python);
        assert!(!unit.has_docs);

        let explicit: StructuralUnit = serde_json::from_str(
            r#"{
                "id": "build/gen.txt::f",
                "kind": "function",
                "qualified_name": "f",
                "file_path": "build/gen.txt",
                "span": { "start_line": 1, "end_line": 1, "text": "fn f() {}" },
                "language": "rust"
            }"#,
        )
        .unwrap();
        assert_eq!(explicit.language, Language::Rust);

        let round_trip: StructuralUnit =
            serde_json::from_str(&serde_json::to_string(&unit).unwrap()).unwrap();
        assert_eq!(round_trip, unit);
    }

    #[test]
    fn test_name_handles_rust_paths() {
        let unit = StructuralUnit::new(
            "src/lib.rs",
            "store::UnitStore::put",
            UnitKind::Method,
            SourceSpan::new(1, 1, "fn put() {}"),
        );
        assert_eq!(unit.name(), "put");
    }
}
