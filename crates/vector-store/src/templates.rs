use crate::cache::content_hash;
use crate::error::{Result, VectorStoreError};
use docctx_units::{StructuralUnit, UnitKind};
use serde::{Deserialize, Serialize};

pub const EMBEDDING_TEMPLATES_SCHEMA_VERSION: u32 = 1;

/// Templates that turn a unit into the text sent to the embedding provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingTemplates {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Cap on rendered text, counted in chars
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default)]
    pub unit: UnitTemplates,
}

fn default_schema_version() -> u32 {
    EMBEDDING_TEMPLATES_SCHEMA_VERSION
}

fn default_max_chars() -> usize {
    8192
}

impl Default for EmbeddingTemplates {
    fn default() -> Self {
        Self {
            schema_version: EMBEDDING_TEMPLATES_SCHEMA_VERSION,
            max_chars: default_max_chars(),
            unit: UnitTemplates::default(),
        }
    }
}

/// Per-kind overrides fall back to `default`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTemplates {
    #[serde(default = "default_template")]
    pub default: String,
    pub module: Option<String>,
    pub class: Option<String>,
    pub function: Option<String>,
    pub method: Option<String>,
}

impl Default for UnitTemplates {
    fn default() -> Self {
        Self {
            default: default_template(),
            module: None,
            class: None,
            function: None,
            method: None,
        }
    }
}

fn default_template() -> String {
    "{kind}: {qualified_name}\nLanguage: {language}\nFile: {path}\nCode:\n{text}".to_string()
}

impl EmbeddingTemplates {
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != EMBEDDING_TEMPLATES_SCHEMA_VERSION {
            return Err(VectorStoreError::Template(format!(
                "Unsupported embedding template schema_version {} (expected {EMBEDDING_TEMPLATES_SCHEMA_VERSION})",
                self.schema_version
            )));
        }

        let max_chars = self.max_chars;
        if !(256..=200_000).contains(&max_chars) {
            return Err(VectorStoreError::Template(format!(
                "embedding.max_chars must be in [256, 200000] (got {max_chars})"
            )));
        }

        for template in self.all_templates() {
            validate_template_placeholders(template)?;
        }

        Ok(())
    }

    /// Stable hash of everything that shapes rendered text; part of cache fingerprints
    #[must_use]
    pub fn template_hash(&self) -> String {
        let mut repr = format!(
            "schema_version={}\nmax_chars={}\n",
            self.schema_version, self.max_chars
        );
        repr.push_str(&format!("unit.default={}\n", self.unit.default));
        for (name, template) in [
            ("module", &self.unit.module),
            ("class", &self.unit.class),
            ("function", &self.unit.function),
            ("method", &self.unit.method),
        ] {
            repr.push_str(&format!(
                "unit.{name}={}\n",
                template.as_deref().unwrap_or_default()
            ));
        }
        content_hash(&[repr.as_str()])
    }

    pub fn render_unit(&self, unit: &StructuralUnit) -> Result<String> {
        let template = match unit.kind {
            UnitKind::Module => self.unit.module.as_deref(),
            UnitKind::Class => self.unit.class.as_deref(),
            UnitKind::Function => self.unit.function.as_deref(),
            UnitKind::Method => self.unit.method.as_deref(),
        }
        .unwrap_or(self.unit.default.as_str());

        let parent = unit.parent.as_ref().map_or("", |p| p.as_str());
        let start_line = unit.span.start_line.to_string();
        let end_line = unit.span.end_line.to_string();

        render_template(template, self.max_chars, |key| match key {
            "text" => Some(unit.text()),
            "path" => Some(unit.file_path.as_str()),
            "language" => Some(unit.language.as_str()),
            "kind" => Some(unit.kind.as_str()),
            "name" => Some(unit.name()),
            "qualified_name" => Some(unit.qualified_name.as_str()),
            "parent" => Some(parent),
            "start_line" => Some(start_line.as_str()),
            "end_line" => Some(end_line.as_str()),
            _ => None,
        })
    }

    fn all_templates(&self) -> Vec<&str> {
        let mut out = vec![self.unit.default.as_str()];
        for template in [
            &self.unit.module,
            &self.unit.class,
            &self.unit.function,
            &self.unit.method,
        ]
        .into_iter()
        .flatten()
        {
            out.push(template.as_str());
        }
        out
    }
}

const ALLOWED_PLACEHOLDERS: &str =
    "text, path, language, kind, name, qualified_name, parent, start_line, end_line";

fn is_allowed_placeholder(name: &str) -> bool {
    matches!(
        name,
        "text"
            | "path"
            | "language"
            | "kind"
            | "name"
            | "qualified_name"
            | "parent"
            | "start_line"
            | "end_line"
    )
}

fn validate_template_placeholders(template: &str) -> Result<()> {
    for name in extract_placeholders(template)? {
        if !is_allowed_placeholder(name.trim()) {
            return Err(VectorStoreError::Template(format!(
                "Unsupported template placeholder '{{{name}}}'. Allowed: {ALLOWED_PLACEHOLDERS}",
            )));
        }
    }
    Ok(())
}

fn extract_placeholders(template: &str) -> Result<Vec<String>> {
    let mut placeholders = Vec::new();
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if matches!(chars.peek(), Some('{')) {
                    let _ = chars.next();
                    continue;
                }
                let name = read_placeholder(&mut chars)?;
                if name.trim().is_empty() {
                    return Err(VectorStoreError::Template(
                        "Invalid template: empty placeholder '{}'".into(),
                    ));
                }
                placeholders.push(name);
            }
            '}' => {
                if matches!(chars.peek(), Some('}')) {
                    let _ = chars.next();
                    continue;
                }
                return Err(VectorStoreError::Template("Invalid template: stray '}'".into()));
            }
            _ => {}
        }
    }
    Ok(placeholders)
}

fn read_placeholder(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String> {
    let mut name = String::new();
    loop {
        match chars.next() {
            Some('}') => return Ok(name),
            Some('{') => {
                return Err(VectorStoreError::Template(
                    "Invalid template: nested '{' inside placeholder".into(),
                ));
            }
            Some(c) => name.push(c),
            None => {
                return Err(VectorStoreError::Template(
                    "Invalid template: unterminated '{...}' placeholder".into(),
                ));
            }
        }
    }
}

fn render_template<'a>(
    template: &str,
    max_chars: usize,
    mut resolve: impl FnMut(&str) -> Option<&'a str>,
) -> Result<String> {
    let mut out = BoundedText::new(max_chars);
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if out.is_full() {
            break;
        }

        match ch {
            '{' => {
                if matches!(chars.peek(), Some('{')) {
                    let _ = chars.next();
                    out.push_str("{");
                    continue;
                }

                let name = read_placeholder(&mut chars)?;
                let name = name.trim();
                if !is_allowed_placeholder(name) {
                    return Err(VectorStoreError::Template(format!(
                        "Unsupported template placeholder '{{{name}}}'. Allowed: {ALLOWED_PLACEHOLDERS}",
                    )));
                }
                out.push_str(resolve(name).unwrap_or(""));
            }
            '}' => {
                if matches!(chars.peek(), Some('}')) {
                    let _ = chars.next();
                    out.push_str("}");
                    continue;
                }
                return Err(VectorStoreError::Template("Invalid template: stray '}'".into()));
            }
            other => out.push(other),
        }
    }

    Ok(out.text)
}

/// String capped at a number of chars
struct BoundedText {
    text: String,
    chars: usize,
    max_chars: usize,
}

impl BoundedText {
    fn new(max_chars: usize) -> Self {
        Self {
            text: String::new(),
            chars: 0,
            max_chars,
        }
    }

    fn is_full(&self) -> bool {
        self.chars >= self.max_chars
    }

    fn push(&mut self, ch: char) {
        if !self.is_full() {
            self.text.push(ch);
            self.chars += 1;
        }
    }

    fn push_str(&mut self, value: &str) {
        for ch in value.chars() {
            if self.is_full() {
                break;
            }
            self.text.push(ch);
            self.chars += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docctx_units::SourceSpan;

    fn method() -> StructuralUnit {
        StructuralUnit::new(
            "src/cart.py",
            "Cart.total",
            UnitKind::Method,
            SourceSpan::new(12, 15, "def total(self):\n    return sum(self.items)"),
        )
    }

    #[test]
    fn test_default_template_renders_unit_context() {
        let rendered = EmbeddingTemplates::default().render_unit(&method()).unwrap();
        assert_eq!(
            rendered,
            "method: Cart.total\nLanguage: python\nFile: src/cart.py\nCode:\ndef total(self):\n    return sum(self.items)"
        );
    }

    #[test]
    fn test_per_kind_override_and_escapes() {
        let mut templates = EmbeddingTemplates::default();
        templates.unit.method = Some("{{{name}}} @ {start_line}-{end_line}".to_string());
        templates.validate().unwrap();
        assert_eq!(templates.render_unit(&method()).unwrap(), "{total} @ 12-15");
    }

    #[test]
    fn test_unknown_placeholder_is_rejected() {
        let mut templates = EmbeddingTemplates::default();
        templates.unit.class = Some("{symbol}".to_string());
        assert!(matches!(
            templates.validate(),
            Err(VectorStoreError::Template(_))
        ));
    }

    #[test]
    fn test_output_is_bounded_in_chars() {
        let templates = EmbeddingTemplates {
            max_chars: 256,
            ..EmbeddingTemplates::default()
        };
        let unit = StructuralUnit::new(
            "a.rs",
            "f",
            UnitKind::Function,
            SourceSpan::new(1, 1, "é".repeat(400)),
        );
        let rendered = templates.render_unit(&unit).unwrap();
        assert_eq!(rendered.chars().count(), 256);
        // multi-byte chars count once each
        assert!(rendered.len() > 256);
        assert!(rendered.ends_with('é'));
    }

    #[test]
    fn test_template_hash_tracks_changes() {
        let base = EmbeddingTemplates::default();
        let mut changed = base.clone();
        changed.unit.function = Some("{text}".to_string());
        assert_ne!(base.template_hash(), changed.template_hash());
        assert_eq!(base.template_hash(), EmbeddingTemplates::default().template_hash());
    }
}
