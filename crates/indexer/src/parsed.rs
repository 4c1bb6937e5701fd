use docctx_graph::RawReference;
use docctx_units::StructuralUnit;
use serde::{Deserialize, Serialize};

/// Parser output for one source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub file_path: String,
    #[serde(default)]
    pub units: Vec<StructuralUnit>,
    #[serde(default)]
    pub references: Vec<RawReference>,
}

impl ParsedFile {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: StructuralUnit) -> Self {
        self.units.push(unit);
        self
    }

    #[must_use]
    pub fn with_reference(mut self, reference: RawReference) -> Self {
        self.references.push(reference);
        self
    }
}
