use crate::error::{Result, UnitStoreError};
use crate::unit::{StructuralUnit, UnitId};
use std::collections::{BTreeSet, HashMap};

/// In-memory store of parsed structural units, addressed by id.
///
/// Replacing a unit does not touch reference edges: rebuilding edges that
/// point at a replaced id is the index builder's job.
#[derive(Debug, Clone, Default)]
pub struct UnitStore {
    units: HashMap<UnitId, StructuralUnit>,
    children: HashMap<UnitId, BTreeSet<(usize, UnitId)>>,
    files: HashMap<String, BTreeSet<UnitId>>,
}

impl UnitStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_units(units: impl IntoIterator<Item = StructuralUnit>) -> Self {
        let mut store = Self::new();
        for unit in units {
            store.put(unit);
        }
        store
    }

    /// Insert or replace a unit by id, returning the previous version
    pub fn put(&mut self, unit: StructuralUnit) -> Option<StructuralUnit> {
        let previous = self.detach(&unit.id);

        if let Some(parent) = &unit.parent {
            self.children
                .entry(parent.clone())
                .or_default()
                .insert((unit.span.start_line, unit.id.clone()));
        }
        self.files
            .entry(unit.file_path.clone())
            .or_default()
            .insert(unit.id.clone());
        self.units.insert(unit.id.clone(), unit);

        previous
    }

    pub fn get(&self, id: &UnitId) -> Result<&StructuralUnit> {
        self.units
            .get(id)
            .ok_or_else(|| UnitStoreError::NotFound(id.clone()))
    }

    #[must_use]
    pub fn contains(&self, id: &UnitId) -> bool {
        self.units.contains_key(id)
    }

    /// Units whose parent is `id`, in source order
    #[must_use]
    pub fn children_of(&self, id: &UnitId) -> Vec<&StructuralUnit> {
        self.children
            .get(id)
            .map(|set| {
                set.iter()
                    .filter_map(|(_, child)| self.units.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn remove(&mut self, id: &UnitId) -> Option<StructuralUnit> {
        self.detach(id)
    }

    /// Drop every unit that belongs to `file_path`, returning their ids
    pub fn remove_file(&mut self, file_path: &str) -> Vec<UnitId> {
        let ids: Vec<UnitId> = self
            .files
            .get(file_path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        for id in &ids {
            self.detach(id);
        }
        if !ids.is_empty() {
            log::debug!("Removed {} units from {file_path}", ids.len());
        }
        ids
    }

    /// Units of one file, in source order
    #[must_use]
    pub fn units_in_file(&self, file_path: &str) -> Vec<&StructuralUnit> {
        let mut units: Vec<&StructuralUnit> = self
            .files
            .get(file_path)
            .map(|set| set.iter().filter_map(|id| self.units.get(id)).collect())
            .unwrap_or_default();
        units.sort_by(|a, b| {
            a.span
                .start_line
                .cmp(&b.span.start_line)
                .then_with(|| a.id.cmp(&b.id))
        });
        units
    }

    /// All ids, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self.units.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructuralUnit> {
        self.units.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn detach(&mut self, id: &UnitId) -> Option<StructuralUnit> {
        let previous = self.units.remove(id)?;

        if let Some(parent) = &previous.parent {
            if let Some(set) = self.children.get_mut(parent) {
                set.remove(&(previous.span.start_line, previous.id.clone()));
                if set.is_empty() {
                    self.children.remove(parent);
                }
            }
        }
        if let Some(set) = self.files.get_mut(&previous.file_path) {
            set.remove(id);
            if set.is_empty() {
                self.files.remove(&previous.file_path);
            }
        }

        Some(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{SourceSpan, UnitKind};
    use pretty_assertions::assert_eq;

    fn unit(path: &str, name: &str, start: usize) -> StructuralUnit {
        StructuralUnit::new(
            path,
            name,
            UnitKind::Function,
            SourceSpan::new(start, start + 2, format!("def {name}(): pass")),
        )
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = UnitStore::new();
        let id = UnitId::from("a.py::missing");
        assert_eq!(store.get(&id), Err(UnitStoreError::NotFound(id.clone())));
    }

    #[test]
    fn test_put_replaces_and_reparents() {
        let mut store = UnitStore::new();
        let class_a = UnitId::from("a.py::A");
        let class_b = UnitId::from("a.py::B");

        store.put(unit("a.py", "helper", 5).with_parent(class_a.clone()));
        assert_eq!(store.children_of(&class_a).len(), 1);

        let previous = store.put(unit("a.py", "helper", 5).with_parent(class_b.clone()));
        assert!(previous.is_some());
        assert_eq!(store.len(), 1);
        assert!(store.children_of(&class_a).is_empty());
        assert_eq!(store.children_of(&class_b).len(), 1);
    }
}
