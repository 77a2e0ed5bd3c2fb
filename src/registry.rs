//! Ordered collection of kept simulation records.
//!
//! Insertion order is the only identity an entry has. Plotting consumers
//! derive legend order and colors from it, so nothing here reorders,
//! deduplicates or evicts.

use crate::error::Result;
use crate::params::{ParameterRecord, SimulationParameters};
use crate::propagator::{simulate, Trajectory};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationRegistry {
    entries: Vec<SimulationParameters>,
}

impl SimulationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record; duplicates are kept
    pub fn add(&mut self, params: SimulationParameters) {
        self.entries.push(params);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in insertion order
    pub fn list(&self) -> &[SimulationParameters] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimulationParameters> {
        self.entries.iter()
    }

    /// Legend text for entry `index`: its label, or `Trajectory {index + 1}`
    pub fn display_label(&self, index: usize) -> Option<String> {
        self.entries.get(index).map(|params| {
            params
                .label
                .clone()
                .unwrap_or_else(|| format!("Trajectory {}", index + 1))
        })
    }

    /// Re-simulate every entry; output order matches [`list`](Self::list)
    pub fn simulate_all(&self) -> Vec<Trajectory> {
        self.entries.par_iter().map(simulate).collect()
    }

    /// Pretty-printed JSON array of flat records
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// Parse a JSON array of records, validating every entry
    pub fn import_json(json: &str) -> Result<Self> {
        let records: Vec<ParameterRecord> = serde_json::from_str(json)?;
        let entries = records
            .into_iter()
            .map(SimulationParameters::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(SimulationRegistry { entries })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.export_json()?)?;
        tracing::info!(
            entries = self.len(),
            path = %path.display(),
            "exported simulation registry"
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let registry = Self::import_json(&fs::read_to_string(path)?)?;
        tracing::info!(
            entries = registry.len(),
            path = %path.display(),
            "imported simulation registry"
        );
        Ok(registry)
    }
}

impl Extend<SimulationParameters> for SimulationRegistry {
    fn extend<I: IntoIterator<Item = SimulationParameters>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl FromIterator<SimulationParameters> for SimulationRegistry {
    fn from_iter<I: IntoIterator<Item = SimulationParameters>>(iter: I) -> Self {
        SimulationRegistry {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Registry shared between threads; `add`, `clear` and `list` are serialized
#[derive(Debug, Default)]
pub struct SharedRegistry {
    inner: Mutex<SimulationRegistry>,
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the Vec half-written, so a
    // poisoned guard is still safe to use.
    fn lock(&self) -> MutexGuard<'_, SimulationRegistry> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(&self, params: SimulationParameters) {
        self.lock().add(params);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Snapshot of the entries in insertion order
    pub fn list(&self) -> Vec<SimulationParameters> {
        self.lock().list().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Owned copy of the current registry
    pub fn snapshot(&self) -> SimulationRegistry {
        self.lock().clone()
    }

    pub fn into_inner(self) -> SimulationRegistry {
        self.inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl From<SimulationRegistry> for SharedRegistry {
    fn from(registry: SimulationRegistry) -> Self {
        SharedRegistry {
            inner: Mutex::new(registry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BallisticsError;
    use std::sync::Arc;
    use std::thread;

    fn labelled(label: &str, speed: f64) -> SimulationParameters {
        SimulationParameters::default()
            .with_launch(speed, 45.0)
            .with_steps(20)
            .with_label(label)
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut registry = SimulationRegistry::new();
        registry.add(labelled("A", 10.0));
        registry.add(labelled("B", 20.0));
        registry.add(labelled("C", 30.0));

        let labels: Vec<_> = registry
            .list()
            .iter()
            .map(|p| p.label.as_deref().unwrap())
            .collect();
        assert_eq!(labels, ["A", "B", "C"]);
    }

    #[test]
    fn test_clear_empties_registry() {
        let mut registry: SimulationRegistry =
            vec![labelled("A", 10.0), labelled("B", 20.0)].into_iter().collect();
        assert_eq!(registry.len(), 2);
        registry.clear();
        assert!(registry.list().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut registry = SimulationRegistry::new();
        let params = labelled("same", 15.0);
        registry.add(params.clone());
        registry.add(params.clone());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list()[0], registry.list()[1]);
    }

    #[test]
    fn test_display_label_falls_back_to_position() {
        let mut registry = SimulationRegistry::new();
        registry.add(SimulationParameters::default());
        registry.add(labelled("named", 5.0));

        assert_eq!(registry.display_label(0).as_deref(), Some("Trajectory 1"));
        assert_eq!(registry.display_label(1).as_deref(), Some("named"));
        assert_eq!(registry.display_label(2), None);
    }

    #[test]
    fn test_simulate_all_keeps_order() {
        let registry: SimulationRegistry = (1..=16)
            .map(|i| labelled(&i.to_string(), i as f64 * 5.0))
            .collect();

        let trajectories = registry.simulate_all();
        assert_eq!(trajectories.len(), 16);
        for (params, trajectory) in registry.iter().zip(&trajectories) {
            assert_eq!(*trajectory, simulate(params));
        }
    }

    #[test]
    fn test_json_round_trip() {
        let mut registry = SimulationRegistry::new();
        registry.add(labelled("first", 12.0));
        registry.add(SimulationParameters::default().with_wind(3.0, -1.0));

        let json = registry.export_json().unwrap();
        let restored = SimulationRegistry::import_json(&json).unwrap();
        assert_eq!(restored, registry);
    }

    #[test]
    fn test_empty_export() {
        let json = SimulationRegistry::new().export_json().unwrap();
        assert_eq!(json.trim(), "[]");
        assert!(SimulationRegistry::import_json(&json).unwrap().is_empty());
    }

    #[test]
    fn test_import_reports_invalid_record() {
        let json = r#"[
            {"p0": [0, 0], "v0": [1, 1], "w": [0, 0], "eta": 0.1,
             "m": 0.0, "g": [0, -9.8], "h": 0.1, "T": 10}
        ]"#;
        let err = SimulationRegistry::import_json(json).unwrap_err();
        assert_eq!(err.field(), Some("m"));
    }

    #[test]
    fn test_import_reports_missing_field() {
        let json = r#"[{"p0": [0, 0], "v0": [1, 1], "w": [0, 0], "eta": 0.1,
                        "m": 1.0, "g": [0, -9.8], "T": 10}]"#;
        let err = SimulationRegistry::import_json(json).unwrap_err();
        assert_eq!(err.field(), Some("h"));
    }

    #[test]
    fn test_import_rejects_malformed_json() {
        let err = SimulationRegistry::import_json("{not json").unwrap_err();
        assert!(matches!(err, BallisticsError::Serialization(_)));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "ballistic-registry-{}-{:?}.json",
            std::process::id(),
            thread::current().id()
        ));
        let registry: SimulationRegistry =
            vec![labelled("x", 1.0), labelled("y", 2.0)].into_iter().collect();

        registry.save(&path).unwrap();
        let loaded = SimulationRegistry::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded, registry);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = SimulationRegistry::load("/nonexistent/dir/registry.json").unwrap_err();
        assert!(matches!(err, BallisticsError::Io(_)));
    }

    #[test]
    fn test_shared_registry_concurrent_adds() {
        let shared = Arc::new(SharedRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for i in 0..25 {
                        shared.add(labelled(&format!("{t}-{i}"), 10.0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let entries = shared.list();
        assert_eq!(entries.len(), 200);

        // Per-thread order survives interleaving
        for t in 0..8 {
            let prefix = format!("{t}-");
            let seen: Vec<usize> = entries
                .iter()
                .filter_map(|p| p.label.as_deref()?.strip_prefix(&prefix)?.parse().ok())
                .collect();
            assert_eq!(seen, (0..25).collect::<Vec<_>>());
        }

        shared.clear();
        assert!(shared.is_empty());
    }
}
