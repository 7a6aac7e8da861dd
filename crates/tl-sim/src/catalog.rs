//! Named aircraft definitions loaded from YAML.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aircraft::{Aircraft, AircraftDef};
use crate::error::{SimError, SimResult};

const BUILTIN_YAML: &str = include_str!("../models/catalog.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    models: Vec<AircraftDef>,
}

/// Aircraft definitions keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    models: BTreeMap<String, AircraftDef>,
}

impl Catalog {
    /// Models shipped with the crate.
    pub fn builtin() -> SimResult<Self> {
        Self::from_yaml_str(BUILTIN_YAML)
    }

    pub fn from_yaml_str(content: &str) -> SimResult<Self> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        let mut catalog = Self::default();
        for def in file.models {
            catalog.insert(def)?;
        }
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Add a validated definition. Names must be unique.
    pub fn insert(&mut self, def: AircraftDef) -> SimResult<()> {
        def.validate()?;
        if self.models.contains_key(&def.name) {
            return Err(SimError::InvalidModel {
                model: def.name,
                what: "duplicate model name".to_string(),
            });
        }
        self.models.insert(def.name.clone(), def);
        Ok(())
    }

    /// Merge another catalog; its models replace ones with the same name.
    pub fn extend(&mut self, other: Catalog) {
        self.models.extend(other.models);
    }

    pub fn get(&self, name: &str) -> SimResult<&AircraftDef> {
        self.models.get(name).ok_or_else(|| SimError::UnknownModel {
            name: name.to_string(),
            available: self.names().join(", "),
        })
    }

    /// Build a plant for the named model.
    pub fn build(&self, name: &str) -> SimResult<Aircraft> {
        Aircraft::new(self.get(name)?.clone())
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    pub fn models(&self) -> impl Iterator<Item = &AircraftDef> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::Channel;

    #[test]
    fn builtin_models_load() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.names(), vec!["trainer", "twin"]);

        let trainer = catalog.get("trainer").unwrap();
        assert_eq!(trainer.engines.len(), 1);
        assert!(!trainer.actuators.any());
        let mass = trainer.validate().unwrap();
        assert!((mass.weight_lb - 2290.0).abs() < 1e-9);

        let twin = catalog.get("twin").unwrap();
        assert_eq!(twin.engines.len(), 2);
        assert!(twin.actuators.get(Channel::Elevator).is_some());
        assert!(twin.actuators.get(Channel::Throttle).is_none());
        let mass = twin.validate().unwrap();
        // symmetric loading keeps the CG on the centreline
        assert!(mass.cg_ft.y.abs() < 1e-12);
    }

    #[test]
    fn unknown_model_lists_available() {
        let catalog = Catalog::builtin().unwrap();
        match catalog.get("glider") {
            Err(SimError::UnknownModel { name, available }) => {
                assert_eq!(name, "glider");
                assert_eq!(available, "trainer, twin");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let catalog = Catalog::builtin().unwrap();
        let def = catalog.get("trainer").unwrap().clone();
        let mut copy = Catalog::default();
        copy.insert(def.clone()).unwrap();
        assert!(matches!(
            copy.insert(def),
            Err(SimError::InvalidModel { .. })
        ));
    }

    #[test]
    fn user_file_extends_builtin() {
        let dir = std::env::temp_dir().join(format!("tl-sim-catalog-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("models.yaml");

        let builtin = Catalog::builtin().unwrap();
        let mut def = builtin.get("trainer").unwrap().clone();
        def.name = "heavy trainer".into();
        def.mass.empty_weight_lb += 200.0;
        let file = CatalogFile { models: vec![def] };
        std::fs::write(&path, serde_yaml::to_string(&file).unwrap()).unwrap();

        let mut catalog = builtin;
        catalog.extend(Catalog::from_path(&path).unwrap());
        assert_eq!(catalog.len(), 3);
        assert!(catalog.build("heavy trainer").is_ok());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Catalog::from_path(Path::new("/nonexistent/models.yaml")).unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
