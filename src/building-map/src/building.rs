// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::common::{Error, ErrorCode, ErrorKind, Result, Warning};
use crate::config::LevelConfig;
use crate::drawing::DrawingLoader;
use crate::format::{self, LevelRecord, OrderedMap};
use crate::level::Level;

/// Top level of a building map file.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildingRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub levels: OrderedMap<LevelRecord>,
    /// Everything else (lifts, crowd simulation settings, ...), carried
    /// through verbatim.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Building {
    pub name: String,
    pub levels: Vec<Level>,
    other: BTreeMap<String, serde_json::Value>,
}

#[derive(Clone, Debug)]
pub struct LoadedBuilding {
    pub building: Building,
    pub warnings: Vec<Warning>,
}

impl Building {
    pub fn new(name: &str) -> Self {
        Building {
            name: name.to_owned(),
            levels: vec![],
            other: BTreeMap::new(),
        }
    }

    /// Load every level in file order, collecting their warnings.  The
    /// first structural error aborts the whole building.
    pub fn from_record(
        record: &BuildingRecord,
        drawings: &dyn DrawingLoader,
        config: &LevelConfig,
    ) -> Result<LoadedBuilding> {
        let mut levels = Vec::with_capacity(record.levels.len());
        let mut warnings = vec![];
        for (name, level_record) in record.levels.iter() {
            let loaded = format::deserialize_level(name, level_record, drawings, config)?;
            levels.push(loaded.level);
            warnings.extend(loaded.warnings);
        }

        let building = Building {
            name: record.name.clone(),
            levels,
            other: record.other.clone(),
        };
        Ok(LoadedBuilding { building, warnings })
    }

    pub fn to_record(&self) -> BuildingRecord {
        let mut levels = OrderedMap::new();
        for level in self.levels.iter() {
            levels.insert(level.name.clone(), format::serialize_level(level));
        }
        BuildingRecord {
            name: self.name.clone(),
            levels,
            other: self.other.clone(),
        }
    }

    pub fn from_yaml_str(text: &str, drawings: &dyn DrawingLoader) -> Result<LoadedBuilding> {
        let record: BuildingRecord = serde_yaml::from_str(text).map_err(|err| {
            Error::new(
                ErrorKind::Import,
                ErrorCode::YamlDeserialization,
                Some(err.to_string()),
            )
        })?;
        Self::from_record(&record, drawings, &LevelConfig::default())
    }

    pub fn from_json_str(text: &str, drawings: &dyn DrawingLoader) -> Result<LoadedBuilding> {
        let record: BuildingRecord = serde_json::from_str(text).map_err(|err| {
            Error::new(
                ErrorKind::Import,
                ErrorCode::JsonDeserialization,
                Some(err.to_string()),
            )
        })?;
        Self::from_record(&record, drawings, &LevelConfig::default())
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.to_record()).map_err(|err| {
            Error::new(
                ErrorKind::Export,
                ErrorCode::YamlSerialization,
                Some(err.to_string()),
            )
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_record()).map_err(|err| {
            Error::new(
                ErrorKind::Export,
                ErrorCode::JsonSerialization,
                Some(err.to_string()),
            )
        })
    }

    pub fn level(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|level| level.name == name)
    }

    pub fn level_mut(&mut self, name: &str) -> Option<&mut Level> {
        self.levels.iter_mut().find(|level| level.name == name)
    }

    /// Sorted, de-duplicated model names placed anywhere in the building:
    /// the set of assets a simulator has to fetch.
    pub fn model_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .levels
            .iter()
            .flat_map(|level| level.models().iter())
            .map(|model| model.model_name.as_str())
            .collect();
        names.into_iter().map(str::to_owned).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::Model;
    use crate::drawing::NoDrawings;

    const TWO_LEVELS: &str = r#"
name: depot
lifts:
  lift_1: {depth: 2.0, width: 2.0}
levels:
  L2:
    elevation: 4.0
    x_meters: 30
    y_meters: 10
    models:
      - {name: c1, model_name: OfficeChair, x: 10, y: 10, yaw: 0.5, static: true}
  L1:
    x_meters: 30
    y_meters: 10
    models:
      - {name: t1, model_name: Table, x: 1, y: 2}
      - {name: c2, model_name: OfficeChair, x: 3, y: 4}
"#;

    #[test]
    fn test_levels_in_file_order() {
        let loaded = Building::from_yaml_str(TWO_LEVELS, &NoDrawings).unwrap();
        let building = loaded.building;
        assert!(loaded.warnings.is_empty());
        assert_eq!("depot", building.name);
        let names: Vec<&str> = building.levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(vec!["L2", "L1"], names);
        assert_eq!(4.0, building.level("L2").unwrap().elevation);
        assert!(building.level("L3").is_none());
    }

    #[test]
    fn test_model_names() {
        let mut building = Building::from_yaml_str(TWO_LEVELS, &NoDrawings)
            .unwrap()
            .building;
        assert_eq!(vec!["OfficeChair", "Table"], building.model_names());

        building.level_mut("L1").unwrap().add_model(Model {
            model_name: "Aardvark".to_string(),
            ..Default::default()
        });
        assert_eq!(vec!["Aardvark", "OfficeChair", "Table"], building.model_names());
    }

    #[test]
    fn test_other_keys_preserved() {
        let building = Building::from_yaml_str(TWO_LEVELS, &NoDrawings)
            .unwrap()
            .building;
        let record = building.to_record();
        assert_eq!(
            Some(&serde_json::json!({"lift_1": {"depth": 2.0, "width": 2.0}})),
            record.other.get("lifts")
        );

        let json = building.to_json_string().unwrap();
        let reloaded = Building::from_json_str(&json, &NoDrawings).unwrap().building;
        assert_eq!(record.other, reloaded.to_record().other);
        assert_eq!(building.model_names(), reloaded.model_names());
    }

    #[test]
    fn test_parse_errors() {
        let err = Building::from_yaml_str("levels: [1, 2", &NoDrawings).unwrap_err();
        assert_eq!(ErrorKind::Import, err.kind);
        assert_eq!(ErrorCode::YamlDeserialization, err.code);

        let err = Building::from_json_str("{\"levels\": 7}", &NoDrawings).unwrap_err();
        assert_eq!(ErrorCode::JsonDeserialization, err.code);

        let err = Building::from_yaml_str("levels:\n  L1: {x_meters: 3}\n", &NoDrawings)
            .unwrap_err();
        assert_eq!(ErrorCode::MissingDimension, err.code);
    }

    #[test]
    fn test_empty_building() {
        let building = Building::new("empty");
        let text = building.to_yaml_string().unwrap();
        let reloaded = Building::from_yaml_str(&text, &NoDrawings).unwrap().building;
        assert_eq!(building, reloaded);
    }
}
