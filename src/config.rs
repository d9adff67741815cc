//! Static configuration of an arbitrated intersection.

use crate::class::{ClassSpec, ClassTable};
use crate::error::{Error, Result};
use crate::phase::{PhaseIndex, PhaseTable, DEFAULT_MIN_GREEN};
use crate::queue::EdgeId;
use crate::selector::Discipline;
use crate::Tick;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The static configuration of one arbitrated intersection.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The controlled intersection, as named by the engine.
    pub intersection: String,
    /// The tracked incoming edges. Ties are broken in this order.
    pub edges: Vec<EdgeId>,
    /// The phase serving each edge.
    pub phases: PhaseTable,
    /// The registered vehicle classes.
    pub classes: ClassTable,
    /// The minimum number of ticks between decisions.
    pub min_green: u32,
    /// The discipline used for the whole run.
    pub discipline: Discipline,
    /// The number of ticks in a run.
    pub max_ticks: Tick,
    /// The admission generator's settings.
    pub admission: AdmissionConfig,
}

/// Settings for the periodic admission generator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdmissionConfig {
    /// Whether vehicles are generated at all.
    pub enabled: bool,
    /// One vehicle per edge is admitted every this many ticks.
    pub interval: Tick,
    /// Seed for reproducible class draws; drawn from entropy if absent.
    pub seed: Option<u64>,
}

/// The on-disk shape of a [Config]. Absent fields take their default values.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub intersection: Option<String>,
    pub edges: Option<Vec<EdgeId>>,
    pub phases: Option<PhaseFile>,
    pub classes: Option<Vec<ClassSpec>>,
    pub min_green: Option<u32>,
    pub discipline: Option<String>,
    pub max_ticks: Option<Tick>,
    pub admission: Option<AdmissionConfig>,
}

/// The on-disk shape of a [PhaseTable].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhaseFile {
    pub table: BTreeMap<EdgeId, PhaseIndex>,
    pub default: PhaseIndex,
}

impl Config {
    /// Parses and validates a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(text)?;
        Self::try_from(file)
    }

    /// Checks the static tables for consistency.
    pub fn validate(&self) -> Result<()> {
        if self.intersection.is_empty() {
            return Err(Error::Configuration("intersection id is empty".into()));
        }
        if self.edges.is_empty() {
            return Err(Error::Configuration("no incoming edges are tracked".into()));
        }
        if let Some(dup) = self.edges.iter().duplicates().next() {
            return Err(Error::Configuration(format!(
                "edge `{dup}` is tracked more than once"
            )));
        }
        if let Some((edge, _)) = self.phases.iter().find(|(edge, _)| !self.edges.contains(edge)) {
            return Err(Error::Configuration(format!(
                "phase table maps `{edge}`, which is not a tracked edge"
            )));
        }
        if self.admission.enabled {
            self.validate_admission()?;
        }
        Ok(())
    }

    fn validate_admission(&self) -> Result<()> {
        if self.admission.interval == 0 {
            return Err(Error::Configuration(
                "admission interval must be at least one tick".into(),
            ));
        }
        if let Some(spec) = self
            .classes
            .iter()
            .find(|spec| !spec.share.is_finite() || spec.share < 0.0)
        {
            return Err(Error::Configuration(format!(
                "class `{}` has an invalid share {}",
                spec.class, spec.share
            )));
        }
        if self.classes.iter().all(|spec| spec.share == 0.0) {
            return Err(Error::Configuration(
                "admission is enabled but no class has a positive share".into(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<ConfigFile> for Config {
    type Error = Error;

    fn try_from(file: ConfigFile) -> Result<Self> {
        let defaults = Config::default();
        let config = Config {
            intersection: file.intersection.unwrap_or(defaults.intersection),
            edges: file.edges.unwrap_or(defaults.edges),
            phases: file
                .phases
                .map_or(defaults.phases, |p| PhaseTable::new(p.table, p.default)),
            classes: match file.classes {
                Some(specs) => ClassTable::new(specs)?,
                None => defaults.classes,
            },
            min_green: file.min_green.unwrap_or(defaults.min_green),
            discipline: match file.discipline {
                Some(name) => name.parse()?,
                None => defaults.discipline,
            },
            max_ticks: file.max_ticks.unwrap_or(defaults.max_ticks),
            admission: file.admission.unwrap_or(defaults.admission),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            intersection: "J1".into(),
            edges: ["E0", "-E1", "-E2", "-E3"].map(EdgeId::from).to_vec(),
            phases: PhaseTable::default(),
            classes: ClassTable::default(),
            min_green: DEFAULT_MIN_GREEN,
            discipline: Discipline::EarliestDeadlineFirst,
            max_ticks: 2000,
            admission: AdmissionConfig::default(),
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 10,
            seed: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn full_file() {
        let config = Config::from_json(
            r#"{
                "intersection": "X9",
                "edges": ["north", "south", "east"],
                "phases": { "table": { "north": 0, "south": 0, "east": 1 }, "default": 4 },
                "classes": [
                    { "label": "EMS", "weight": 5, "deadline_offset": 30, "share": 0.1 },
                    { "label": "CAR", "weight": 1, "deadline_offset": 120, "share": 0.9 }
                ],
                "min_green": 5,
                "discipline": "fixed",
                "max_ticks": 300,
                "admission": { "interval": 4, "seed": 7 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.intersection, "X9");
        assert_eq!(config.edges[2], EdgeId::from("east"));
        assert_eq!(config.phases.phase_for(&"east".into()), 1);
        assert_eq!(config.phases.default_phase(), 4);
        assert_eq!(config.classes.weight(&"EMS".into()), 5);
        assert_eq!(config.min_green, 5);
        assert_eq!(config.discipline, Discipline::FixedPriority);
        assert_eq!(config.max_ticks, 300);
        assert!(config.admission.enabled);
        assert_eq!(config.admission.interval, 4);
        assert_eq!(config.admission.seed, Some(7));
    }

    #[test]
    fn unknown_discipline_is_invalid_input() {
        let err = Config::from_json(r#"{ "discipline": "lottery" }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "got: {err}");
    }

    #[test]
    fn malformed_tables_are_rejected() {
        for text in [
            r#"{ "edges": [] }"#,
            r#"{ "edges": ["A", "B", "A"] }"#,
            r#"{ "edges": ["A"], "phases": { "table": { "B": 1 } } }"#,
            r#"{ "intersection": "" }"#,
            r#"{ "admission": { "interval": 0 } }"#,
            r#"{ "classes": [ { "label": "HV", "weight": 3, "deadline_offset": 60 } ] }"#,
        ] {
            let err = Config::from_json(text).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "{text}: {err}");
        }
    }

    #[test]
    fn zero_shares_allowed_without_admission() {
        let text = r#"{
            "classes": [ { "label": "HV", "weight": 3, "deadline_offset": 60 } ],
            "admission": { "enabled": false }
        }"#;
        assert!(!Config::from_json(text).unwrap().admission.enabled);
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        assert!(matches!(Config::from_json("{ edges"), Err(Error::Parse(_))));
        assert!(matches!(
            Config::from_json(r#"{ "min_green": -1 }"#),
            Err(Error::Parse(_))
        ));
    }
}
