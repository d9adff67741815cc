use crate::error::{Error, Result};
use crate::queue::QueuedVehicle;
use crate::Tick;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A vehicle class label, such as `HV` (high priority) or `LV` (low priority).
///
/// Labels form an open set: a class missing from the [ClassTable]
/// is valid and simply carries no priority.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleClass(String);

impl VehicleClass {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VehicleClass {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VehicleClass({})", self.0)
    }
}

/// The static attributes of a registered vehicle class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassSpec {
    /// The class label.
    #[serde(rename = "label")]
    pub class: VehicleClass,
    /// The priority weight; higher is more urgent.
    pub weight: u32,
    /// The relative deadline granted at admission, in ticks.
    pub deadline_offset: Tick,
    /// The relative frequency with which the admission generator draws this class.
    #[serde(default)]
    pub share: f64,
}

/// The registered vehicle classes, in reporting order.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassTable {
    specs: Vec<ClassSpec>,
}

impl ClassTable {
    /// Creates a class table. Class labels must be unique.
    pub fn new(specs: Vec<ClassSpec>) -> Result<Self> {
        if let Some(dup) = specs.iter().map(|spec| &spec.class).duplicates().next() {
            return Err(Error::Configuration(format!(
                "vehicle class `{dup}` is registered more than once"
            )));
        }
        Ok(Self { specs })
    }

    /// Gets the registered attributes of a class.
    pub fn get(&self, class: &VehicleClass) -> Option<&ClassSpec> {
        self.specs.iter().find(|spec| spec.class == *class)
    }

    /// Gets the priority weight of a class. Unregistered classes weigh 0.
    pub fn weight(&self, class: &VehicleClass) -> u32 {
        self.get(class).map_or(0, |spec| spec.weight)
    }

    /// Iterates over the registered classes in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Finds the vehicle in a queue with the strictly greatest class weight.
    ///
    /// The first vehicle seen wins ties. Vehicles of weight 0, including those
    /// whose class is unknown, are never returned.
    pub fn highest_priority_vehicle<'a, V>(
        &self,
        vehicles: &'a [QueuedVehicle<V>],
    ) -> Option<&'a QueuedVehicle<V>> {
        let mut best = None;
        let mut best_weight = 0;
        for vehicle in vehicles {
            let weight = vehicle.class.as_ref().map_or(0, |class| self.weight(class));
            if weight > best_weight {
                best_weight = weight;
                best = Some(vehicle);
            }
        }
        best
    }

    /// Gets the weight of the highest priority vehicle in a queue, or 0.
    pub fn top_weight<V>(&self, vehicles: &[QueuedVehicle<V>]) -> u32 {
        self.highest_priority_vehicle(vehicles)
            .and_then(|vehicle| vehicle.class.as_ref())
            .map_or(0, |class| self.weight(class))
    }
}

impl Default for ClassTable {
    fn default() -> Self {
        let spec = |label: &str, weight, deadline_offset, share| ClassSpec {
            class: label.into(),
            weight,
            deadline_offset,
            share,
        };
        Self {
            specs: vec![
                spec("HV", 3, 60, 0.05),
                spec("MV", 2, 80, 0.15),
                spec("LV", 1, 100, 0.80),
            ],
        }
    }
}
