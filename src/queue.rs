use crate::class::VehicleClass;
use crate::Tick;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an incoming edge (approach) of the intersection.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// A vehicle waiting on an edge, as observed during one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct QueuedVehicle<V> {
    /// The engine's identifier for the vehicle.
    pub id: V,
    /// The vehicle's class, if it could be resolved this tick.
    pub class: Option<VehicleClass>,
    /// The vehicle's absolute deadline, if it carries a usable one.
    pub deadline: Option<f64>,
}

impl<V> QueuedVehicle<V> {
    /// Time left until the vehicle's deadline; negative once overdue.
    pub fn remaining(&self, now: Tick) -> Option<f64> {
        self.deadline.map(|deadline| deadline - now as f64)
    }
}

/// The vehicles waiting on one edge, ordered by arrival.
///
/// Queues are rebuilt from the engine every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Queue<V> {
    pub edge: EdgeId,
    pub vehicles: Vec<QueuedVehicle<V>>,
}

impl<V> Queue<V> {
    pub fn new(edge: EdgeId, vehicles: Vec<QueuedVehicle<V>>) -> Self {
        Self { edge, vehicles }
    }

    /// The number of vehicles waiting.
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// The smallest time-to-deadline among vehicles that carry a deadline.
    pub fn min_remaining(&self, now: Tick) -> Option<f64> {
        self.vehicles
            .iter()
            .filter_map(|vehicle| vehicle.remaining(now))
            .reduce(f64::min)
    }
}
