//! The boundary with the traffic engine that owns the vehicles.

use crate::class::VehicleClass;
use crate::error::LookupError;
use crate::phase::PhaseIndex;
use crate::queue::{EdgeId, QueuedVehicle};
use std::fmt::Debug;
use std::hash::Hash;

/// A traffic engine the arbiter can observe and control, stepped synchronously.
///
/// Methods returning `Self::Error` report structural failures which end the run.
/// Per-vehicle queries return [LookupError] instead, which the arbiter absorbs.
pub trait TrafficEngine {
    /// The engine's vehicle identifier.
    type VehicleId: Clone + Eq + Hash + Debug;
    /// A structural engine failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Advances the engine by one tick.
    fn advance_one_tick(&mut self) -> Result<(), Self::Error>;

    /// Gets the vehicles waiting on an edge, ordered by arrival.
    fn queue_snapshot(&self, edge: &EdgeId) -> Result<Vec<Self::VehicleId>, Self::Error>;

    /// Gets every vehicle currently present in the engine.
    fn live_vehicles(&self) -> Result<Vec<Self::VehicleId>, Self::Error>;

    /// Gets the class of a vehicle.
    fn vehicle_class(&self, id: &Self::VehicleId) -> Result<VehicleClass, LookupError>;

    /// Gets the absolute deadline of a vehicle, or `None` if it has none.
    fn vehicle_deadline(&self, id: &Self::VehicleId) -> Result<Option<f64>, LookupError>;

    /// Applies a signal phase at the given intersection.
    fn set_signal_phase(&mut self, intersection: &str, phase: PhaseIndex)
        -> Result<(), Self::Error>;
}

/// A traffic engine that also accepts new vehicles.
pub trait AdmissionEngine: TrafficEngine {
    /// Inserts a vehicle of the given class at the back of an edge's queue.
    fn add_vehicle(
        &mut self,
        edge: &EdgeId,
        class: &VehicleClass,
    ) -> Result<Self::VehicleId, Self::Error>;

    /// Sets the absolute deadline of a vehicle.
    fn set_vehicle_deadline(&mut self, id: &Self::VehicleId, deadline: f64)
        -> Result<(), LookupError>;
}

/// Parses a deadline stored as a text attribute.
///
/// Empty text means the vehicle has no deadline. Anything that is not a finite
/// number is malformed.
pub fn parse_deadline(raw: &str) -> Result<Option<f64>, LookupError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(deadline) if deadline.is_finite() => Ok(Some(deadline)),
        _ => Err(LookupError::Malformed {
            attribute: "deadline",
            value: raw.to_owned(),
        }),
    }
}

/// Resolves a vehicle's class and deadline.
/// Lookup failures leave the corresponding field empty.
pub(crate) fn observe<E: TrafficEngine>(engine: &E, id: E::VehicleId) -> QueuedVehicle<E::VehicleId> {
    let class = engine
        .vehicle_class(&id)
        .map_err(|err| log::debug!("Class lookup for vehicle {:?} failed: {}", id, err))
        .ok();
    let deadline = engine
        .vehicle_deadline(&id)
        .map_err(|err| log::debug!("Deadline lookup for vehicle {:?} failed: {}", id, err))
        .ok()
        .flatten();
    QueuedVehicle {
        id,
        class,
        deadline,
    }
}
