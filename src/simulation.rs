use crate::class::VehicleClass;
use crate::config::Config;
use crate::engine::{parse_deadline, AdmissionEngine, TrafficEngine};
use crate::error::LookupError;
use crate::phase::PhaseIndex;
use crate::queue::EdgeId;
use crate::{Tick, VehicleId};
use slotmap::SlotMap;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Ticks between departures from a green edge.
const DEFAULT_DISCHARGE_INTERVAL: Tick = 2;

/// A store-and-forward model of a single intersection.
///
/// Vehicles wait in a FIFO on their edge. Every edge served by the applied
/// phase releases its head vehicle once per discharge interval, and released
/// vehicles leave the simulation.
#[derive(Clone, Debug)]
pub struct QueueSimulation {
    /// The controlled intersection.
    intersection: String,
    /// The incoming edges.
    edges: Vec<SimEdge>,
    /// The vehicles being simulated.
    vehicles: SlotMap<VehicleId, SimVehicle>,
    /// The phase currently applied, if any.
    phase: Option<PhaseIndex>,
    /// Ticks between departures from a green edge.
    discharge_interval: Tick,
    /// The current frame of simulation.
    frame: Tick,
}

#[derive(Clone, Debug)]
struct SimEdge {
    id: EdgeId,
    /// The phase which gives this edge green.
    phase: PhaseIndex,
    /// Waiting vehicles, front first.
    queue: VecDeque<VehicleId>,
}

#[derive(Clone, Debug)]
struct SimVehicle {
    class: VehicleClass,
    /// The deadline attribute, stored as text; empty when unset.
    deadline: String,
}

/// A structural failure of the queue simulation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("unknown intersection `{0}`")]
    UnknownIntersection(String),
    #[error("unknown edge `{0}`")]
    UnknownEdge(EdgeId),
}

impl QueueSimulation {
    /// Creates an empty simulation of the configured intersection.
    pub fn new(config: &Config) -> Self {
        Self {
            intersection: config.intersection.clone(),
            edges: config
                .edges
                .iter()
                .map(|edge| SimEdge {
                    id: edge.clone(),
                    phase: config.phases.phase_for(edge),
                    queue: VecDeque::new(),
                })
                .collect(),
            vehicles: SlotMap::with_key(),
            phase: None,
            discharge_interval: DEFAULT_DISCHARGE_INTERVAL,
            frame: 0,
        }
    }

    /// Sets the number of ticks between departures from a green edge.
    pub fn with_discharge_interval(mut self, ticks: Tick) -> Self {
        self.discharge_interval = ticks.max(1);
        self
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> Tick {
        self.frame
    }

    /// The phase currently applied.
    pub fn phase(&self) -> Option<PhaseIndex> {
        self.phase
    }

    /// The number of vehicles present.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// The number of vehicles waiting on an edge.
    pub fn queue_len(&self, edge: &EdgeId) -> Option<usize> {
        self.edge(edge).map(|edge| edge.queue.len())
    }

    /// Removes a vehicle from the simulation.
    pub fn remove_vehicle(&mut self, id: VehicleId) {
        if self.vehicles.remove(id).is_some() {
            for edge in &mut self.edges {
                edge.queue.retain(|v| *v != id);
            }
        }
    }

    /// Overwrites a vehicle's deadline attribute with raw text.
    pub fn set_deadline_text(&mut self, id: VehicleId, text: &str) -> Result<(), LookupError> {
        let vehicle = self.vehicles.get_mut(id).ok_or(LookupError::VehicleGone)?;
        vehicle.deadline = text.to_owned();
        Ok(())
    }

    fn edge(&self, id: &EdgeId) -> Option<&SimEdge> {
        self.edges.iter().find(|edge| edge.id == *id)
    }

    fn vehicle(&self, id: VehicleId) -> Result<&SimVehicle, LookupError> {
        self.vehicles.get(id).ok_or(LookupError::VehicleGone)
    }

    /// Releases the head vehicle of every green edge.
    fn discharge(&mut self) {
        let phase = match self.phase {
            Some(phase) => phase,
            None => return,
        };
        let exited = self
            .edges
            .iter_mut()
            .filter(|edge| edge.phase == phase)
            .filter_map(|edge| edge.queue.pop_front())
            .collect::<SmallVec<[_; 4]>>();
        for vehicle_id in exited {
            self.vehicles.remove(vehicle_id);
        }
    }
}

impl TrafficEngine for QueueSimulation {
    type VehicleId = VehicleId;
    type Error = SimError;

    fn advance_one_tick(&mut self) -> Result<(), SimError> {
        self.frame += 1;
        if self.frame % self.discharge_interval == 0 {
            self.discharge();
        }
        Ok(())
    }

    fn queue_snapshot(&self, edge: &EdgeId) -> Result<Vec<VehicleId>, SimError> {
        self.edge(edge)
            .map(|edge| edge.queue.iter().copied().collect())
            .ok_or_else(|| SimError::UnknownEdge(edge.clone()))
    }

    fn live_vehicles(&self) -> Result<Vec<VehicleId>, SimError> {
        Ok(self.vehicles.keys().collect())
    }

    fn vehicle_class(&self, id: &VehicleId) -> Result<VehicleClass, LookupError> {
        self.vehicle(*id).map(|vehicle| vehicle.class.clone())
    }

    fn vehicle_deadline(&self, id: &VehicleId) -> Result<Option<f64>, LookupError> {
        parse_deadline(&self.vehicle(*id)?.deadline)
    }

    fn set_signal_phase(&mut self, intersection: &str, phase: PhaseIndex) -> Result<(), SimError> {
        if intersection != self.intersection {
            return Err(SimError::UnknownIntersection(intersection.to_owned()));
        }
        self.phase = Some(phase);
        Ok(())
    }
}

impl AdmissionEngine for QueueSimulation {
    fn add_vehicle(&mut self, edge: &EdgeId, class: &VehicleClass) -> Result<VehicleId, SimError> {
        let idx = self
            .edges
            .iter()
            .position(|e| e.id == *edge)
            .ok_or_else(|| SimError::UnknownEdge(edge.clone()))?;
        let vehicle_id = self.vehicles.insert(SimVehicle {
            class: class.clone(),
            deadline: String::new(),
        });
        self.edges[idx].queue.push_back(vehicle_id);
        Ok(vehicle_id)
    }

    fn set_vehicle_deadline(&mut self, id: &VehicleId, deadline: f64) -> Result<(), LookupError> {
        self.set_deadline_text(*id, &deadline.to_string())
    }
}
