pub use admission::{Admission, Spawner};
pub use arbiter::{Arbiter, Decision, TickOutcome};
pub use class::{ClassSpec, ClassTable, VehicleClass};
pub use config::{AdmissionConfig, Config, ConfigFile};
pub use engine::{parse_deadline, AdmissionEngine, TrafficEngine};
pub use error::{Error, LookupError, Result};
pub use phase::{PhaseController, PhaseIndex, PhaseTable, SchedulingState};
pub use queue::{EdgeId, Queue, QueuedVehicle};
pub use report::{summarize, ClassSummary, Report, Totals};
pub use selector::{pick_edf, pick_fp, Discipline};
pub use simulation::{QueueSimulation, SimError};
use slotmap::new_key_type;
pub use slotmap::{Key, KeyData};
pub use tracker::{ClassCount, ClassCounters, DeadlineTracker};

mod admission;
mod arbiter;
mod class;
pub mod config;
mod engine;
mod error;
mod phase;
mod queue;
mod report;
mod selector;
mod simulation;
mod tracker;

new_key_type! {
    /// Unique ID of a vehicle in a [QueueSimulation].
    pub struct VehicleId;
}

/// A point in simulated time, counted in whole ticks.
pub type Tick = u64;
