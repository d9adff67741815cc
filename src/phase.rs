use crate::queue::EdgeId;
use std::collections::BTreeMap;

/// The index of a signal phase in the controller's program.
pub type PhaseIndex = u32;

/// The default minimum number of ticks a served queue keeps its green.
pub const DEFAULT_MIN_GREEN: u32 = 8;

/// A static mapping from edges to the signal phase that gives them green.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseTable {
    /// Explicitly mapped edges.
    phases: BTreeMap<EdgeId, PhaseIndex>,
    /// The phase used for edges without an explicit mapping.
    default: PhaseIndex,
}

/// The arbiter's view of which queue is being served.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchedulingState {
    /// The queue currently being served, if a decision has been made.
    pub current: Option<EdgeId>,
    /// The number of ticks since the current queue was committed.
    pub ticks_in_phase: u32,
}

/// Enforces the minimum dwell time and translates decisions into phases.
#[derive(Clone, Debug)]
pub struct PhaseController {
    table: PhaseTable,
    min_green: u32,
}

impl PhaseTable {
    /// Creates a phase table.
    pub fn new(phases: impl IntoIterator<Item = (EdgeId, PhaseIndex)>, default: PhaseIndex) -> Self {
        Self {
            phases: phases.into_iter().collect(),
            default,
        }
    }

    /// Gets the phase that serves the given edge.
    pub fn phase_for(&self, edge: &EdgeId) -> PhaseIndex {
        self.phases.get(edge).copied().unwrap_or(self.default)
    }

    /// The phase used for unmapped edges.
    pub fn default_phase(&self) -> PhaseIndex {
        self.default
    }

    /// Iterates over the explicitly mapped edges.
    pub fn iter(&self) -> impl Iterator<Item = (&EdgeId, PhaseIndex)> {
        self.phases.iter().map(|(edge, phase)| (edge, *phase))
    }
}

impl PhaseController {
    /// Creates a phase controller.
    pub fn new(table: PhaseTable, min_green: u32) -> Self {
        Self { table, min_green }
    }

    pub fn table(&self) -> &PhaseTable {
        &self.table
    }

    pub fn min_green(&self) -> u32 {
        self.min_green
    }

    /// Whether a new queue may be selected: either nothing is served yet,
    /// or the current queue has held green for at least the minimum time.
    pub fn is_decision_due(&self, state: &SchedulingState) -> bool {
        state.current.is_none() || state.ticks_in_phase >= self.min_green
    }

    /// Commits to serving `edge`, returning the phase to apply.
    pub fn commit(&self, state: &mut SchedulingState, edge: EdgeId) -> PhaseIndex {
        let phase = self.table.phase_for(&edge);
        state.current = Some(edge);
        state.ticks_in_phase = 0;
        phase
    }

    /// Advances the dwell counter by one tick.
    pub fn advance(&self, state: &mut SchedulingState) {
        state.ticks_in_phase = state.ticks_in_phase.saturating_add(1);
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        Self::new(
            [("E0", 0), ("-E2", 0), ("-E1", 2), ("-E3", 2)]
                .map(|(edge, phase)| (EdgeId::from(edge), phase)),
            0,
        )
    }
}
