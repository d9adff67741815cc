use crate::admission::{Admission, Spawner};
use crate::config::Config;
use crate::engine::{observe, AdmissionEngine, TrafficEngine};
use crate::error::{Error, Result};
use crate::phase::{PhaseController, PhaseIndex, SchedulingState};
use crate::queue::{EdgeId, Queue};
use crate::report::{summarize, Report};
use crate::tracker::DeadlineTracker;
use crate::Tick;

/// Arbitrates right-of-way at one intersection of a traffic engine.
///
/// Each call to [Arbiter::step] runs one complete tick: the engine steps,
/// new vehicles are admitted, deadline misses are recorded, and if the
/// minimum green time has elapsed a queue is selected and its phase applied.
pub struct Arbiter<E: TrafficEngine, A = ()> {
    /// The static configuration.
    config: Config,
    /// The engine being controlled.
    engine: E,
    /// Admits new vehicles each tick.
    admission: A,
    /// Dwell enforcement and the edge to phase mapping.
    controller: PhaseController,
    /// The queue being served.
    state: SchedulingState,
    /// Admission and miss accounting.
    tracker: DeadlineTracker<E::VehicleId>,
    /// The number of ticks completed.
    tick: Tick,
}

/// The outcome of one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickOutcome {
    /// The tick that was run.
    pub tick: Tick,
    /// The decision committed during the tick, if one was due.
    pub decision: Option<Decision>,
    /// The number of vehicles newly flagged as having missed their deadline.
    pub missed: usize,
    /// The total number of vehicles waiting on the tracked edges.
    pub waiting: usize,
}

/// A committed choice of queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub edge: EdgeId,
    pub phase: PhaseIndex,
}

impl<E: TrafficEngine> Arbiter<E> {
    /// Creates an arbiter for the given engine. Vehicles are expected to be
    /// admitted externally; see [Arbiter::with_admission].
    pub fn new(config: Config, engine: E) -> Result<Self> {
        config.validate()?;
        let controller = PhaseController::new(config.phases.clone(), config.min_green);
        let tracker = DeadlineTracker::new(&config.classes);
        Ok(Self {
            config,
            engine,
            admission: (),
            controller,
            state: SchedulingState::default(),
            tracker,
            tick: 0,
        })
    }
}

impl<E: AdmissionEngine> Arbiter<E> {
    /// Attaches a [Spawner] built from the configured admission settings.
    pub fn with_spawner(self) -> Result<Arbiter<E, Spawner>> {
        let spawner = Spawner::new(&self.config)?;
        Ok(self.with_admission(spawner))
    }
}

impl<E: TrafficEngine, A: Admission<E>> Arbiter<E, A> {
    /// Replaces the admission hook.
    pub fn with_admission<B: Admission<E>>(self, admission: B) -> Arbiter<E, B> {
        Arbiter {
            config: self.config,
            engine: self.engine,
            admission,
            controller: self.controller,
            state: self.state,
            tracker: self.tracker,
            tick: self.tick,
        }
    }

    /// Runs until the configured tick budget is spent, then reports.
    pub fn run(&mut self) -> Result<Report> {
        self.run_until(|_| false)
    }

    /// Runs until the tick budget is spent or `stop` returns true after a tick.
    pub fn run_until(&mut self, mut stop: impl FnMut(&TickOutcome) -> bool) -> Result<Report> {
        log::info!(
            "Arbitrating {} over {:?} using {} (min green {}, {} ticks)",
            self.config.intersection,
            self.config.edges,
            self.config.discipline,
            self.config.min_green,
            self.config.max_ticks
        );
        while self.tick < self.config.max_ticks {
            let outcome = self.step()?;
            if stop(&outcome) {
                log::info!("Stopped on request after tick {}", outcome.tick);
                break;
            }
        }
        let report = self.report();
        log::info!(
            "Finished after {} ticks: {} of {} vehicles missed their deadline",
            self.tick,
            report.overall.missed,
            report.overall.spawned
        );
        Ok(report)
    }

    /// Runs a single tick.
    pub fn step(&mut self) -> Result<TickOutcome> {
        let now = self.tick;
        self.engine.advance_one_tick().map_err(Error::engine)?;

        self.admission
            .admit(now, &self.config.edges, &mut self.engine, &mut self.tracker);
        let missed = self.record_misses(now)?;

        let queues = self.snapshot()?;
        let waiting = queues.iter().map(Queue::len).sum();

        let decision = if self.controller.is_decision_due(&self.state) {
            let edge = self
                .config
                .discipline
                .pick(&queues, &self.config.classes, now)?
                .clone();
            let phase = self.controller.commit(&mut self.state, edge.clone());
            self.engine
                .set_signal_phase(&self.config.intersection, phase)
                .map_err(Error::engine)?;
            log::debug!(
                "Tick {}: serving {} with phase {} ({})",
                now,
                edge,
                phase,
                self.config.discipline
            );
            Some(Decision { edge, phase })
        } else {
            None
        };

        self.controller.advance(&mut self.state);
        log::trace!(
            "Tick {}: {:?} held for {} ticks",
            now,
            self.state.current,
            self.state.ticks_in_phase
        );
        self.tick += 1;

        Ok(TickOutcome {
            tick: now,
            decision,
            missed,
            waiting,
        })
    }

    /// Observes the tracked edges, in traversal order.
    pub fn snapshot(&self) -> Result<Vec<Queue<E::VehicleId>>> {
        self.config
            .edges
            .iter()
            .map(|edge| -> Result<Queue<E::VehicleId>> {
                let ids = self.engine.queue_snapshot(edge).map_err(Error::engine)?;
                let vehicles = ids.into_iter().map(|id| observe(&self.engine, id)).collect();
                Ok(Queue::new(edge.clone(), vehicles))
            })
            .collect()
    }

    /// Summarises the deadline accounting so far.
    pub fn report(&self) -> Report {
        summarize(self.tracker.counters())
    }

    /// Flags live vehicles that are past their deadline.
    fn record_misses(&mut self, now: Tick) -> Result<usize> {
        let live = self.engine.live_vehicles().map_err(Error::engine)?;
        let observed = live
            .into_iter()
            .filter(|id| !self.tracker.is_missed(id))
            .map(|id| observe(&self.engine, id))
            .collect::<Vec<_>>();
        Ok(self.tracker.check_and_record_misses(now, observed))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn state(&self) -> &SchedulingState {
        &self.state
    }

    pub fn tracker(&self) -> &DeadlineTracker<E::VehicleId> {
        &self.tracker
    }

    /// Gives access to the tracker, e.g. to record externally admitted vehicles.
    pub fn tracker_mut(&mut self) -> &mut DeadlineTracker<E::VehicleId> {
        &mut self.tracker
    }

    /// The number of ticks completed.
    pub fn tick(&self) -> Tick {
        self.tick
    }
}
