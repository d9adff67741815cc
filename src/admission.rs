//! Periodic generation of new vehicles.

use crate::class::VehicleClass;
use crate::config::Config;
use crate::engine::{AdmissionEngine, TrafficEngine};
use crate::error::{Error, Result};
use crate::queue::EdgeId;
use crate::tracker::DeadlineTracker;
use crate::Tick;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, WeightedIndex};

/// Admits new vehicles into the engine. Runs once per tick, after the engine
/// has stepped and before deadline misses are checked.
pub trait Admission<E: TrafficEngine> {
    fn admit(
        &mut self,
        now: Tick,
        edges: &[EdgeId],
        engine: &mut E,
        tracker: &mut DeadlineTracker<E::VehicleId>,
    );
}

/// No admissions; vehicles arrive by some other means.
impl<E: TrafficEngine> Admission<E> for () {
    fn admit(
        &mut self,
        _: Tick,
        _: &[EdgeId],
        _: &mut E,
        _: &mut DeadlineTracker<E::VehicleId>,
    ) {
    }
}

/// Admits one vehicle on every edge at a fixed interval, drawing each
/// vehicle's class from the configured class shares.
#[derive(Clone, Debug)]
pub struct Spawner {
    interval: Tick,
    /// Each drawable class with its deadline offset.
    classes: Vec<(VehicleClass, Tick)>,
    /// `None` when admission is disabled.
    distr: Option<WeightedIndex<f64>>,
    rng: StdRng,
}

impl Spawner {
    /// Creates a spawner from the admission settings and class table.
    /// A spawner built from disabled settings never admits anything.
    pub fn new(config: &Config) -> Result<Self> {
        let settings = &config.admission;
        let distr = if settings.enabled {
            if settings.interval == 0 {
                return Err(Error::Configuration(
                    "admission interval must be at least one tick".into(),
                ));
            }
            let distr = WeightedIndex::new(config.classes.iter().map(|spec| spec.share))
                .map_err(|err| Error::Configuration(format!("invalid class shares: {err}")))?;
            Some(distr)
        } else {
            log::info!("Admission is disabled; no vehicles will be generated");
            None
        };
        let classes = config
            .classes
            .iter()
            .map(|spec| (spec.class.clone(), spec.deadline_offset))
            .collect();
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            interval: settings.interval,
            classes,
            distr,
            rng,
        })
    }

    /// Whether vehicles are admitted at this tick.
    pub fn is_due(&self, now: Tick) -> bool {
        self.distr.is_some() && now % self.interval == 0
    }

    /// Draws a class and its deadline offset, unless admission is disabled.
    fn draw(&mut self) -> Option<&(VehicleClass, Tick)> {
        let idx = self.distr.as_ref()?.sample(&mut self.rng);
        Some(&self.classes[idx])
    }
}

impl<E: AdmissionEngine> Admission<E> for Spawner {
    fn admit(
        &mut self,
        now: Tick,
        edges: &[EdgeId],
        engine: &mut E,
        tracker: &mut DeadlineTracker<E::VehicleId>,
    ) {
        if !self.is_due(now) {
            return;
        }
        for edge in edges {
            let (class, offset) = match self.draw() {
                Some(drawn) => drawn.clone(),
                None => return,
            };
            let id = match engine.add_vehicle(edge, &class) {
                Ok(id) => id,
                Err(err) => {
                    log::debug!("Could not admit a {} vehicle on {}: {}", class, edge, err);
                    continue;
                }
            };
            tracker.record_admission(&class);

            let deadline = now as f64 + offset as f64;
            match engine.set_vehicle_deadline(&id, deadline) {
                Ok(()) => log::debug!(
                    "Admitted {:?} ({}) on {} with deadline {}",
                    id,
                    class,
                    edge,
                    deadline
                ),
                Err(err) => log::warn!(
                    "Admitted {:?} ({}) on {} without a deadline: {}",
                    id,
                    class,
                    edge,
                    err
                ),
            }
        }
    }
}
