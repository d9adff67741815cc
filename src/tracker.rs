use crate::class::{ClassTable, VehicleClass};
use crate::queue::QueuedVehicle;
use crate::Tick;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

/// The admission and miss counts of one vehicle class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassCount {
    pub class: VehicleClass,
    pub spawned: u64,
    pub missed: u64,
}

/// Per-class counters. Both counts only ever grow, and `missed <= spawned` always holds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassCounters {
    counts: Vec<ClassCount>,
}

/// Counts admitted vehicles and deadline misses per class.
///
/// A vehicle is counted as missed when it is observed live after its deadline
/// has passed, and never more than once. Vehicles that leave the engine before
/// an overrun is observed are never counted.
#[derive(Clone, Debug)]
pub struct DeadlineTracker<V> {
    counters: ClassCounters,
    /// Every vehicle ever flagged as missed; never shrinks.
    missed: HashSet<V>,
}

impl ClassCounters {
    /// Creates zeroed counters for the registered classes, in table order.
    pub fn new(classes: &ClassTable) -> Self {
        Self {
            counts: classes
                .iter()
                .map(|spec| ClassCount {
                    class: spec.class.clone(),
                    spawned: 0,
                    missed: 0,
                })
                .collect(),
        }
    }

    /// Gets the counts of a class.
    pub fn get(&self, class: &VehicleClass) -> Option<&ClassCount> {
        self.counts.iter().find(|count| count.class == *class)
    }

    /// Iterates over the counts in reporting order. Classes that were not
    /// registered follow the registered ones, in order of first admission.
    pub fn iter(&self) -> impl Iterator<Item = &ClassCount> {
        self.counts.iter()
    }

    fn record_spawn(&mut self, class: &VehicleClass) {
        match self.counts.iter_mut().find(|count| count.class == *class) {
            Some(count) => count.spawned += 1,
            None => self.counts.push(ClassCount {
                class: class.clone(),
                spawned: 1,
                missed: 0,
            }),
        }
    }

    /// Counts a miss, unless it would exceed the number of admissions.
    fn record_miss(&mut self, class: &VehicleClass) -> bool {
        match self.counts.iter_mut().find(|count| count.class == *class) {
            Some(count) if count.missed < count.spawned => {
                count.missed += 1;
                true
            }
            _ => false,
        }
    }
}

impl<V: Clone + Eq + Hash + Debug> DeadlineTracker<V> {
    /// Creates a tracker for the registered classes.
    pub fn new(classes: &ClassTable) -> Self {
        Self {
            counters: ClassCounters::new(classes),
            missed: HashSet::new(),
        }
    }

    /// Records the admission of a vehicle of the given class.
    pub fn record_admission(&mut self, class: &VehicleClass) {
        self.counters.record_spawn(class);
    }

    /// Whether the vehicle has already been flagged as missed.
    pub fn is_missed(&self, id: &V) -> bool {
        self.missed.contains(id)
    }

    /// The number of vehicles flagged as missed so far.
    pub fn missed_count(&self) -> usize {
        self.missed.len()
    }

    pub fn counters(&self) -> &ClassCounters {
        &self.counters
    }

    /// Flags every live vehicle whose deadline has passed at `now`.
    /// Returns the number of vehicles newly flagged.
    ///
    /// Vehicles without a deadline are skipped. Overdue vehicles whose class
    /// is unknown this tick are skipped too, and examined again next tick.
    pub fn check_and_record_misses(
        &mut self,
        now: Tick,
        live: impl IntoIterator<Item = QueuedVehicle<V>>,
    ) -> usize {
        let mut flagged = 0;
        for vehicle in live {
            if self.missed.contains(&vehicle.id) {
                continue;
            }
            let deadline = match vehicle.deadline {
                Some(deadline) if now as f64 > deadline => deadline,
                _ => continue,
            };
            let class = match vehicle.class {
                Some(class) => class,
                None => {
                    log::debug!(
                        "Vehicle {:?} is overdue but its class is unknown; retrying next tick",
                        vehicle.id
                    );
                    continue;
                }
            };

            if self.counters.record_miss(&class) {
                log::debug!(
                    "Vehicle {:?} ({}) missed its deadline {} at tick {}",
                    vehicle.id,
                    class,
                    deadline,
                    now
                );
            } else {
                log::warn!(
                    "Vehicle {:?} ({}) missed its deadline but its class has no matching admission; not counted",
                    vehicle.id,
                    class
                );
            }
            self.missed.insert(vehicle.id);
            flagged += 1;
        }
        flagged
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn live(id: u32, class: &str, deadline: Option<f64>) -> QueuedVehicle<u32> {
        QueuedVehicle {
            id,
            class: Some(class.into()),
            deadline,
        }
    }

    fn counts(tracker: &DeadlineTracker<u32>, class: &str) -> (u64, u64) {
        let count = tracker.counters().get(&class.into()).unwrap();
        (count.spawned, count.missed)
    }

    #[test]
    fn admissions_are_counted_per_class() {
        let mut tracker = DeadlineTracker::<u32>::new(&ClassTable::default());
        tracker.record_admission(&"HV".into());
        tracker.record_admission(&"LV".into());
        tracker.record_admission(&"LV".into());
        assert_eq!(counts(&tracker, "HV"), (1, 0));
        assert_eq!(counts(&tracker, "MV"), (0, 0));
        assert_eq!(counts(&tracker, "LV"), (2, 0));
    }

    #[test]
    fn miss_counted_once() {
        let mut tracker = DeadlineTracker::new(&ClassTable::default());
        tracker.record_admission(&"MV".into());
        for now in 80..90 {
            tracker.check_and_record_misses(now, [live(7, "MV", Some(80.0))]);
        }
        assert_eq!(counts(&tracker, "MV"), (1, 1));
        assert!(tracker.is_missed(&7));
        assert_eq!(tracker.missed_count(), 1);
    }

    #[test]
    fn deadline_tick_itself_is_not_a_miss() {
        let mut tracker = DeadlineTracker::new(&ClassTable::default());
        tracker.record_admission(&"HV".into());
        assert_eq!(tracker.check_and_record_misses(60, [live(1, "HV", Some(60.0))]), 0);
        assert_eq!(tracker.check_and_record_misses(61, [live(1, "HV", Some(60.0))]), 1);
    }

    #[test]
    fn vehicles_without_deadline_never_miss() {
        let mut tracker = DeadlineTracker::new(&ClassTable::default());
        tracker.record_admission(&"LV".into());
        tracker.check_and_record_misses(10_000, [live(1, "LV", None)]);
        assert_eq!(counts(&tracker, "LV"), (1, 0));
    }

    #[test]
    fn unknown_class_is_retried() {
        let mut tracker = DeadlineTracker::new(&ClassTable::default());
        tracker.record_admission(&"LV".into());
        let anonymous = QueuedVehicle {
            id: 3,
            class: None,
            deadline: Some(5.0),
        };
        assert_eq!(tracker.check_and_record_misses(10, [anonymous]), 0);
        assert!(!tracker.is_missed(&3));
        assert_eq!(tracker.check_and_record_misses(11, [live(3, "LV", Some(5.0))]), 1);
        assert_eq!(counts(&tracker, "LV"), (1, 1));
    }

    #[test]
    fn misses_never_exceed_admissions() {
        let mut tracker = DeadlineTracker::new(&ClassTable::default());
        tracker.record_admission(&"HV".into());
        let overdue = (0..5).map(|id| live(id, "HV", Some(0.0)));
        assert_eq!(tracker.check_and_record_misses(1, overdue), 5);
        assert_eq!(counts(&tracker, "HV"), (1, 1));
    }

    #[test]
    fn unregistered_classes_are_appended() {
        let mut tracker = DeadlineTracker::new(&ClassTable::default());
        tracker.record_admission(&"BUS".into());
        tracker.check_and_record_misses(5, [live(1, "BUS", Some(1.0))]);
        let classes: Vec<_> = tracker
            .counters()
            .iter()
            .map(|count| count.class.as_str())
            .collect();
        assert_eq!(classes, ["HV", "MV", "LV", "BUS"]);
        assert_eq!(counts(&tracker, "BUS"), (1, 1));
    }
}
