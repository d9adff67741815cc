//! Queue selection disciplines.
//!
//! Every selector walks the queues in the order given, which must be the
//! fixed edge order of the intersection; ties always go to the queue seen first.

use crate::class::ClassTable;
use crate::error::{Error, Result};
use crate::queue::{EdgeId, Queue};
use crate::Tick;
use std::fmt;
use std::str::FromStr;

/// The weight of one unit of class priority relative to one queued vehicle.
const PRIORITY_SCALE: u64 = 100;

/// The scheduling discipline used to pick the next queue to serve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Discipline {
    /// Favour the queue holding the highest priority class, then the longest queue.
    FixedPriority,
    /// Favour the queue holding the vehicle closest to (or furthest past) its deadline.
    EarliestDeadlineFirst,
}

impl Discipline {
    /// Picks the queue to serve next under this discipline.
    pub fn pick<'a, V>(
        self,
        queues: &'a [Queue<V>],
        classes: &ClassTable,
        now: Tick,
    ) -> Result<&'a EdgeId> {
        match self {
            Self::FixedPriority => pick_fp(queues, classes),
            Self::EarliestDeadlineFirst => pick_edf(queues, now),
        }
    }
}

impl FromStr for Discipline {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "fp" | "fixed" | "fixed-priority" => Ok(Self::FixedPriority),
            "edf" | "earliest-deadline-first" => Ok(Self::EarliestDeadlineFirst),
            _ => Err(Error::InvalidInput(format!(
                "unknown discipline `{name}`; expected `fp` or `edf`"
            ))),
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FixedPriority => "fp",
            Self::EarliestDeadlineFirst => "edf",
        })
    }
}

/// Picks a queue under the fixed-priority discipline.
///
/// Each queue scores `top_weight * 100 + length`, where `top_weight` is the weight
/// of the highest priority class waiting on it. The highest score wins.
/// When every queue is empty the longest queue is picked instead.
pub fn pick_fp<'a, V>(queues: &'a [Queue<V>], classes: &ClassTable) -> Result<&'a EdgeId> {
    let mut best = None;
    let mut best_score = 0;
    for queue in queues {
        let score = classes.top_weight(&queue.vehicles) as u64 * PRIORITY_SCALE
            + queue.len() as u64;
        if score > best_score {
            best_score = score;
            best = Some(&queue.edge);
        }
    }

    best.or_else(|| longest_queue(queues)).ok_or_else(no_queues)
}

/// Picks a queue under the earliest-deadline-first discipline.
///
/// The queue whose most urgent vehicle has the least time remaining wins.
/// Vehicles without a deadline are ignored; when no queue holds a vehicle
/// with a deadline the longest queue is picked instead.
pub fn pick_edf<V>(queues: &[Queue<V>], now: Tick) -> Result<&EdgeId> {
    let mut best = None;
    let mut best_remaining = f64::INFINITY;
    for queue in queues {
        if let Some(remaining) = queue.min_remaining(now) {
            if remaining < best_remaining {
                best_remaining = remaining;
                best = Some(&queue.edge);
            }
        }
    }

    best.or_else(|| longest_queue(queues)).ok_or_else(no_queues)
}

/// The longest queue, with the first one seen winning ties.
fn longest_queue<V>(queues: &[Queue<V>]) -> Option<&EdgeId> {
    queues
        .iter()
        .reduce(|best, queue| if queue.len() > best.len() { queue } else { best })
        .map(|queue| &queue.edge)
}

fn no_queues() -> Error {
    Error::InvalidInput("cannot select from an empty set of queues".into())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::queue::QueuedVehicle;
    use rand::{Rng, SeedableRng};

    fn classed(classes: &[&str]) -> Vec<QueuedVehicle<usize>> {
        classes
            .iter()
            .enumerate()
            .map(|(id, class)| QueuedVehicle {
                id,
                class: Some((*class).into()),
                deadline: None,
            })
            .collect()
    }

    fn timed(deadlines: &[Option<f64>]) -> Vec<QueuedVehicle<usize>> {
        deadlines
            .iter()
            .enumerate()
            .map(|(id, deadline)| QueuedVehicle {
                id,
                class: None,
                deadline: *deadline,
            })
            .collect()
    }

    fn queue(edge: &str, vehicles: Vec<QueuedVehicle<usize>>) -> Queue<usize> {
        Queue::new(edge.into(), vehicles)
    }

    #[test]
    fn fp_priority_beats_length() {
        let classes = ClassTable::default();
        let queues = [
            queue("A", classed(&["HV"])),
            queue("B", classed(&["LV", "LV", "LV", "LV"])),
        ];
        assert_eq!(pick_fp(&queues, &classes).unwrap().as_str(), "A");
    }

    #[test]
    fn fp_length_breaks_equal_priority() {
        let classes = ClassTable::default();
        let queues = [
            queue("A", classed(&["MV"])),
            queue("B", classed(&["LV", "MV", "LV"])),
        ];
        assert_eq!(pick_fp(&queues, &classes).unwrap().as_str(), "B");
    }

    #[test]
    fn fp_equal_scores_go_to_first() {
        let classes = ClassTable::default();
        let queues = [
            queue("A", classed(&["LV", "MV"])),
            queue("B", classed(&["MV", "LV"])),
        ];
        for _ in 0..10 {
            assert_eq!(pick_fp(&queues, &classes).unwrap().as_str(), "A");
        }
    }

    #[test]
    fn fp_unknown_classes_still_count_length() {
        let classes = ClassTable::default();
        let queues = [
            queue("A", classed(&["BUS"])),
            queue("B", classed(&["BUS", "BUS"])),
        ];
        assert_eq!(pick_fp(&queues, &classes).unwrap().as_str(), "B");
    }

    #[test]
    fn edf_most_urgent_wins() {
        let queues = [
            queue("A", timed(&[Some(55.0)])),
            queue("B", timed(&[Some(200.0)])),
        ];
        assert_eq!(pick_edf(&queues, 50).unwrap().as_str(), "A");
    }

    #[test]
    fn edf_overdue_is_most_urgent() {
        let queues = [
            queue("A", timed(&[Some(52.0)])),
            queue("B", timed(&[Some(60.0), Some(40.0)])),
        ];
        assert_eq!(pick_edf(&queues, 50).unwrap().as_str(), "B");
    }

    #[test]
    fn edf_ignores_vehicles_without_deadline() {
        let with = [
            queue("A", timed(&[Some(90.0)])),
            queue("B", timed(&[Some(80.0)])),
        ];
        let padded = [
            queue("A", timed(&[Some(90.0), None, None, None])),
            queue("B", timed(&[None, Some(80.0)])),
        ];
        assert_eq!(pick_edf(&with, 0).unwrap(), pick_edf(&padded, 0).unwrap());
    }

    #[test]
    fn edf_without_deadlines_picks_longest() {
        let queues = [
            queue("A", timed(&[None])),
            queue("B", timed(&[None, None])),
            queue("C", timed(&[None, None])),
        ];
        assert_eq!(pick_edf(&queues, 0).unwrap().as_str(), "B");
    }

    #[test]
    fn all_empty_picks_first() {
        let classes = ClassTable::default();
        let queues = [queue("A", vec![]), queue("B", vec![]), queue("C", vec![])];
        assert_eq!(pick_fp(&queues, &classes).unwrap().as_str(), "A");
        assert_eq!(pick_edf(&queues, 0).unwrap().as_str(), "A");
    }

    #[test]
    fn empty_queue_set_is_rejected() {
        let classes = ClassTable::default();
        let queues: [Queue<usize>; 0] = [];
        assert!(matches!(
            pick_fp(&queues, &classes),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(pick_edf(&queues, 0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn longest_queue_handles_any_input() {
        assert_eq!(longest_queue::<usize>(&[]), None);
        let queues = [
            queue("A", classed(&["LV"])),
            queue("B", classed(&["LV", "LV"])),
            queue("C", classed(&["HV", "HV"])),
        ];
        assert_eq!(longest_queue(&queues).map(EdgeId::as_str), Some("B"));
    }

    #[test]
    fn discipline_names() {
        assert_eq!("EDF".parse::<Discipline>().unwrap(), Discipline::EarliestDeadlineFirst);
        assert_eq!("fixed".parse::<Discipline>().unwrap(), Discipline::FixedPriority);
        assert_eq!("fp".parse::<Discipline>().unwrap(), Discipline::FixedPriority);
        assert!(matches!(
            "round-robin".parse::<Discipline>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn random_picks_are_members_and_minimal() {
        let classes = ClassTable::default();
        let labels = ["HV", "MV", "LV", "BUS"];
        let mut rng = rand::rngs::StdRng::from_seed(*b"Right of way for the ambulance!!");
        for _ in 0..200 {
            let now = rng.gen_range(0..500);
            let queues = ["E0", "-E1", "-E2", "-E3"]
                .iter()
                .map(|edge| {
                    let len = rng.gen_range(0..6);
                    let vehicles = (0..len)
                        .map(|id| QueuedVehicle {
                            id,
                            class: Some(labels[rng.gen_range(0..labels.len())].into()),
                            deadline: rng
                                .gen_bool(0.7)
                                .then(|| rng.gen_range(0.0..600.0)),
                        })
                        .collect();
                    queue(edge, vehicles)
                })
                .collect::<Vec<_>>();

            let fp = pick_fp(&queues, &classes).unwrap();
            assert!(queues.iter().any(|q| q.edge == *fp));

            let edf = pick_edf(&queues, now).unwrap();
            let picked = queues.iter().find(|q| q.edge == *edf).unwrap();
            if let Some(best) = picked.min_remaining(now) {
                for other in &queues {
                    if let Some(remaining) = other.min_remaining(now) {
                        assert!(best <= remaining);
                    }
                }
            }
        }
    }
}
