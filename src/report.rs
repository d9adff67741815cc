use crate::class::VehicleClass;
use crate::tracker::ClassCounters;
use serde::Serialize;
use std::fmt;

/// The deadline performance of one vehicle class.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassSummary {
    pub class: VehicleClass,
    pub spawned: u64,
    pub missed: u64,
    /// `100 * missed / spawned`, or 0 when nothing was spawned.
    pub miss_percentage: f64,
}

/// The same totals as a [ClassSummary], across all classes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Totals {
    pub spawned: u64,
    pub missed: u64,
    pub miss_percentage: f64,
}

/// The end-of-run summary of deadline misses.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub classes: Vec<ClassSummary>,
    pub overall: Totals,
}

/// Summarises the class counters into a report.
pub fn summarize(counters: &ClassCounters) -> Report {
    let classes: Vec<_> = counters
        .iter()
        .map(|count| ClassSummary {
            class: count.class.clone(),
            spawned: count.spawned,
            missed: count.missed,
            miss_percentage: miss_percentage(count.missed, count.spawned),
        })
        .collect();

    let spawned = classes.iter().map(|c| c.spawned).sum();
    let missed = classes.iter().map(|c| c.missed).sum();
    Report {
        classes,
        overall: Totals {
            spawned,
            missed,
            miss_percentage: miss_percentage(missed, spawned),
        },
    }
}

fn miss_percentage(missed: u64, spawned: u64) -> f64 {
    if spawned == 0 {
        0.0
    } else {
        100.0 * missed as f64 / spawned as f64
    }
}

impl Report {
    /// Gets the summary of one class.
    pub fn class(&self, class: &VehicleClass) -> Option<&ClassSummary> {
        self.classes.iter().find(|summary| summary.class == *class)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== FINAL REPORT: Deadline Misses by Priority ===")?;
        for c in &self.classes {
            writeln!(
                f,
                "  {}: spawned = {}, missed = {}, {:.2}% missed",
                c.class, c.spawned, c.missed, c.miss_percentage
            )?;
        }
        writeln!(
            f,
            "  Overall: spawned = {}, missed = {}, {:.2}% missed",
            self.overall.spawned, self.overall.missed, self.overall.miss_percentage
        )?;
        write!(f, "=====================================================")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::class::ClassTable;
    use crate::queue::QueuedVehicle;
    use crate::tracker::DeadlineTracker;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn empty_run_reports_zero() {
        let tracker = DeadlineTracker::<u32>::new(&ClassTable::default());
        let report = summarize(tracker.counters());
        assert_eq!(report.classes.len(), 3);
        for class in &report.classes {
            assert_eq!(class.miss_percentage, 0.0);
        }
        assert_eq!(report.overall.spawned, 0);
        assert_eq!(report.overall.miss_percentage, 0.0);
    }

    #[test]
    fn percentages_per_class_and_overall() {
        let mut tracker = DeadlineTracker::new(&ClassTable::default());
        for _ in 0..4 {
            tracker.record_admission(&"HV".into());
        }
        for _ in 0..2 {
            tracker.record_admission(&"LV".into());
        }
        let overdue = [(1, "HV"), (2, "LV"), (3, "LV")].map(|(id, class)| QueuedVehicle {
            id,
            class: Some(class.into()),
            deadline: Some(0.0),
        });
        tracker.check_and_record_misses(1, overdue);

        let report = summarize(tracker.counters());
        assert_approx_eq!(report.class(&"HV".into()).unwrap().miss_percentage, 25.0);
        assert_approx_eq!(report.class(&"MV".into()).unwrap().miss_percentage, 0.0);
        assert_approx_eq!(report.class(&"LV".into()).unwrap().miss_percentage, 100.0);
        assert_eq!(report.overall.spawned, 6);
        assert_eq!(report.overall.missed, 3);
        assert_approx_eq!(report.overall.miss_percentage, 50.0);
    }

    #[test]
    fn display_lists_every_class() {
        let mut tracker = DeadlineTracker::<u32>::new(&ClassTable::default());
        tracker.record_admission(&"MV".into());
        let text = summarize(tracker.counters()).to_string();
        assert!(text.contains("  HV: spawned = 0, missed = 0, 0.00% missed"), "got: {text}");
        assert!(text.contains("  MV: spawned = 1, missed = 0, 0.00% missed"), "got: {text}");
        assert!(text.contains("  Overall: spawned = 1, missed = 0, 0.00% missed"), "got: {text}");
    }

    #[test]
    fn display_closes_with_full_rule() {
        let tracker = DeadlineTracker::<u32>::new(&ClassTable::default());
        let text = summarize(tracker.counters()).to_string();
        let last = text.lines().last().unwrap();
        assert_eq!(last.len(), 53);
        assert!(last.chars().all(|c| c == '='), "got: {last}");
    }
}
