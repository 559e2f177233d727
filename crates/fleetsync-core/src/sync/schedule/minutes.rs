//! Backup-minute allocation.
//!
//! Backup triggers copied verbatim would fire on every destination at the
//! template's minute. Each destination instead gets its own minute, spread
//! evenly over the hour, never the template's.

use std::collections::BTreeSet;

use fleetsync_types::models::IntervalSchedule;

/// Backup minutes for one trigger, assigned in destination order.
///
/// Assignments are computed on the whole matched-minute set: a multi-minute
/// schedule moves as a unit, so a candidate is only taken when none of its
/// shifted minutes hits a template minute or a minute already handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinutePool {
    assigned: Vec<Option<u32>>,
}

impl MinutePool {
    pub fn new(template: &IntervalSchedule, destinations: usize) -> Self {
        let blocked = minute_set(template, template.primary_minute() % 60);
        let candidates: Vec<u32> =
            (0..60).filter(|m| minute_set(template, *m).is_disjoint(&blocked)).collect();

        let mut taken: BTreeSet<u32> = BTreeSet::new();
        let mut assigned = Vec::with_capacity(destinations);
        for index in 0..destinations {
            let len = candidates.len();
            let start = if destinations <= len { index * len / destinations } else { index };
            let pick = (0..len)
                .filter_map(|step| candidates.get((start + step) % len).copied())
                .find(|m| minute_set(template, *m).is_disjoint(&taken));
            if let Some(minute) = pick {
                taken.extend(minute_set(template, minute));
            }
            assigned.push(pick);
        }
        Self { assigned }
    }

    /// Primary minute for the destination at `index` (0-based, resolver order).
    ///
    /// `None` once no free minute set is left for this destination.
    pub fn minute_for(&self, index: usize) -> Option<u32> {
        self.assigned.get(index).copied().flatten()
    }

    /// Every assignment of this pool, in destination order.
    pub fn assignments(&self) -> Vec<Option<u32>> {
        self.assigned.clone()
    }
}

/// Minutes the schedule fires at once its primary minute becomes `minute`.
fn minute_set(schedule: &IntervalSchedule, minute: u32) -> BTreeSet<u32> {
    schedule.shifted_to_minute(minute).match_minutes.into_iter().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(minutes: &[u32]) -> IntervalSchedule {
        IntervalSchedule { match_minutes: minutes.to_vec(), ..Default::default() }
    }

    #[test]
    fn test_minutes_are_distinct_and_skip_template() {
        for template_minute in [0, 15, 30, 59] {
            for n in 1..=59 {
                let pool = MinutePool::new(&at(&[template_minute]), n);
                let minutes: Vec<u32> = pool.assignments().into_iter().map(Option::unwrap).collect();
                let unique: BTreeSet<u32> = minutes.iter().copied().collect();
                assert_eq!(unique.len(), n, "n={n} template={template_minute}");
                assert!(!unique.contains(&template_minute));
                assert!(minutes.iter().all(|m| *m < 60));
            }
        }
    }

    #[test]
    fn test_minutes_spread_evenly() {
        let pool = MinutePool::new(&at(&[0]), 4);
        assert_eq!(pool.assignments(), vec![Some(1), Some(15), Some(30), Some(45)]);
    }

    #[test]
    fn test_deterministic_across_runs() {
        assert_eq!(MinutePool::new(&at(&[30]), 7).assignments(), MinutePool::new(&at(&[30]), 7).assignments());
    }

    #[test]
    fn test_pool_exhaustion() {
        let pool = MinutePool::new(&at(&[10]), 61);
        let assigned = pool.assignments();
        assert_eq!(assigned.iter().filter(|m| m.is_some()).count(), 59);
        assert_eq!(assigned[59], None);
        assert_eq!(assigned[60], None);
        assert_eq!(pool.minute_for(61), None);
    }

    #[test]
    fn test_multi_minute_sets_never_overlap() {
        let template = at(&[0, 30]);
        for n in 1..=29 {
            let pool = MinutePool::new(&template, n);
            let mut seen: BTreeSet<u32> = [0, 30].into();
            for minute in pool.assignments() {
                let set = minute_set(&template, minute.unwrap());
                assert_eq!(set.len(), 2);
                assert!(set.is_disjoint(&seen), "n={n} set={set:?} seen={seen:?}");
                seen.extend(set);
            }
        }
    }

    #[test]
    fn test_half_hourly_template_two_destinations() {
        let pool = MinutePool::new(&at(&[0, 30]), 2);
        assert_eq!(pool.assignments(), vec![Some(1), Some(32)]);
    }

    #[test]
    fn test_multi_minute_pool_exhaustion() {
        let assigned = MinutePool::new(&at(&[0, 30]), 30).assignments();
        assert_eq!(assigned.iter().filter(|m| m.is_some()).count(), 29);
        assert_eq!(assigned[29], None);
    }

    #[test]
    fn test_empty_schedule_blocks_minute_zero() {
        let assigned = MinutePool::new(&at(&[]), 3).assignments();
        assert!(assigned.iter().all(|m| m.is_some_and(|m| m != 0)));
    }
}
