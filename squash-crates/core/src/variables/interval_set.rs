use itertools::Itertools;

/// An inclusive interval of integers.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Interval {
    pub min: i32,
    pub max: i32,
}

impl Interval {
    pub(crate) fn width(&self) -> u64 {
        (self.max as i64 - self.min as i64 + 1) as u64
    }
}

/// A normalized set of integers represented as ordered, disjoint,
/// non-adjacent inclusive intervals. This is the value representation behind
/// both integer domains and the glb/lub brackets of set domains.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    /// The empty set.
    pub fn empty() -> Self {
        IntervalSet::default()
    }

    /// The set `{min, ..., max}`; empty when `min > max`.
    pub fn bounded(min: i32, max: i32) -> Self {
        if min > max {
            IntervalSet::empty()
        } else {
            IntervalSet {
                intervals: vec![Interval { min, max }],
            }
        }
    }

    /// Builds a set from arbitrary values, sorting and coalescing runs of
    /// consecutive integers into intervals.
    pub fn from_values(values: &[i32]) -> Self {
        let intervals = values
            .iter()
            .copied()
            .sorted_unstable()
            .dedup()
            .map(|value| Interval {
                min: value,
                max: value,
            })
            .coalesce(|a, b| {
                if b.min as i64 <= a.max as i64 + 1 {
                    Ok(Interval {
                        min: a.min,
                        max: b.max,
                    })
                } else {
                    Err((a, b))
                }
            })
            .collect();

        IntervalSet { intervals }
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn min(&self) -> Option<i32> {
        self.intervals.first().map(|interval| interval.min)
    }

    pub fn max(&self) -> Option<i32> {
        self.intervals.last().map(|interval| interval.max)
    }

    /// The number of values in the set.
    pub fn size(&self) -> u64 {
        self.intervals.iter().map(Interval::width).sum()
    }

    pub fn is_singleton(&self) -> bool {
        self.intervals.len() == 1 && self.intervals[0].min == self.intervals[0].max
    }

    pub fn contains(&self, value: i32) -> bool {
        let position = self
            .intervals
            .partition_point(|interval| interval.max < value);
        self.intervals
            .get(position)
            .is_some_and(|interval| interval.min <= value)
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.intervals
            .iter()
            .flat_map(|interval| interval.min..=interval.max)
    }

    /// Removes a single value. Returns whether the set changed.
    pub fn remove(&mut self, value: i32) -> bool {
        let position = self
            .intervals
            .partition_point(|interval| interval.max < value);
        let Some(interval) = self.intervals.get(position).copied() else {
            return false;
        };
        if interval.min > value {
            return false;
        }

        if interval.min == interval.max {
            let _ = self.intervals.remove(position);
        } else if value == interval.min {
            self.intervals[position].min = value + 1;
        } else if value == interval.max {
            self.intervals[position].max = value - 1;
        } else {
            self.intervals[position].max = value - 1;
            self.intervals.insert(
                position + 1,
                Interval {
                    min: value + 1,
                    max: interval.max,
                },
            );
        }
        true
    }

    /// Removes every value below `bound`. Returns whether the set changed.
    pub fn retain_from(&mut self, bound: i32) -> bool {
        let first_kept = self
            .intervals
            .partition_point(|interval| interval.max < bound);
        let mut changed = first_kept > 0;
        self.intervals.drain(..first_kept);
        if let Some(interval) = self.intervals.first_mut() {
            if interval.min < bound {
                interval.min = bound;
                changed = true;
            }
        }
        changed
    }

    /// Removes every value above `bound`. Returns whether the set changed.
    pub fn retain_until(&mut self, bound: i32) -> bool {
        let first_dropped = self
            .intervals
            .partition_point(|interval| interval.min <= bound);
        let mut changed = first_dropped < self.intervals.len();
        self.intervals.truncate(first_dropped);
        if let Some(interval) = self.intervals.last_mut() {
            if interval.max > bound {
                interval.max = bound;
                changed = true;
            }
        }
        changed
    }

    /// Grows the set to the union with `other`. Returns whether it changed.
    pub fn union_with(&mut self, other: &IntervalSet) -> bool {
        if other.is_empty() {
            return false;
        }

        let merged: Vec<Interval> = self
            .intervals
            .iter()
            .merge_by(other.intervals.iter(), |a, b| a.min <= b.min)
            .copied()
            .coalesce(|a, b| {
                if b.min as i64 <= a.max as i64 + 1 {
                    Ok(Interval {
                        min: a.min,
                        max: a.max.max(b.max),
                    })
                } else {
                    Err((a, b))
                }
            })
            .collect();

        if merged == self.intervals {
            false
        } else {
            self.intervals = merged;
            true
        }
    }

    /// Shrinks the set to the intersection with `other`. Returns whether it
    /// changed.
    pub fn intersect_with(&mut self, other: &IntervalSet) -> bool {
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.intervals.len() && j < other.intervals.len() {
            let a = self.intervals[i];
            let b = other.intervals[j];
            let min = a.min.max(b.min);
            let max = a.max.min(b.max);
            if min <= max {
                result.push(Interval { min, max });
            }
            if a.max < b.max {
                i += 1;
            } else {
                j += 1;
            }
        }

        if result == self.intervals {
            false
        } else {
            self.intervals = result;
            true
        }
    }

    pub fn is_subset_of(&self, other: &IntervalSet) -> bool {
        let mut j = 0;
        'intervals: for a in &self.intervals {
            while j < other.intervals.len() {
                let b = other.intervals[j];
                if b.max < a.min {
                    j += 1;
                    continue;
                }
                if b.min <= a.min && a.max <= b.max {
                    continue 'intervals;
                }
                return false;
            }
            return false;
        }
        true
    }
}

impl std::fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (position, interval) in self.intervals.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            if interval.min == interval.max {
                write!(f, "{}", interval.min)?;
            } else {
                write!(f, "{}..{}", interval.min, interval.max)?;
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_values_coalesces_consecutive_runs() {
        let set = IntervalSet::from_values(&[4, 1, 2, 2, 7]);
        assert_eq!(
            &[
                Interval { min: 1, max: 2 },
                Interval { min: 4, max: 4 },
                Interval { min: 7, max: 7 }
            ],
            set.intervals()
        );
        assert_eq!(4, set.size());
    }

    #[test]
    fn removing_an_inner_value_splits_the_interval() {
        let mut set = IntervalSet::bounded(1, 5);
        assert!(set.remove(3));
        assert!(!set.remove(3));
        assert!(set.contains(2));
        assert!(!set.contains(3));
        assert!(set.contains(4));
        assert_eq!(4, set.size());
    }

    #[test]
    fn removing_a_bound_narrows_the_interval() {
        let mut set = IntervalSet::bounded(1, 5);
        assert!(set.remove(1));
        assert!(set.remove(5));
        assert_eq!(Some(2), set.min());
        assert_eq!(Some(4), set.max());
    }

    #[test]
    fn retain_from_drops_intervals_and_trims() {
        let mut set = IntervalSet::from_values(&[1, 2, 5, 6, 9]);
        assert!(set.retain_from(6));
        assert_eq!(
            &[Interval { min: 6, max: 6 }, Interval { min: 9, max: 9 }],
            set.intervals()
        );
        assert!(!set.retain_from(5));
    }

    #[test]
    fn retain_until_drops_intervals_and_trims() {
        let mut set = IntervalSet::from_values(&[1, 2, 5, 6, 9]);
        assert!(set.retain_until(5));
        assert_eq!(
            &[Interval { min: 1, max: 2 }, Interval { min: 5, max: 5 }],
            set.intervals()
        );
    }

    #[test]
    fn union_bridges_adjacent_intervals() {
        let mut set = IntervalSet::from_values(&[1, 2, 6]);
        let other = IntervalSet::from_values(&[3, 4]);
        assert!(set.union_with(&other));
        assert_eq!(
            &[Interval { min: 1, max: 4 }, Interval { min: 6, max: 6 }],
            set.intervals()
        );
        assert!(!set.union_with(&other));
    }

    #[test]
    fn intersection_keeps_the_common_values() {
        let mut set = IntervalSet::bounded(1, 10);
        let other = IntervalSet::from_values(&[0, 1, 4, 5, 12]);
        assert!(set.intersect_with(&other));
        assert_eq!(
            &[Interval { min: 1, max: 1 }, Interval { min: 4, max: 5 }],
            set.intervals()
        );
    }

    #[test]
    fn subset_checks_span_interval_borders() {
        let small = IntervalSet::from_values(&[1, 4, 5]);
        let large = IntervalSet::from_values(&[1, 2, 3, 4, 5]);
        assert!(small.is_subset_of(&large));
        assert!(!large.is_subset_of(&small));
        assert!(IntervalSet::empty().is_subset_of(&small));
    }
}
