use super::interval_set::IntervalSet;
use crate::squash_assert_moderate;
use crate::squash_assert_simple;

/// The domain of an integer variable: a normalized interval set together with
/// the store level of its last mutation (the stamp) and the states saved for
/// undo.
///
/// The first mutation at a level saves the pre-mutation value; later
/// mutations at the same level happen in place. The store records the
/// variable on the trail exactly when a save happens, so backtracking pops
/// one saved state per trail entry.
#[derive(Clone, Debug)]
pub struct IntDomain {
    values: IntervalSet,
    stamp: u32,
    saved: Vec<(u32, IntervalSet)>,
}

impl IntDomain {
    pub(crate) fn new(min: i32, max: i32) -> Self {
        squash_assert_simple!(min <= max, "integer domains are created non-empty");

        IntDomain {
            values: IntervalSet::bounded(min, max),
            stamp: 0,
            saved: Vec::new(),
        }
    }

    pub(crate) fn from_values(values: &[i32]) -> Self {
        let values = IntervalSet::from_values(values);
        squash_assert_simple!(!values.is_empty(), "integer domains are created non-empty");

        IntDomain {
            values,
            stamp: 0,
            saved: Vec::new(),
        }
    }

    pub fn min(&self) -> i32 {
        self.values.min().expect("integer domains are never empty")
    }

    pub fn max(&self) -> i32 {
        self.values.max().expect("integer domains are never empty")
    }

    pub fn size(&self) -> u64 {
        self.values.size()
    }

    pub fn contains(&self, value: i32) -> bool {
        self.values.contains(value)
    }

    pub fn is_singleton(&self) -> bool {
        self.values.is_singleton()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.values.iter()
    }

    pub fn values(&self) -> &IntervalSet {
        &self.values
    }

    /// The store level at which this domain was last narrowed.
    pub fn stamp(&self) -> u32 {
        self.stamp
    }

    /// Saves the current value before the first mutation at `level`. The
    /// caller records the variable on the trail iff this was called.
    pub(crate) fn save_at(&mut self, level: u32) {
        squash_assert_moderate!(self.stamp < level);
        self.saved.push((self.stamp, self.values.clone()));
        self.stamp = level;
    }

    /// Undoes the most recent [`IntDomain::save_at`], restoring the value and
    /// stamp recorded there.
    pub(crate) fn restore_saved(&mut self) {
        let (stamp, values) = self
            .saved
            .pop()
            .expect("a trail entry exists only if a state was saved");
        self.stamp = stamp;
        self.values = values;
    }

    pub(crate) fn values_mut(&mut self) -> &mut IntervalSet {
        &mut self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_restore_round_trips_bit_for_bit() {
        let mut domain = IntDomain::new(0, 9);

        domain.save_at(1);
        let _ = domain.values_mut().retain_from(3);
        let _ = domain.values_mut().remove(5);
        assert_eq!(1, domain.stamp());

        domain.restore_saved();
        assert_eq!(0, domain.stamp());
        assert_eq!(0, domain.min());
        assert_eq!(9, domain.max());
        assert!(domain.contains(5));
    }

    #[test]
    fn saves_stack_across_levels() {
        let mut domain = IntDomain::new(0, 9);

        domain.save_at(1);
        let _ = domain.values_mut().retain_from(2);
        domain.save_at(3);
        let _ = domain.values_mut().retain_until(4);

        domain.restore_saved();
        assert_eq!((2, 9), (domain.min(), domain.max()));
        assert_eq!(1, domain.stamp());

        domain.restore_saved();
        assert_eq!((0, 9), (domain.min(), domain.max()));
        assert_eq!(0, domain.stamp());
    }
}
