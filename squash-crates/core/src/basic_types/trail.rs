use std::iter::Rev;
use std::ops::Deref;
use std::vec::Drain;

use crate::squash_assert_simple;

/// An append-only log delimited by store levels. Entries pushed while level
/// `n` is open belong to level `n`; [`Trail::rewind_to`] drains every entry
/// above a target level in reverse creation order, which is the order undo
/// operations must be replayed in.
#[derive(Clone, Debug)]
pub(crate) struct Trail<T> {
    current_level: u32,
    /// At index `i` is the position where level `i + 1` starts on the trail.
    level_delimiter: Vec<usize>,
    trail: Vec<T>,
}

// We explicitly implement Default to avoid imposing `T: Default`.
impl<T> Default for Trail<T> {
    fn default() -> Self {
        Trail {
            current_level: 0,
            level_delimiter: Vec::default(),
            trail: Vec::default(),
        }
    }
}

impl<T> Trail<T> {
    pub(crate) fn new_level(&mut self) {
        self.current_level += 1;
        self.level_delimiter.push(self.trail.len());
    }

    pub(crate) fn level(&self) -> u32 {
        self.current_level
    }

    pub(crate) fn push(&mut self, elem: T) {
        self.trail.push(elem)
    }

    /// Drop back to `new_level`, draining all entries recorded at the levels
    /// above it in reverse creation order.
    pub(crate) fn rewind_to(&mut self, new_level: u32) -> Rev<Drain<'_, T>> {
        squash_assert_simple!(new_level < self.current_level);

        let new_trail_len = self.level_delimiter[new_level as usize];

        self.current_level = new_level;
        self.level_delimiter.truncate(new_level as usize);
        self.trail.drain(new_trail_len..).rev()
    }
}

impl<T> Deref for Trail<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushed_values_are_observed_through_indexing() {
        let mut trail = Trail::default();

        let expected = [1, 2, 3, 4];
        for &elem in expected.iter() {
            trail.push(elem);
        }

        assert_eq!(&expected, trail.deref());
    }

    #[test]
    fn rewinding_removes_elements_beyond_the_level() {
        let mut trail = Trail::default();

        trail.new_level();
        trail.push(1);
        let _ = trail.rewind_to(0);

        assert!(trail.is_empty());
        assert_eq!(0, trail.level());
    }

    #[test]
    fn rewinding_skips_multiple_levels_at_once() {
        let mut trail = Trail::default();
        trail.push(1);

        trail.new_level();
        trail.push(2);
        trail.new_level();
        trail.push(3);
        trail.new_level();
        trail.push(4);

        let _ = trail.rewind_to(1);

        assert_eq!(&[1, 2], trail.deref());
    }

    #[test]
    fn drained_elements_are_given_in_reverse_creation_order() {
        let mut trail = Trail::default();
        trail.push(1);

        trail.new_level();
        trail.push(2);
        trail.new_level();
        trail.push(3);
        trail.new_level();
        trail.push(4);

        let popped = trail.rewind_to(0).collect::<Vec<_>>();
        assert_eq!(vec![4, 3, 2], popped);
    }
}
