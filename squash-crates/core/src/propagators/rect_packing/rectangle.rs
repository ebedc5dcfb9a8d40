use crate::propagation::ReadDomains;
use crate::variables::IntVarId;

/// A rectangle described by an origin variable and a length variable per
/// dimension. All derived bounds are recomputed from the variable domains on
/// demand; nothing here is cached across a level boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rectangle {
    pub origin: [IntVarId; 2],
    pub length: [IntVarId; 2],
}

impl Rectangle {
    pub fn new(origin: [IntVarId; 2], length: [IntVarId; 2]) -> Self {
        Rectangle { origin, length }
    }

    /// The earliest possible start in `dim`.
    pub(crate) fn start_min(&self, domains: &impl ReadDomains, dim: usize) -> i32 {
        domains.int_min(self.origin[dim])
    }

    /// One past the latest cell the rectangle can reach in `dim`.
    pub(crate) fn end_max(&self, domains: &impl ReadDomains, dim: usize) -> i32 {
        domains.int_max(self.origin[dim]) + domains.int_max(self.length[dim])
    }

    pub(crate) fn length_min(&self, domains: &impl ReadDomains, dim: usize) -> i32 {
        domains.int_min(self.length[dim])
    }

    pub(crate) fn length_max(&self, domains: &impl ReadDomains, dim: usize) -> i32 {
        domains.int_max(self.length[dim])
    }

    /// The mandatory part in `dim`: the half-open span the rectangle covers
    /// under every remaining placement, when one exists.
    pub(crate) fn mandatory_part(&self, domains: &impl ReadDomains, dim: usize) -> Option<(i32, i32)> {
        let start = domains.int_max(self.origin[dim]);
        let end = domains.int_min(self.origin[dim]) + domains.int_min(self.length[dim]);
        (start < end).then_some((start, end))
    }

    /// The smallest area the rectangle can occupy.
    pub(crate) fn min_area(&self, domains: &impl ReadDomains) -> i64 {
        (0..2)
            .map(|dim| self.length_min(domains, dim).max(0) as i64)
            .product()
    }

    pub(crate) fn is_settled(&self, domains: &impl ReadDomains) -> bool {
        (0..2).all(|dim| {
            domains.int_is_singleton(self.origin[dim]) && domains.int_is_singleton(self.length[dim])
        })
    }

    /// The most recent level any of the four variables was narrowed at.
    pub(crate) fn max_stamp(&self, domains: &impl ReadDomains) -> u32 {
        (0..2)
            .flat_map(|dim| {
                [
                    domains.int_stamp(self.origin[dim]),
                    domains.int_stamp(self.length[dim]),
                ]
            })
            .max()
            .unwrap_or(0)
    }

    /// Whether some remaining placement of `self` intersects some remaining
    /// placement of `other`.
    pub(crate) fn may_overlap(&self, other: &Rectangle, domains: &impl ReadDomains) -> bool {
        if (0..2).any(|dim| self.length_max(domains, dim) <= 0)
            || (0..2).any(|dim| other.length_max(domains, dim) <= 0)
        {
            return false;
        }
        (0..2).all(|dim| {
            intervals_overlap(
                self.start_min(domains, dim),
                self.end_max(domains, dim),
                other.start_min(domains, dim),
                other.end_max(domains, dim),
            )
        })
    }
}

/// Overlap of two half-open intervals.
pub(crate) fn intervals_overlap(min1: i32, max1: i32, min2: i32, max2: i32) -> bool {
    min1 < max2 && min2 < max1
}
