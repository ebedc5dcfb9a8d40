//! Per-dimension profiles of mandatory space, and the pruning rules derived
//! from them.
//!
//! For a rectangle `r` and a dimension `d`, the profile accumulates, along
//! `d`, how much of the other dimension is already claimed by the mandatory
//! parts of `r`'s neighbours inside `r`'s bounding box. A column of `d`
//! whose claimed thickness leaves less room than `r`'s minimal extent in the
//! other dimension cannot be covered by `r` at all; runs of such forbidden
//! columns tighten the earliest and latest feasible start of `r` and cap its
//! length once the start is fixed.

use crate::squash_assert_moderate;

/// The region a neighbour occupies under every remaining placement, as one
/// half-open span per dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MandatoryPart {
    pub(crate) start: [i32; 2],
    pub(crate) end: [i32; 2],
}

/// Sweeps dimension `dim` of the given bounding box and returns the maximal
/// half-open runs of columns that the boxed rectangle cannot cover: columns
/// where the mandatory thickness in the other dimension exceeds
/// `box_extent(other) - min_len_other`.
pub(crate) fn forbidden_columns(
    parts: &[MandatoryPart],
    dim: usize,
    box_start: [i32; 2],
    box_end: [i32; 2],
    min_len_other: i32,
) -> Vec<(i32, i32)> {
    let other = 1 - dim;
    let capacity = (box_end[other] as i64 - box_start[other] as i64) - min_len_other as i64;

    let mut events: Vec<(i32, i64)> = Vec::new();
    for part in parts {
        let start = part.start[dim].max(box_start[dim]);
        let end = part.end[dim].min(box_end[dim]);
        if start >= end {
            continue;
        }
        let thickness = (part.end[other].min(box_end[other]) as i64)
            - (part.start[other].max(box_start[other]) as i64);
        if thickness <= 0 {
            continue;
        }
        events.push((start, thickness));
        events.push((end, -thickness));
    }
    events.sort_unstable_by_key(|&(column, _)| column);

    let mut forbidden = Vec::new();
    let mut thickness = 0_i64;
    let mut run_start = None;
    let mut next = 0;
    while next < events.len() {
        let column = events[next].0;
        while next < events.len() && events[next].0 == column {
            thickness += events[next].1;
            next += 1;
        }
        match (run_start, thickness > capacity) {
            (None, true) => run_start = Some(column),
            (Some(start), false) => {
                forbidden.push((start, column));
                run_start = None;
            }
            _ => {}
        }
    }
    squash_assert_moderate!(run_start.is_none(), "profile thickness returns to zero");

    forbidden
}

/// Tightens the feasible start positions `[origin_min, origin_max]` of a
/// rectangle with minimal length `len_min` so that its minimal placement
/// avoids every forbidden run. Returns `None` when no feasible start is
/// left.
///
/// A run `[a, b)` rules out every start in `[a - len_min + 1, b - 1]`: any
/// such placement would cover a forbidden column.
pub(crate) fn prune_start(
    origin_min: i32,
    origin_max: i32,
    len_min: i32,
    forbidden: &[(i32, i32)],
) -> Option<(i32, i32)> {
    squash_assert_moderate!(len_min > 0);

    let mut new_min = origin_min as i64;
    for &(start, end) in forbidden {
        let first_infeasible = start as i64 - len_min as i64 + 1;
        if new_min >= first_infeasible && new_min < end as i64 {
            new_min = end as i64;
        }
    }

    let mut new_max = origin_max as i64;
    for &(start, end) in forbidden.iter().rev() {
        let first_infeasible = start as i64 - len_min as i64 + 1;
        if new_max >= first_infeasible && new_max < end as i64 {
            new_max = first_infeasible - 1;
        }
    }

    (new_min <= new_max).then(|| (new_min as i32, new_max as i32))
}

/// The largest length a rectangle starting at `start` can take before
/// running into a forbidden run, if any run lies at or beyond `start`.
pub(crate) fn length_limit(start: i32, forbidden: &[(i32, i32)]) -> Option<i64> {
    forbidden
        .iter()
        .find(|&&(run_start, _)| run_start >= start)
        .map(|&(run_start, _)| run_start as i64 - start as i64)
}
