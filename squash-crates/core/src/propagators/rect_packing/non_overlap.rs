use super::profile::forbidden_columns;
use super::profile::length_limit;
use super::profile::prune_start;
use super::profile::MandatoryPart;
use super::rectangle::intervals_overlap;
use super::Rectangle;
use crate::basic_types::DomainWipeout;
use crate::basic_types::PropagationStatus;
use crate::engine::StateHandle;
use crate::propagation::Domains;
use crate::propagation::EnqueueDecision;
use crate::propagation::LocalId;
use crate::propagation::PropagationContext;
use crate::propagation::Propagator;
use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorConstructorContext;
use crate::propagation::ReadDomains;
use crate::variables::IntEvent;
use crate::variables::PruningEvent;

/// The constructor for [`NonOverlap2d`]: no two rectangles may overlap,
/// except for the pairs on the `allowed_overlaps` list (0-based rectangle
/// indices). Rectangles with a possibly-zero length in some dimension are
/// exempt from all checks and may be placed anywhere.
#[derive(Clone, Debug)]
pub struct NonOverlap2dArgs {
    pub rectangles: Vec<Rectangle>,
    pub allowed_overlaps: Vec<(usize, usize)>,
    /// Enables the profile sweeps which tighten origin and length bounds.
    /// When disabled the propagator only performs the feasibility failure
    /// checks.
    pub use_profile: bool,
}

impl NonOverlap2dArgs {
    pub fn new(rectangles: Vec<Rectangle>) -> Self {
        NonOverlap2dArgs {
            rectangles,
            allowed_overlaps: Vec::new(),
            use_profile: true,
        }
    }

    pub fn with_allowed_overlaps(
        rectangles: Vec<Rectangle>,
        allowed_overlaps: Vec<(usize, usize)>,
    ) -> Self {
        NonOverlap2dArgs {
            rectangles,
            allowed_overlaps,
            use_profile: true,
        }
    }
}

impl PropagatorConstructor for NonOverlap2dArgs {
    type PropagatorImpl = NonOverlap2d;

    fn create(self, mut context: PropagatorConstructorContext<'_>) -> NonOverlap2d {
        let NonOverlap2dArgs {
            rectangles,
            allowed_overlaps,
            use_profile,
        } = self;

        for (index, rectangle) in rectangles.iter().enumerate() {
            for dim in 0..2 {
                context.register_int(
                    rectangle.origin[dim],
                    IntEvent::Bound,
                    local_id(index, dim, false),
                );
                context.register_int(
                    rectangle.length[dim],
                    IntEvent::Bound,
                    local_id(index, dim, true),
                );
            }
        }
        context.register_remove_level_listener();

        let may_overlap = |first: usize, second: usize| {
            !allowed_overlaps.contains(&(first, second))
                && !allowed_overlaps.contains(&(second, first))
        };
        let overlap_sets = (0..rectangles.len())
            .map(|index| {
                let neighbours = (0..rectangles.len())
                    .filter(|&other| other != index && may_overlap(index, other))
                    .map(|other| other as u32)
                    .collect::<Vec<_>>();
                context.new_state(neighbours)
            })
            .collect();

        let touched = vec![true; rectangles.len()];
        NonOverlap2d {
            rectangles: rectangles.into_boxed_slice(),
            overlap_sets,
            exception_list_present: !allowed_overlaps.is_empty(),
            use_profile,
            touched,
        }
    }
}

fn local_id(rectangle: usize, dim: usize, is_length: bool) -> LocalId {
    LocalId::from((rectangle * 4 + dim * 2 + usize::from(is_length)) as u32)
}

/// The rectangle non-overlap propagator.
///
/// Per rectangle, the set of neighbours whose placements can still intersect
/// it is maintained incrementally in the backtrackable registry; a
/// propagation pass only reconsiders rectangles whose variables (or whose
/// neighbours' variables) changed since the last pass. Each reconsidered
/// rectangle is checked for area and count feasibility against the
/// guaranteed space of its neighbourhood, then narrowed against the profile
/// of mandatory parts inside its bounding box.
#[derive(Debug)]
pub struct NonOverlap2d {
    rectangles: Box<[Rectangle]>,
    overlap_sets: Vec<StateHandle<Vec<u32>>>,
    exception_list_present: bool,
    use_profile: bool,
    /// Rectangles whose variables changed since the last propagation pass.
    /// Plain scratch state: cleared on backtracking, not trailed.
    touched: Vec<bool>,
}

struct Gathered {
    overlapping: Vec<u32>,
    mandatory: Vec<MandatoryPart>,
}

impl Propagator for NonOverlap2d {
    fn name(&self) -> &str {
        "NonOverlap2d"
    }

    fn queue_index(&self) -> u32 {
        2
    }

    fn propagate(&mut self, mut context: PropagationContext<'_>) -> PropagationStatus {
        let rectangle_count = self.rectangles.len();
        let mut touched = std::mem::replace(&mut self.touched, vec![false; rectangle_count]);

        loop {
            let mut touched_next = vec![false; rectangle_count];
            let mut narrowed_any = false;

            for index in 0..rectangle_count {
                let rectangle = self.rectangles[index];

                if (0..2).any(|dim| rectangle.length_min(&context, dim) <= 0) {
                    continue;
                }
                if rectangle.is_settled(&context) && rectangle.max_stamp(&context) < context.level()
                {
                    continue;
                }

                let neighbours = context.state(self.overlap_sets[index]).clone();
                let need_to_narrow = touched[index]
                    || neighbours
                        .iter()
                        .any(|&neighbour| touched[neighbour as usize]);
                if !need_to_narrow {
                    continue;
                }

                let gathered = self.gather(index, &context)?;
                if gathered.overlapping.len() != neighbours.len() {
                    context.update_state(self.overlap_sets[index], gathered.overlapping.clone());
                }

                if self.narrow(index, &gathered, &mut context)? {
                    narrowed_any = true;
                    touched_next[index] = true;
                }
            }

            if !narrowed_any {
                break;
            }
            touched = touched_next;
        }

        Ok(())
    }

    fn notify(
        &mut self,
        _context: Domains<'_>,
        local_id: LocalId,
        _event: PruningEvent,
    ) -> EnqueueDecision {
        self.touched[(local_id.unpack() / 4) as usize] = true;
        EnqueueDecision::Enqueue
    }

    fn satisfied(&self, context: Domains<'_>) -> bool {
        self.overlap_sets
            .iter()
            .enumerate()
            .all(|(index, overlap_set)| {
                let rectangle = &self.rectangles[index];
                context.state(*overlap_set).iter().all(|&neighbour| {
                    !rectangle.may_overlap(&self.rectangles[neighbour as usize], &context)
                })
            })
    }

    fn on_remove_level(&mut self, _level: u32) {
        // The change marks refer to domains that are about to be restored.
        self.touched.iter_mut().for_each(|mark| *mark = false);
    }
}

impl NonOverlap2d {
    /// One pass of neighbourhood analysis for rectangle `index`, translating
    /// the current domains into (a) the still-overlapping neighbour set, (b)
    /// the mandatory parts inside the neighbourhood, and (c) the feasibility
    /// failures: the guaranteed common area inside the rectangle's bounding
    /// box, the total guaranteed area against the available bounding area of
    /// the neighbourhood, and the count of minimal rectangles against the
    /// number of minimal-size slots.
    ///
    /// When an exclusion list is present all three failure checks are
    /// skipped, also for pairs not on the list. That loses pruning but never
    /// soundness, and matches the behaviour models have come to rely on.
    fn gather(&self, index: usize, context: &PropagationContext<'_>) -> Result<Gathered, DomainWipeout> {
        let rectangle = self.rectangles[index];

        let mut r_min = [0_i32; 2];
        let mut r_max = [0_i32; 2];
        let mut min_length = [0_i32; 2];
        for dim in 0..2 {
            r_min[dim] = rectangle.start_min(context, dim);
            r_max[dim] = rectangle.end_max(context, dim);
            min_length[dim] = rectangle.length_min(context, dim);
        }
        let r_box_area = (r_max[0] as i64 - r_min[0] as i64) * (r_max[1] as i64 - r_min[1] as i64);
        let r_min_area = rectangle.min_area(context);

        let mut gathered = Gathered {
            overlapping: Vec::new(),
            mandatory: Vec::new(),
        };
        let mut neighbourhood_start = [i32::MAX; 2];
        let mut neighbourhood_end = [i32::MIN; 2];
        let mut guaranteed_area = 0_i64;
        let mut common_area = 0_i64;
        let mut guaranteed_members = 0_i64;
        let mut check_area = false;

        for &neighbour_index in context.state(self.overlap_sets[index]) {
            let neighbour = self.rectangles[neighbour_index as usize];

            let mut s_start_min = [0_i32; 2];
            let mut s_end_guaranteed = [0_i32; 2];
            let mut s_length_min = [0_i32; 2];
            let mut part_start = [0_i32; 2];
            let mut part_end = [0_i32; 2];
            let mut overlap = true;
            let mut has_mandatory_part = true;
            let mut zero_min_length = false;

            for dim in 0..2 {
                let origin_min = context.int_min(neighbour.origin[dim]);
                let origin_max = context.int_max(neighbour.origin[dim]);
                let len_min = context.int_min(neighbour.length[dim]);
                let len_max = context.int_max(neighbour.length[dim]);

                if !intervals_overlap(r_min[dim], r_max[dim], origin_min, origin_max + len_max) {
                    overlap = false;
                    break;
                }

                s_start_min[dim] = origin_min;
                s_end_guaranteed[dim] = origin_max + len_min;
                s_length_min[dim] = len_min;

                let start = origin_max;
                let end = origin_min + len_min;
                if start < end {
                    part_start[dim] = start;
                    part_end[dim] = end;
                } else {
                    has_mandatory_part = false;
                }
                zero_min_length |= len_min <= 0;
            }
            if !overlap {
                continue;
            }

            gathered.overlapping.push(neighbour_index);
            if has_mandatory_part {
                gathered.mandatory.push(MandatoryPart {
                    start: part_start,
                    end: part_end,
                });
            }

            if !zero_min_length {
                check_area = true;
                guaranteed_members += 1;
                let mut neighbour_area = 1_i64;
                for dim in 0..2 {
                    neighbourhood_start[dim] = neighbourhood_start[dim].min(s_start_min[dim]);
                    neighbourhood_end[dim] = neighbourhood_end[dim].max(s_end_guaranteed[dim]);
                    min_length[dim] = min_length[dim].min(s_length_min[dim]);
                    neighbour_area *= s_length_min[dim] as i64;
                }
                guaranteed_area += neighbour_area;
            }

            // The guaranteed footprint of the neighbour clipped to this
            // rectangle's bounding box, per dimension.
            let mut clipped_area = 1_i64;
            for dim in 0..2 {
                let mut clipped = s_length_min[dim];
                let r_guaranteed_end =
                    context.int_max(rectangle.origin[dim]) + context.int_min(rectangle.length[dim]);
                if s_start_min[dim] <= r_min[dim] {
                    if s_end_guaranteed[dim] <= r_max[dim] {
                        clipped = (s_start_min[dim] + s_length_min[dim] - r_min[dim]).max(0);
                    } else {
                        let mut inside_from_left =
                            s_start_min[dim] + s_length_min[dim] - r_min[dim];
                        let mut inside_from_right =
                            s_length_min[dim] - (s_end_guaranteed[dim] - r_guaranteed_end);
                        inside_from_left = inside_from_left.min(r_guaranteed_end - r_min[dim]);
                        inside_from_right = inside_from_right.min(r_guaranteed_end - r_min[dim]);
                        if inside_from_left < inside_from_right {
                            clipped = inside_from_left.max(0);
                        } else if inside_from_right > 0 {
                            clipped = clipped.min(inside_from_right);
                        } else {
                            clipped = 0;
                        }
                    }
                } else if s_end_guaranteed[dim] > r_max[dim] {
                    let inside = s_length_min[dim] - (s_end_guaranteed[dim] - r_guaranteed_end);
                    if inside > 0 {
                        clipped = clipped.min(inside);
                    } else {
                        clipped = 0;
                    }
                }
                clipped_area *= clipped as i64;
            }
            common_area += clipped_area;

            if !self.exception_list_present && common_area + r_min_area > r_box_area {
                return Err(DomainWipeout);
            }
        }

        if check_area && !self.exception_list_present {
            let total_area = guaranteed_area + r_min_area;
            for dim in 0..2 {
                neighbourhood_start[dim] = neighbourhood_start[dim].min(r_min[dim]);
                let r_guaranteed_end =
                    context.int_max(rectangle.origin[dim]) + context.int_min(rectangle.length[dim]);
                neighbourhood_end[dim] = neighbourhood_end[dim].max(r_guaranteed_end);
            }

            let mut available_area = 1_i64;
            let mut minimal_slots = 1_i64;
            let mut check_slot_count = true;
            for dim in 0..2 {
                let extent = neighbourhood_end[dim] as i64 - neighbourhood_start[dim] as i64;
                available_area *= extent;
                if min_length[dim] != 0 {
                    minimal_slots *= extent / min_length[dim] as i64;
                } else {
                    check_slot_count = false;
                }
            }

            if available_area < total_area {
                return Err(DomainWipeout);
            }
            if check_slot_count && minimal_slots < guaranteed_members + 1 {
                return Err(DomainWipeout);
            }
        }

        Ok(gathered)
    }

    /// Tightens the origin and length bounds of rectangle `index` against
    /// the profile of mandatory parts, one dimension at a time.
    fn narrow(
        &self,
        index: usize,
        gathered: &Gathered,
        context: &mut PropagationContext<'_>,
    ) -> Result<bool, DomainWipeout> {
        if !self.use_profile || gathered.mandatory.is_empty() {
            return Ok(false);
        }

        let rectangle = self.rectangles[index];
        let mut changed = false;

        for dim in 0..2 {
            let len_min = rectangle.length_min(context, dim);
            if len_min <= 0 {
                continue;
            }

            let box_start = [
                rectangle.start_min(context, 0),
                rectangle.start_min(context, 1),
            ];
            let box_end = [rectangle.end_max(context, 0), rectangle.end_max(context, 1)];
            let min_len_other = rectangle.length_min(context, 1 - dim);

            let forbidden =
                forbidden_columns(&gathered.mandatory, dim, box_start, box_end, min_len_other);
            if forbidden.is_empty() {
                continue;
            }

            let origin_min = context.int_min(rectangle.origin[dim]);
            let origin_max = context.int_max(rectangle.origin[dim]);
            let Some((new_min, new_max)) = prune_start(origin_min, origin_max, len_min, &forbidden)
            else {
                return Err(DomainWipeout);
            };
            changed |= context.in_min(rectangle.origin[dim], new_min)?;
            changed |= context.in_max(rectangle.origin[dim], new_max)?;

            if new_min == new_max {
                if let Some(limit) = length_limit(new_min, &forbidden) {
                    if limit < rectangle.length_max(context, dim) as i64 {
                        changed |= context.in_max(rectangle.length[dim], limit as i32)?;
                    }
                }
            }
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_solver::TestSolver;

    fn rect(
        solver: &mut TestSolver,
        x: (i32, i32),
        y: (i32, i32),
        width: (i32, i32),
        height: (i32, i32),
    ) -> Rectangle {
        Rectangle::new(
            [
                solver.new_variable(x.0, x.1),
                solver.new_variable(y.0, y.1),
            ],
            [
                solver.new_variable(width.0, width.1),
                solver.new_variable(height.0, height.1),
            ],
        )
    }

    #[test]
    fn three_unit_squares_in_a_two_by_one_box_are_infeasible() {
        let mut solver = TestSolver::default();
        let rectangles = (0..3)
            .map(|_| rect(&mut solver, (0, 1), (0, 0), (1, 1), (1, 1)))
            .collect::<Vec<_>>();

        let propagator = solver
            .new_propagator(NonOverlap2dArgs::new(rectangles))
            .expect("valid model");

        assert!(!solver.propagate());
        assert_eq!(Some(propagator), solver.store.recently_failed());
    }

    #[test]
    fn a_fixed_block_pushes_a_unit_square_in_the_constrained_dimension() {
        let mut solver = TestSolver::default();
        let block = rect(&mut solver, (0, 0), (0, 0), (2, 2), (2, 2));
        let square = rect(&mut solver, (0, 10), (0, 1), (1, 1), (1, 1));

        let _ = solver
            .new_propagator(NonOverlap2dArgs::new(vec![block, square]))
            .expect("valid model");

        assert!(solver.propagate());
        // The square cannot avoid the block in y, so its x must clear it.
        solver.assert_bounds(square.origin[0], 2, 10);
        solver.assert_bounds(square.origin[1], 0, 1);
    }

    #[test]
    fn unforced_overlap_keeps_multi_dimensional_freedom() {
        let mut solver = TestSolver::default();
        let block = rect(&mut solver, (0, 0), (0, 0), (2, 2), (2, 2));
        let square = rect(&mut solver, (0, 10), (0, 10), (1, 1), (1, 1));

        let _ = solver
            .new_propagator(NonOverlap2dArgs::new(vec![block, square]))
            .expect("valid model");

        // The square can dodge the block in either dimension, so neither
        // dimension alone may be tightened.
        assert!(solver.propagate());
        solver.assert_bounds(square.origin[0], 0, 10);
        solver.assert_bounds(square.origin[1], 0, 10);
    }

    #[test]
    fn an_allowed_pair_may_coincide_while_others_still_exclude() {
        let mut solver = TestSolver::default();
        let first = rect(&mut solver, (0, 0), (0, 0), (2, 2), (2, 2));
        let second = rect(&mut solver, (0, 0), (0, 0), (2, 2), (2, 2));

        let _ = solver
            .new_propagator(NonOverlap2dArgs::with_allowed_overlaps(
                vec![first, second],
                vec![(0, 1)],
            ))
            .expect("valid model");

        assert!(solver.propagate());
    }

    #[test]
    fn non_excluded_pairs_are_still_enforced_under_an_exclusion_list() {
        let mut solver = TestSolver::default();
        let first = rect(&mut solver, (0, 0), (0, 0), (2, 2), (2, 2));
        let second = rect(&mut solver, (0, 0), (0, 0), (2, 2), (2, 2));
        let third = rect(&mut solver, (0, 0), (0, 0), (1, 1), (1, 1));

        let _ = solver
            .new_propagator(NonOverlap2dArgs::with_allowed_overlaps(
                vec![first, second, third],
                vec![(0, 1)],
            ))
            .expect("valid model");

        // The third square has nowhere to go: it is forced inside both
        // coinciding blocks and is excluded from neither.
        assert!(!solver.propagate());
    }

    #[test]
    fn zero_length_rectangles_are_placeable_anywhere() {
        let mut solver = TestSolver::default();
        let block = rect(&mut solver, (0, 0), (0, 0), (2, 2), (2, 2));
        let point = rect(&mut solver, (0, 0), (0, 0), (0, 0), (0, 0));

        let _ = solver
            .new_propagator(NonOverlap2dArgs::new(vec![block, point]))
            .expect("valid model");

        assert!(solver.propagate());
    }

    #[test]
    fn a_fixed_start_caps_the_length_before_the_next_obstacle() {
        let mut solver = TestSolver::default();
        let obstacle = rect(&mut solver, (4, 4), (0, 0), (2, 2), (1, 1));
        let stretchy = rect(&mut solver, (1, 1), (0, 0), (1, 5), (1, 1));

        let _ = solver
            .new_propagator(NonOverlap2dArgs::new(vec![obstacle, stretchy]))
            .expect("valid model");

        assert!(solver.propagate());
        solver.assert_bounds(stretchy.length[0], 1, 3);
    }

    #[test]
    fn backtracking_restores_pruning_and_overlap_sets() {
        let mut solver = TestSolver::default();
        let block = rect(&mut solver, (0, 0), (0, 0), (2, 2), (2, 2));
        let square = rect(&mut solver, (0, 10), (0, 1), (1, 1), (1, 1));

        let _ = solver
            .new_propagator(NonOverlap2dArgs::new(vec![block, square]))
            .expect("valid model");
        assert!(solver.propagate());
        solver.assert_bounds(square.origin[0], 2, 10);

        // Move the square away so its overlap set empties, then backtrack.
        solver.store.set_level(1);
        let _ = solver
            .store
            .in_min(square.origin[0], 9)
            .expect("in bounds");
        assert!(solver.propagate());

        solver.store.remove_level(1);
        solver.assert_bounds(square.origin[0], 2, 10);
        solver.assert_bounds(square.origin[1], 0, 1);

        // The restored state must still propagate: blocking the right side
        // forces the square onto the single free column.
        solver.store.set_level(1);
        let _ = solver
            .store
            .in_max(square.origin[0], 2)
            .expect("in bounds");
        assert!(solver.propagate());
        solver.assert_bounds(square.origin[0], 2, 2);
    }
}
