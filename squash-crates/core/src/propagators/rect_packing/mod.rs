//! Non-overlap of axis-aligned rectangles whose origins and lengths are
//! integer variables.
//!
//! The propagator keeps, per rectangle, the set of other rectangles whose
//! possible placements still intersect its own (the overlap set) as
//! backtrackable state, and reasons over the *mandatory* space of those
//! neighbours: the region a rectangle occupies under every remaining
//! placement. Mandatory space drives both the feasibility failures (the
//! guaranteed area of a neighbourhood cannot exceed the area available to
//! it) and the per-dimension profile sweeps that tighten origin and length
//! bounds.

mod non_overlap;
mod profile;
mod rectangle;

pub use non_overlap::NonOverlap2d;
pub use non_overlap::NonOverlap2dArgs;
pub use rectangle::Rectangle;
