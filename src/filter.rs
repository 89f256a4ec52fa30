//! The generic capture gate applied to every sample before a brush sees it.

use glam::Vec3;

use crate::brush::BrushOptions;

/// Whether a sample at `incoming` may become the next point of a stroke, before the brush kind
/// gets its veto.
///
/// `previous` is the position of the last accepted point and `accepted` the number of points
/// accepted so far.
pub fn admits(
	options: &BrushOptions,
	previous: Option<Vec3>,
	accepted: usize,
	incoming: Vec3,
) -> bool {
	if previous.is_some_and(|previous| previous.distance(incoming) <= options.spacing) {
		return false;
	}
	if options.max_points != 0 && accepted >= options.max_points as usize {
		return false;
	}
	true
}
