//! Orientation for strokes that only recorded positions.
//!
//! The controller is imagined lying on the `y = 0` plane pointing along `+z`, carried along each
//! segment of the polyline and kept as upright as possible. The rotation is split into a pitch
//! about `x` and a heading about `y` instead of a single arc from `+z`, which would roll the
//! controller.

use glam::{Quat, Vec3};

const FORWARD: Vec3 = Vec3::Z;

/// The minimal rotation taking unit vector `from` onto unit vector `to`.
///
/// Degenerate inputs do not produce NaNs: a zero `to` gives the identity, and opposite vectors
/// give a half turn about an axis orthogonal to `from`.
pub fn rotation_between(from: Vec3, to: Vec3) -> Quat {
	const EPSILON: f32 = 1e-6;
	let r = from.dot(to) + 1.0;
	let q = if r < EPSILON {
		if from.x.abs() > from.z.abs() {
			Quat::from_xyzw(-from.y, from.x, 0.0, 0.0)
		} else {
			Quat::from_xyzw(0.0, -from.z, from.y, 0.0)
		}
	} else {
		let axis = from.cross(to);
		Quat::from_xyzw(axis.x, axis.y, axis.z, r)
	};
	let length = q.length();
	if length == 0.0 {
		Quat::IDENTITY
	} else {
		q / length
	}
}

/// Stateful reconstruction pass.
///
/// A purely vertical segment has no heading, so the heading of the last segment that had one is
/// kept. That memory lives as long as the reconstructor, so reusing one across the strokes of an
/// import carries headings from one stroke into the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationReconstructor {
	heading: Quat,
}

impl Default for OrientationReconstructor {
	fn default() -> Self {
		Self {
			heading: Quat::IDENTITY,
		}
	}
}

impl OrientationReconstructor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Orientation of a controller that just moved by `delta`.
	pub fn orient(&mut self, delta: Vec3) -> Quat {
		let pitch = rotation_between(
			FORWARD,
			Vec3::new(0.0, delta.y, delta.z).normalize_or_zero(),
		);
		if delta.x != 0.0 || delta.z != 0.0 {
			self.heading = rotation_between(
				FORWARD,
				Vec3::new(delta.x, 0.0, delta.z).normalize_or_zero(),
			);
		}
		self.heading * pitch
	}

	pub fn reconstruct(&mut self, positions: &[Vec3]) -> Vec<Quat> {
		self
			.reconstruct_lifted(positions, 0.0)
			.into_iter()
			.map(|(_, orientation)| orientation)
			.collect()
	}

	/// Reconstructs orientations for `positions` raised by `lift` along `y`, returning the raised
	/// positions with their orientations.
	///
	/// The first point looks ahead to the second one and negates the resulting delta. A lone
	/// point pretends the controller moved up by one unit.
	pub fn reconstruct_lifted(&mut self, positions: &[Vec3], lift: f32) -> Vec<(Vec3, Quat)> {
		let lift = Vec3::new(0.0, lift, 0.0);
		let mut last = match positions {
			[] => return Vec::new(),
			[only] => *only - Vec3::Y,
			[_, next, ..] => *next + lift,
		};
		positions
			.iter()
			.enumerate()
			.map(|(i, &position)| {
				let position = position + lift;
				let mut delta = position - last;
				if i == 0 {
					delta = -delta;
				}
				last = position;
				(position, self.orient(delta))
			})
			.collect()
	}
}

/// Orientations for one polyline with a fresh reconstructor.
pub fn reconstruct_orientations(positions: &[Vec3]) -> Vec<Quat> {
	OrientationReconstructor::new().reconstruct(positions)
}
