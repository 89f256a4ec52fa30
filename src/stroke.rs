use glam::{Quat, Vec3};

use crate::brush::{Brush, BrushId, BrushKind, BrushOptions, Sample};
use crate::codec::STROKE_HEADER_SIZE;
use crate::filter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
	pub position: Vec3,
	pub orientation: Quat,
	pub pressure: f32,
	pub timestamp: u32,
}

impl From<&Sample> for Point {
	fn from(sample: &Sample) -> Self {
		Self {
			position: sample.position,
			orientation: sample.orientation,
			pressure: sample.pressure,
			timestamp: sample.timestamp,
		}
	}
}

/// Where the stylus tip sits for a controller at `position` with `orientation`.
pub fn pointer_position(position: Vec3, orientation: Quat) -> Vec3 {
	const OFFSET: Vec3 = Vec3::new(0.0, 0.7, 1.0);
	position + (orientation * OFFSET).normalize_or_zero() * -0.03
}

/// One continuous gesture drawn with a single brush kind.
pub struct Stroke {
	brush: BrushId,
	behavior: Box<dyn Brush>,
	options: BrushOptions,
	color: Vec3,
	size: f32,
	points: Vec<Point>,
	previous_position: Option<Vec3>,
	accepted: usize,
}

impl std::fmt::Debug for Stroke {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Stroke")
			.field("brush", &self.brush)
			.field("color", &self.color)
			.field("size", &self.size)
			.field("points", &self.points.len())
			.finish_non_exhaustive()
	}
}

impl Stroke {
	pub(crate) fn new(brush: BrushId, kind: &BrushKind, color: Vec3, size: f32) -> Self {
		let mut behavior = kind.instantiate();
		behavior.initialize(color, size);
		Self {
			brush,
			behavior,
			options: kind.options(),
			color,
			size,
			points: Vec::new(),
			previous_position: None,
			accepted: 0,
		}
	}

	pub fn brush(&self) -> BrushId {
		self.brush
	}

	pub fn options(&self) -> BrushOptions {
		self.options
	}

	pub fn color(&self) -> Vec3 {
		self.color
	}

	pub fn size(&self) -> f32 {
		self.size
	}

	pub fn points(&self) -> &[Point] {
		&self.points
	}

	pub fn len(&self) -> usize {
		self.points.len()
	}

	pub fn is_empty(&self) -> bool {
		self.points.is_empty()
	}

	/// Live capture: runs the spacing/count gate, then lets the brush veto the sample.
	///
	/// Returns whether the sample became a point.
	pub fn add_point(&mut self, sample: Sample) -> bool {
		if !filter::admits(
			&self.options,
			self.previous_position,
			self.accepted,
			sample.position,
		) {
			return false;
		}
		if !self.behavior.accept_point(&sample) {
			return false;
		}
		self.push(&sample);
		true
	}

	/// Appends a point that was already accepted once, e.g. when loading a saved drawing.
	///
	/// Throttling is skipped and the point is kept even if the brush declines it; the brush still
	/// sees the sample so it can rebuild any per-point state.
	pub fn replay_point(&mut self, point: Point) {
		let sample = Sample {
			position: point.position,
			orientation: point.orientation,
			pointer_position: pointer_position(point.position, point.orientation),
			pressure: point.pressure,
			timestamp: point.timestamp,
		};
		if !self.behavior.accept_point(&sample) {
			tracing::trace!(brush = ?self.brush, "brush declined a replayed point");
		}
		self.push(&sample);
	}

	fn push(&mut self, sample: &Sample) {
		self.accepted += 1;
		self.points.push(sample.into());
		self.previous_position = Some(sample.position);
	}

	pub fn tick(&mut self, time: f64, delta: f64) {
		self.behavior.tick(time, delta);
	}

	/// Size of this stroke's binary record.
	pub fn encoded_len(&self) -> usize {
		STROKE_HEADER_SIZE + self.behavior.point_byte_size() * self.points.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::brush::{BrushRegistry, PartialBrushOptions};
	use crate::test::*;
	use itertools::Itertools;

	fn stroke_with(options: PartialBrushOptions, log: &Log) -> Stroke {
		let mut registry = BrushRegistry::new();
		let id = register_recording(&mut registry, "rec", options, log);
		Stroke::new(id, registry.kind(id), Vec3::X, 0.1)
	}

	#[test]
	fn initialize_receives_color_and_size() {
		let log = Log::default();
		let _stroke = stroke_with(Default::default(), &log);
		assert_eq!(log.events(), [Event::Initialize(Vec3::X, 0.1)]);
	}

	#[test]
	fn accepted_points_are_appended_in_order() {
		let log = Log::default();
		let mut stroke = stroke_with(Default::default(), &log);
		for x in 0..5 {
			assert!(stroke.add_point(sample(x as f32, 0.0, 0.0)));
		}
		let xs = stroke.points().iter().map(|p| p.position.x).collect_vec();
		assert_eq!(xs, [0.0, 1.0, 2.0, 3.0, 4.0]);
		assert_eq!(stroke.encoded_len(), 21 + 5 * 36);
	}

	#[test]
	fn accepted_points_are_farther_apart_than_spacing() {
		let log = Log::default();
		let spacing = 0.25;
		let mut stroke = stroke_with(PartialBrushOptions::spacing(spacing), &log);
		let mut rng = fastrand::Rng::with_seed(3);
		for _ in 0..500 {
			stroke.add_point(sample(rng.f32(), rng.f32(), rng.f32()));
		}
		assert!(stroke.len() > 1);
		for (a, b) in stroke.points().iter().tuple_windows() {
			assert!(a.position.distance(b.position) > spacing);
		}
	}

	#[test]
	fn max_points_is_never_exceeded() {
		let log = Log::default();
		let mut stroke = stroke_with(PartialBrushOptions::max_points(7), &log);
		for i in 0..100 {
			stroke.add_point(sample(i as f32, 0.0, 0.0));
		}
		assert_eq!(stroke.len(), 7);
	}

	#[test]
	fn veto_leaves_state_untouched() {
		let log = Log::default();
		let mut stroke = stroke_with(PartialBrushOptions::spacing(0.5), &log);
		assert!(stroke.add_point(sample(0.0, 0.0, 0.0)));

		log.set_veto(true);
		assert!(!stroke.add_point(sample(1.0, 0.0, 0.0)));
		assert_eq!(stroke.len(), 1);

		// The vetoed sample did not move the spacing reference.
		log.set_veto(false);
		assert!(!stroke.add_point(sample(0.3, 0.0, 0.0)));
		assert!(stroke.add_point(sample(0.6, 0.0, 0.0)));
		assert_eq!(stroke.len(), 2);
	}

	#[test]
	fn filtered_samples_never_reach_the_brush() {
		let log = Log::default();
		let mut stroke = stroke_with(PartialBrushOptions::spacing(1.0), &log);
		stroke.add_point(sample(0.0, 0.0, 0.0));
		stroke.add_point(sample(0.5, 0.0, 0.0));
		let accepted = log
			.events()
			.into_iter()
			.filter(|e| matches!(e, Event::Accept(_)))
			.count();
		assert_eq!(accepted, 1);
	}

	#[test]
	fn replay_bypasses_throttling_and_veto() {
		let log = Log::default();
		let mut stroke = stroke_with(
			PartialBrushOptions {
				spacing: Some(10.0),
				max_points: Some(1),
			},
			&log,
		);
		log.set_veto(true);
		let point = Point {
			position: Vec3::ZERO,
			orientation: Quat::IDENTITY,
			pressure: 0.5,
			timestamp: 3,
		};
		stroke.replay_point(point);
		stroke.replay_point(point);
		assert_eq!(stroke.points(), [point, point]);
	}

	#[test]
	fn replayed_samples_carry_the_pointer_position() {
		let log = Log::default();
		let mut stroke = stroke_with(Default::default(), &log);
		stroke.replay_point(Point {
			position: Vec3::ONE,
			orientation: Quat::IDENTITY,
			pressure: 1.0,
			timestamp: 0,
		});
		let expected = Vec3::ONE + Vec3::new(0.0, 0.7, 1.0).normalize() * -0.03;
		match log.events().last() {
			Some(Event::Accept(accepted)) => {
				assert!(accepted.pointer_position.abs_diff_eq(expected, 1e-6))
			}
			other => panic!("unexpected event {other:?}"),
		}
	}

	#[test]
	fn tick_is_forwarded() {
		let log = Log::default();
		let mut stroke = stroke_with(Default::default(), &log);
		stroke.tick(1.5, 0.016);
		assert_eq!(log.events().last(), Some(&Event::Tick(1.5, 0.016)));
	}
}
