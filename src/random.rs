use bon::builder;
use glam::vec3;

use crate::brush::Sample;
use crate::drawing::{Drawing, DrawingError};
use crate::orientation::rotation_between;
use crate::stroke::pointer_position;

/// Appends `count` random walks to a drawing, for stress testing.
///
/// Every point goes through the capture filter, so brushes with spacing or point limits may keep
/// fewer points than were generated. Returns the number of points kept.
#[builder(finish_fn = generate)]
pub fn random_strokes(
	#[builder(start_fn)] count: usize,
	#[builder(finish_fn)] drawing: &mut Drawing,
	seed: Option<u64>,
	#[builder(default = "flat")] brush: &str,
	#[builder(default = 500)] max_points: usize,
) -> Result<usize, DrawingError> {
	let mut rng = match seed {
		Some(seed) => fastrand::Rng::with_seed(seed),
		None => fastrand::Rng::new(),
	};
	let signed = |rng: &mut fastrand::Rng| 2.0 * rng.f32() - 1.0;

	let mut accepted = 0;
	for _ in 0..count {
		let color = vec3(rng.f32(), rng.f32(), rng.f32());
		let size = 0.1 * rng.f32();
		let points = (rng.f32() * max_points as f32) as usize;
		let stroke = drawing.add_stroke(brush, color, size)?;

		let mut position = vec3(signed(&mut rng), signed(&mut rng), signed(&mut rng));
		for _ in 0..points {
			let step = vec3(signed(&mut rng), signed(&mut rng), signed(&mut rng))
				* (signed(&mut rng) / 20.0);
			let orientation =
				rotation_between(position.normalize_or_zero(), step.normalize_or_zero());
			position += step;
			let added = stroke.add_point(Sample {
				position,
				orientation,
				pointer_position: pointer_position(position, orientation),
				pressure: 0.2,
				timestamp: 0,
			});
			accepted += added as usize;
		}
	}

	tracing::debug!(count, accepted, "random strokes generated");
	Ok(accepted)
}
