//! Brush kinds available out of the box.

use std::collections::HashMap;

use glam::Vec3;

use crate::brush::{Brush, BrushRegistry, PartialBrushOptions, RegistryError, Sample};

/// A flat ribbon following the pointer. Each accepted point adds the two edge vertices of the
/// ribbon, spread along the controller's local `x` axis.
#[derive(Debug, Default)]
pub struct RibbonBrush {
	half_width: f32,
	vertices: Vec<Vec3>,
}

impl RibbonBrush {
	pub fn vertices(&self) -> &[Vec3] {
		&self.vertices
	}
}

impl Brush for RibbonBrush {
	fn initialize(&mut self, _color: Vec3, size: f32) {
		self.half_width = 0.5 * size;
	}

	fn accept_point(&mut self, sample: &Sample) -> bool {
		let side = sample.orientation * Vec3::X * (self.half_width * sample.pressure);
		self.vertices.extend([
			sample.pointer_position - side,
			sample.pointer_position + side,
		]);
		true
	}
}

/// Discrete stamps scaled by pressure. Samples without pressure leave no mark.
#[derive(Debug, Default)]
pub struct StampBrush {
	size: f32,
	stamps: Vec<(Vec3, f32)>,
}

impl StampBrush {
	pub fn stamps(&self) -> &[(Vec3, f32)] {
		&self.stamps
	}
}

impl Brush for StampBrush {
	fn initialize(&mut self, _color: Vec3, size: f32) {
		self.size = size;
	}

	fn accept_point(&mut self, sample: &Sample) -> bool {
		if !(sample.pressure > 0.0) {
			return false;
		}
		self.stamps
			.push((sample.pointer_position, self.size * sample.pressure));
		true
	}
}

/// Registers `flat`, `line` and `stamp`, in that order. `overrides` replaces their filter
/// options by brush name.
pub fn register_defaults(
	registry: &mut BrushRegistry,
	overrides: &HashMap<String, PartialBrushOptions>,
) -> Result<(), RegistryError> {
	let options = |name: &str, builtin: PartialBrushOptions| {
		builtin.overridden_by(overrides.get(name).copied().unwrap_or_default())
	};

	registry.register_default::<RibbonBrush>("flat", options("flat", Default::default()))?;
	registry.register_default::<RibbonBrush>(
		"line",
		options("line", PartialBrushOptions::max_points(3000)),
	)?;
	registry.register_default::<StampBrush>(
		"stamp",
		options(
			"stamp",
			PartialBrushOptions {
				spacing: Some(0.05),
				max_points: Some(3000),
			},
		),
	)?;

	for name in overrides.keys() {
		if !matches!(name.as_str(), "flat" | "line" | "stamp") {
			tracing::warn!(name, "options given for unknown brush");
		}
	}
	Ok(())
}
