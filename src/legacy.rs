//! The older JSON interchange format, which stores only positions.
//!
//! ```json
//! {
//!   "magic": "apainter",
//!   "version": 1,
//!   "strokes": [
//!     { "brush": "flat", "color": "#ff0000", "size": 0.1, "points": ["0 1 0", "0.5 1 0"] }
//!   ]
//! }
//! ```
//!
//! Orientations are reconstructed from the polyline, pressure is `1` and timestamps are `0`.

use glam::Vec3;
use serde::Deserialize;

use crate::brush::Sample;
use crate::codec::MAGIC;
use crate::config::ImportOptions;
use crate::drawing::{Drawing, DrawingError};
use crate::orientation::OrientationReconstructor;

pub const LEGACY_VERSION: f64 = 1.0;

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyDrawing {
	#[serde(default)]
	pub magic: String,
	#[serde(default)]
	pub version: Option<f64>,
	#[serde(default)]
	pub strokes: Vec<LegacyStroke>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyStroke {
	pub brush: String,
	pub color: String,
	#[serde(default)]
	pub size: Option<f32>,
	pub points: Vec<Coordinate>,
}

/// A position, either as whitespace-separated text (`"1 2 3"`) or as an object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
	Text(String),
	Components {
		x: f32,
		y: f32,
		#[serde(default)]
		z: f32,
	},
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CoordinateError {
	#[error("invalid number {0:?}")]
	InvalidNumber(String),

	#[error("too many components")]
	TooManyComponents,
}

/// Parses `"x y z"`. Missing trailing components are zero.
pub fn parse_coordinate(text: &str) -> Result<Vec3, CoordinateError> {
	let mut components = [0.0; 3];
	for (i, word) in text.split_whitespace().enumerate() {
		let component = components
			.get_mut(i)
			.ok_or(CoordinateError::TooManyComponents)?;
		*component = word
			.parse()
			.map_err(|_| CoordinateError::InvalidNumber(word.to_owned()))?;
	}
	Ok(Vec3::from_array(components))
}

impl Coordinate {
	pub fn to_vec3(&self) -> Result<Vec3, CoordinateError> {
		match self {
			Coordinate::Text(text) => parse_coordinate(text),
			&Coordinate::Components { x, y, z } => Ok(Vec3::new(x, y, z)),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum LegacyError {
	#[error("malformed JSON drawing")]
	Json(#[from] serde_json::Error),

	#[error("bad JSON drawing header (magic {magic:?}, version {version:?})")]
	BadHeader { magic: String, version: Option<f64> },

	#[error("stroke {stroke}: invalid color {color:?}")]
	Color {
		stroke: usize,
		color: String,
		source: csscolorparser::ParseColorError,
	},

	#[error("stroke {stroke}, point {point}: invalid coordinate")]
	Coordinate {
		stroke: usize,
		point: usize,
		source: CoordinateError,
	},

	#[error(transparent)]
	Drawing(#[from] DrawingError),
}

static_assertions::assert_impl_all!(LegacyError: std::error::Error, Send, Sync);

struct ResolvedStroke<'a> {
	brush: &'a str,
	color: Vec3,
	size: f32,
	positions: Vec<Vec3>,
}

fn resolve<'a>(
	index: usize,
	stroke: &'a LegacyStroke,
	options: &ImportOptions,
) -> Result<ResolvedStroke<'a>, LegacyError> {
	let color = csscolorparser::parse(&stroke.color).map_err(|source| LegacyError::Color {
		stroke: index,
		color: stroke.color.clone(),
		source,
	})?;
	let [r, g, b, _] = color.to_array();
	let positions = stroke
		.points
		.iter()
		.enumerate()
		.map(|(point, coordinate)| {
			coordinate.to_vec3().map_err(|source| LegacyError::Coordinate {
				stroke: index,
				point,
				source,
			})
		})
		.collect::<Result<_, _>>()?;
	Ok(ResolvedStroke {
		brush: &stroke.brush,
		color: Vec3::new(r as f32, g as f32, b as f32),
		// A size of zero counts as missing.
		size: stroke.size.filter(|&size| size != 0.0).unwrap_or(options.default_size),
		positions,
	})
}

/// Appends the strokes of `source` to `drawing` through the live capture path.
///
/// The whole document is validated before any stroke is added. Returns the number of strokes
/// added.
#[tracing::instrument(skip_all, fields(strokes = source.strokes.len()), err)]
pub fn import(
	drawing: &mut Drawing,
	source: &LegacyDrawing,
	options: &ImportOptions,
) -> Result<usize, LegacyError> {
	if source.magic.as_bytes() != MAGIC || source.version != Some(LEGACY_VERSION) {
		Err(LegacyError::BadHeader {
			magic: source.magic.clone(),
			version: source.version,
		})?;
	}
	if !source.strokes.is_empty() {
		drawing.registry().fallback().ok_or(DrawingError::NoBrushes)?;
	}

	let strokes = source
		.strokes
		.iter()
		.enumerate()
		.map(|(i, stroke)| resolve(i, stroke, options))
		.collect::<Result<Vec<_>, _>>()?;

	let mut reconstructor = OrientationReconstructor::new();
	let mut lift = 0.0f64;
	for resolved in &strokes {
		lift += options.y_fight_step as f64;
		let stroke = drawing.add_stroke(resolved.brush, resolved.color, resolved.size)?;
		for (position, orientation) in
			reconstructor.reconstruct_lifted(&resolved.positions, lift as f32)
		{
			stroke.add_point(Sample {
				position,
				orientation,
				pointer_position: position,
				pressure: 1.0,
				timestamp: 0,
			});
		}
	}

	tracing::info!(strokes = strokes.len(), "JSON drawing imported");
	Ok(strokes.len())
}

pub fn import_str(
	drawing: &mut Drawing,
	json: &str,
	options: &ImportOptions,
) -> Result<usize, LegacyError> {
	let source: LegacyDrawing = serde_json::from_str(json)?;
	import(drawing, &source, options)
}
