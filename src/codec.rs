//! Binary drawing format.
//!
//! All values are little-endian with fixed widths and no padding:
//!
//! ```text
//! header:  magic "apainter" (8) | version u16 | used brush count u8
//!          | used brush names (u8 length + UTF-8 bytes each) | stroke count u32
//! stroke:  brush index u8 | color 3×f32 | size f32 | point count u32 | points
//! point:   position 3×f32 | orientation 4×f32 (x y z w) | pressure f32 | timestamp u32
//! ```
//!
//! The brush index refers to the used brush names, which are the used kinds in registration
//! order.

use glam::{Quat, Vec3};
use itertools::Itertools;
use static_assertions::const_assert_eq;

use crate::brush::BrushRegistry;
use crate::drawing::{Drawing, DrawingError};
use crate::stroke::Point;

pub const MAGIC: &[u8; 8] = b"apainter";
pub const VERSION: u16 = 1;

/// Brush index, color, size and point count.
pub const STROKE_HEADER_SIZE: usize = 1 + 3 * 4 + 4 + 4;
pub const POINT_RECORD_SIZE: usize = (3 + 4 + 1 + 1) * 4;

/// Magic, version, used brush count and stroke count.
const HEADER_FIXED_SIZE: usize = MAGIC.len() + 2 + 1 + 4;

pub fn stroke_record_size(point_count: usize) -> usize {
	STROKE_HEADER_SIZE + POINT_RECORD_SIZE * point_count
}

/// A point as laid out on the wire. Every field holds little-endian bits.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct PointRecord {
	position: [u32; 3],
	orientation: [u32; 4],
	pressure: u32,
	timestamp: u32,
}

const_assert_eq!(std::mem::size_of::<PointRecord>(), POINT_RECORD_SIZE);

fn f32_to_le(value: f32) -> u32 {
	value.to_bits().to_le()
}

fn f32_from_le(bits: u32) -> f32 {
	f32::from_bits(u32::from_le(bits))
}

impl From<&Point> for PointRecord {
	fn from(point: &Point) -> Self {
		Self {
			position: point.position.to_array().map(f32_to_le),
			orientation: point.orientation.to_array().map(f32_to_le),
			pressure: f32_to_le(point.pressure),
			timestamp: point.timestamp.to_le(),
		}
	}
}

impl From<PointRecord> for Point {
	fn from(record: PointRecord) -> Self {
		Self {
			position: Vec3::from_array(record.position.map(f32_from_le)),
			orientation: Quat::from_array(record.orientation.map(f32_from_le)),
			pressure: f32_from_le(record.pressure),
			timestamp: u32::from_le(record.timestamp),
		}
	}
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DecodeError {
	#[error("invalid `magic` header at byte {offset}")]
	MalformedHeader { offset: usize },

	#[error("unexpected end of data at byte {offset}: needed {needed} bytes, {available} available")]
	UnexpectedEnd {
		offset: usize,
		needed: usize,
		available: usize,
	},

	#[error("brush name at byte {offset} is not valid UTF-8")]
	InvalidBrushName { offset: usize },

	#[error("stroke at byte {offset} uses brush index {index} but only {count} brushes are listed")]
	UnresolvedBrushIndex { offset: usize, index: u8, count: usize },

	#[error(transparent)]
	Drawing(#[from] DrawingError),
}

static_assertions::assert_impl_all!(DecodeError: std::error::Error, Send, Sync);

/// Problems that do not stop a decode.
#[derive(Clone, Debug, PartialEq, derive_more::Display)]
pub enum DecodeWarning {
	#[display("invalid version {found} (expected {expected})")]
	VersionMismatch { found: u16, expected: u16 },

	#[display("invalid brush name `{name}`, using `{fallback}`")]
	UnknownBrush { name: String, fallback: String },

	#[display("{count} trailing bytes after the last stroke")]
	TrailingBytes { count: usize },
}

#[derive(Debug)]
pub struct Decoded {
	pub drawing: Drawing,
	pub warnings: Vec<DecodeWarning>,
}

struct Writer(Vec<u8>);

impl Writer {
	fn bytes(&mut self, bytes: &[u8]) {
		self.0.extend_from_slice(bytes);
	}

	fn u8(&mut self, value: u8) {
		self.0.push(value);
	}

	fn u16(&mut self, value: u16) {
		self.bytes(&value.to_le_bytes());
	}

	fn u32(&mut self, value: u32) {
		self.bytes(&value.to_le_bytes());
	}

	fn f32(&mut self, value: f32) {
		self.bytes(&value.to_le_bytes());
	}

	fn vec3(&mut self, value: Vec3) {
		for component in value.to_array() {
			self.f32(component);
		}
	}

	fn string(&mut self, value: &str) {
		debug_assert!(value.len() <= u8::MAX as usize);
		self.u8(value.len() as u8);
		self.bytes(value.as_bytes());
	}

	fn point(&mut self, point: &Point) {
		self.bytes(bytemuck::bytes_of(&PointRecord::from(point)));
	}
}

/// Serializes the whole drawing.
pub fn encode(drawing: &Drawing) -> Vec<u8> {
	let registry = drawing.registry();

	// Stroke brushes are always marked used, but listing them explicitly keeps the table total.
	let mut listed = vec![false; registry.len()];
	for (id, _) in registry.used_kinds() {
		listed[id.index()] = true;
	}
	for stroke in drawing.strokes() {
		listed[stroke.brush().index()] = true;
	}
	let mut indices = vec![0u8; registry.len()];
	let names = registry
		.iter()
		.filter(|(id, _)| listed[id.index()])
		.enumerate()
		.map(|(index, (id, kind))| {
			indices[id.index()] = index as u8;
			kind.name()
		})
		.collect_vec();

	let header_len = HEADER_FIXED_SIZE + names.iter().map(|name| 1 + name.len()).sum::<usize>();
	let strokes_len = drawing
		.strokes()
		.iter()
		.map(|stroke| stroke.encoded_len())
		.sum::<usize>();
	let mut writer = Writer(Vec::with_capacity(header_len + strokes_len));

	writer.bytes(MAGIC);
	writer.u16(drawing.version());
	writer.u8(names.len() as u8);
	for name in &names {
		writer.string(name);
	}
	writer.u32(drawing.len() as u32);

	for stroke in drawing.strokes() {
		let start = writer.0.len();
		debug_assert_eq!(stroke.encoded_len(), stroke_record_size(stroke.len()));
		writer.u8(indices[stroke.brush().index()]);
		writer.vec3(stroke.color());
		writer.f32(stroke.size());
		writer.u32(stroke.len() as u32);
		for point in stroke.points() {
			writer.point(point);
		}
		debug_assert_eq!(writer.0.len() - start, stroke_record_size(stroke.len()));
	}

	writer.0
}

struct Reader<'a> {
	data: &'a [u8],
	offset: usize,
}

impl<'a> Reader<'a> {
	fn new(data: &'a [u8]) -> Self {
		Self { data, offset: 0 }
	}

	fn remaining(&self) -> usize {
		self.data.len() - self.offset
	}

	fn ensure(&self, len: usize) -> Result<(), DecodeError> {
		let available = self.remaining();
		if len > available {
			Err(DecodeError::UnexpectedEnd {
				offset: self.offset,
				needed: len,
				available,
			})?;
		}
		Ok(())
	}

	fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
		self.ensure(len)?;
		let bytes = &self.data[self.offset..self.offset + len];
		self.offset += len;
		Ok(bytes)
	}

	fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
		let mut array = [0; N];
		array.copy_from_slice(self.take(N)?);
		Ok(array)
	}

	fn u8(&mut self) -> Result<u8, DecodeError> {
		Ok(self.array::<1>()?[0])
	}

	fn u16(&mut self) -> Result<u16, DecodeError> {
		Ok(u16::from_le_bytes(self.array()?))
	}

	fn u32(&mut self) -> Result<u32, DecodeError> {
		Ok(u32::from_le_bytes(self.array()?))
	}

	fn f32(&mut self) -> Result<f32, DecodeError> {
		Ok(f32::from_le_bytes(self.array()?))
	}

	fn vec3(&mut self) -> Result<Vec3, DecodeError> {
		Ok(Vec3::new(self.f32()?, self.f32()?, self.f32()?))
	}

	fn string(&mut self) -> Result<&'a str, DecodeError> {
		let len = self.u8()? as usize;
		let offset = self.offset;
		std::str::from_utf8(self.take(len)?).map_err(|_| DecodeError::InvalidBrushName { offset })
	}

	fn point(&mut self) -> Result<Point, DecodeError> {
		let bytes = self.take(POINT_RECORD_SIZE)?;
		Ok(bytemuck::pod_read_unaligned::<PointRecord>(bytes).into())
	}
}

fn warn(warnings: &mut Vec<DecodeWarning>, warning: DecodeWarning) {
	tracing::warn!("{warning}");
	warnings.push(warning);
}

/// Decodes a whole drawing. Strokes are created with kinds from `registry` and their points
/// replayed without throttling.
///
/// Structural problems fail the whole decode; version mismatches and unknown brush names only
/// produce warnings.
#[tracing::instrument(skip_all, fields(len = bytes.len()), err)]
pub fn decode(bytes: &[u8], registry: BrushRegistry) -> Result<Decoded, DecodeError> {
	let mut reader = Reader::new(bytes);
	let mut warnings = Vec::new();

	if reader.take(MAGIC.len()).ok() != Some(MAGIC.as_slice()) {
		Err(DecodeError::MalformedHeader { offset: 0 })?;
	}

	let version = reader.u16()?;
	if version != VERSION {
		warn(
			&mut warnings,
			DecodeWarning::VersionMismatch {
				found: version,
				expected: VERSION,
			},
		);
	}

	let used_count = reader.u8()?;
	let mut brushes = Vec::with_capacity(used_count as usize);
	for _ in 0..used_count {
		let name = reader.string()?;
		let brush = match registry.lookup(name) {
			Some(brush) => brush,
			None => {
				let fallback = registry.fallback().ok_or(DrawingError::NoBrushes)?;
				warn(
					&mut warnings,
					DecodeWarning::UnknownBrush {
						name: name.to_owned(),
						fallback: registry.kind(fallback).name().to_owned(),
					},
				);
				fallback
			}
		};
		brushes.push(brush);
	}

	let stroke_count = reader.u32()?;
	let mut drawing = Drawing::new(registry);
	// Listed kinds stay used even when no stroke refers to them, e.g. after an undo.
	for &brush in &brushes {
		drawing.registry_mut().mark_used(brush);
	}
	for _ in 0..stroke_count {
		let offset = reader.offset;
		let index = reader.u8()?;
		let color = reader.vec3()?;
		let size = reader.f32()?;
		let point_count = reader.u32()? as usize;

		let brush = *brushes
			.get(index as usize)
			.ok_or(DecodeError::UnresolvedBrushIndex {
				offset,
				index,
				count: brushes.len(),
			})?;
		reader.ensure(point_count.saturating_mul(POINT_RECORD_SIZE))?;

		let stroke = drawing.add_stroke_with(brush, color, size);
		for _ in 0..point_count {
			stroke.replay_point(reader.point()?);
		}
	}

	if reader.remaining() > 0 {
		warn(
			&mut warnings,
			DecodeWarning::TrailingBytes {
				count: reader.remaining(),
			},
		);
	}

	tracing::debug!(strokes = drawing.len(), warnings = warnings.len(), "decoded drawing");
	Ok(Decoded { drawing, warnings })
}
