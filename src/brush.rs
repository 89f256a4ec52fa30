use std::collections::HashMap;
use std::sync::Arc;

use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::codec::POINT_RECORD_SIZE;

/// The most brush kinds a registry holds. Both the used-brush count and the per-stroke brush
/// index are stored in a single byte.
pub const MAX_BRUSH_KINDS: usize = u8::MAX as usize;

/// A raw capture sample as delivered by the input layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
	pub position: Vec3,
	pub orientation: Quat,
	/// The stylus tip. Brush hooks may use it for geometry, but it is not stored in the stroke.
	pub pointer_position: Vec3,
	pub pressure: f32,
	pub timestamp: u32,
}

/// Kind-specific stroke behavior.
///
/// Every stroke owns its own instance, created by the factory registered with the kind. The
/// generic spacing and point-count throttling happens in [`crate::Stroke::add_point`] before
/// `accept_point` is consulted, so implementations only decide what a point means for them.
pub trait Brush {
	fn initialize(&mut self, _color: Vec3, _size: f32) {}

	/// Consumes a sample that passed the capture filter. Returning `false` vetoes the point.
	fn accept_point(&mut self, sample: &Sample) -> bool;

	/// Bytes per point in this brush's binary record. Only used to size the output buffer before
	/// encoding; every point is written as a [`POINT_RECORD_SIZE`] byte record.
	fn point_byte_size(&self) -> usize {
		POINT_RECORD_SIZE
	}

	fn tick(&mut self, _time: f64, _delta: f64) {}
}

pub type BrushFactory = Arc<dyn Fn() -> Box<dyn Brush>>;

/// Capture filter options of a brush kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushOptions {
	/// Samples closer than this to the previous accepted point are dropped.
	pub spacing: f32,
	/// Hard cap on points per stroke. `0` means unbounded.
	pub max_points: u32,
}

impl Default for BrushOptions {
	fn default() -> Self {
		Self {
			spacing: 0.0,
			max_points: 0,
		}
	}
}

impl BrushOptions {
	pub fn merged(self, overrides: PartialBrushOptions) -> Self {
		Self {
			spacing: overrides.spacing.unwrap_or(self.spacing),
			max_points: overrides.max_points.unwrap_or(self.max_points),
		}
	}
}

/// Caller-supplied options. Unset fields keep the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialBrushOptions {
	pub spacing: Option<f32>,
	pub max_points: Option<u32>,
}

impl PartialBrushOptions {
	pub fn spacing(spacing: f32) -> Self {
		Self {
			spacing: Some(spacing),
			..Default::default()
		}
	}

	pub fn max_points(max_points: u32) -> Self {
		Self {
			max_points: Some(max_points),
			..Default::default()
		}
	}

	pub fn overridden_by(self, other: PartialBrushOptions) -> Self {
		Self {
			spacing: other.spacing.or(self.spacing),
			max_points: other.max_points.or(self.max_points),
		}
	}
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RegistryError {
	#[error(
		"the brush `{0}` has already been registered; check that the same brush is not registered twice"
	)]
	DuplicateBrush(String),

	#[error("invalid brush name {0:?}: names must be between 1 and 255 bytes")]
	InvalidName(String),

	#[error("invalid spacing {spacing} for brush `{name}`")]
	InvalidSpacing { name: String, spacing: f32 },

	#[error("cannot register more than {MAX_BRUSH_KINDS} brush kinds")]
	TooManyBrushes,
}

static_assertions::assert_impl_all!(RegistryError: std::error::Error, Send, Sync);

/// Handle to a registered brush kind. Only meaningful for the registry that issued it (or a
/// clone of it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BrushId(usize);

impl BrushId {
	pub fn index(self) -> usize {
		self.0
	}
}

#[derive(Clone)]
pub struct BrushKind {
	name: Arc<str>,
	options: BrushOptions,
	factory: BrushFactory,
	used: bool,
}

impl std::fmt::Debug for BrushKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BrushKind")
			.field("name", &self.name)
			.field("options", &self.options)
			.field("used", &self.used)
			.finish_non_exhaustive()
	}
}

impl BrushKind {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn options(&self) -> BrushOptions {
		self.options
	}

	/// Whether a stroke of this kind was created since the drawing was last cleared.
	pub fn is_used(&self) -> bool {
		self.used
	}

	pub(crate) fn instantiate(&self) -> Box<dyn Brush> {
		(self.factory)()
	}
}

/// The catalog of brush kinds, in registration order.
#[derive(Clone, Debug, Default)]
pub struct BrushRegistry {
	kinds: Vec<BrushKind>,
	by_name: HashMap<Arc<str>, BrushId>,
}

impl BrushRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(
		&mut self,
		name: &str,
		factory: impl Fn() -> Box<dyn Brush> + 'static,
		options: PartialBrushOptions,
	) -> Result<BrushId, RegistryError> {
		if name.is_empty() || name.len() > u8::MAX as usize {
			Err(RegistryError::InvalidName(name.to_owned()))?;
		}
		if self.by_name.contains_key(name) {
			Err(RegistryError::DuplicateBrush(name.to_owned()))?;
		}
		if self.kinds.len() >= MAX_BRUSH_KINDS {
			Err(RegistryError::TooManyBrushes)?;
		}

		let options = BrushOptions::default().merged(options);
		if !(options.spacing >= 0.0) {
			Err(RegistryError::InvalidSpacing {
				name: name.to_owned(),
				spacing: options.spacing,
			})?;
		}

		let id = BrushId(self.kinds.len());
		let name: Arc<str> = name.into();
		self.kinds.push(BrushKind {
			name: name.clone(),
			options,
			factory: Arc::new(factory),
			used: false,
		});
		self.by_name.insert(name, id);
		tracing::trace!(name = %self.kinds[id.0].name, ?options, "registered brush");
		Ok(id)
	}

	/// Registers a brush whose per-stroke state starts from `Default`.
	pub fn register_default<B: Brush + Default + 'static>(
		&mut self,
		name: &str,
		options: PartialBrushOptions,
	) -> Result<BrushId, RegistryError> {
		self.register(name, || Box::new(B::default()), options)
	}

	pub fn lookup(&self, name: &str) -> Option<BrushId> {
		self.by_name.get(name).copied()
	}

	pub fn get(&self, id: BrushId) -> Option<&BrushKind> {
		self.kinds.get(id.0)
	}

	pub fn kind(&self, id: BrushId) -> &BrushKind {
		&self.kinds[id.0]
	}

	/// The kind used in place of an unknown brush name.
	pub fn fallback(&self) -> Option<BrushId> {
		(!self.kinds.is_empty()).then_some(BrushId(0))
	}

	pub fn len(&self) -> usize {
		self.kinds.len()
	}

	pub fn is_empty(&self) -> bool {
		self.kinds.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (BrushId, &BrushKind)> + '_ {
		self.kinds.iter().enumerate().map(|(i, kind)| (BrushId(i), kind))
	}

	/// Used kinds in registration order. This is the order of the binary index table.
	pub fn used_kinds(&self) -> impl Iterator<Item = (BrushId, &BrushKind)> + '_ {
		self.iter().filter(|(_, kind)| kind.used)
	}

	pub fn used_names(&self) -> Vec<&str> {
		self.used_kinds().map(|(_, kind)| kind.name()).collect()
	}

	pub(crate) fn mark_used(&mut self, id: BrushId) {
		self.kinds[id.0].used = true;
	}

	pub(crate) fn reset_usage(&mut self) {
		for kind in &mut self.kinds {
			kind.used = false;
		}
	}
}
