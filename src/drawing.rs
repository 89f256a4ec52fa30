use glam::Vec3;

use crate::brush::{BrushId, BrushRegistry};
use crate::codec::{self, DecodeError, DecodeWarning, VERSION};
use crate::stroke::Stroke;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DrawingError {
	#[error("no brushes have been registered")]
	NoBrushes,
}

static_assertions::assert_impl_all!(DrawingError: std::error::Error, Send, Sync);

/// Receives stroke lifecycle notifications, e.g. to create and dispose of stroke visuals.
pub trait DrawingObserver {
	fn stroke_added(&mut self, _index: usize, _stroke: &Stroke) {}

	fn stroke_removed(&mut self, _stroke: &Stroke) {}
}

/// Outcome of loading a binary drawing into an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
	pub strokes: usize,
	pub warnings: Vec<DecodeWarning>,
}

/// The strokes of one painting session, in draw order.
pub struct Drawing {
	registry: BrushRegistry,
	strokes: Vec<Stroke>,
	version: u16,
	observers: Vec<Box<dyn DrawingObserver>>,
}

impl std::fmt::Debug for Drawing {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Drawing")
			.field("registry", &self.registry)
			.field("strokes", &self.strokes)
			.field("version", &self.version)
			.finish_non_exhaustive()
	}
}

impl Drawing {
	pub fn new(registry: BrushRegistry) -> Self {
		let mut drawing = Self {
			registry,
			strokes: Vec::new(),
			version: VERSION,
			observers: Vec::new(),
		};
		drawing.clear();
		drawing
	}

	pub fn registry(&self) -> &BrushRegistry {
		&self.registry
	}

	/// Allows registering more brush kinds after the drawing was created.
	pub fn registry_mut(&mut self) -> &mut BrushRegistry {
		&mut self.registry
	}

	pub fn version(&self) -> u16 {
		self.version
	}

	pub fn strokes(&self) -> &[Stroke] {
		&self.strokes
	}

	pub fn len(&self) -> usize {
		self.strokes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.strokes.is_empty()
	}

	pub fn last_stroke_mut(&mut self) -> Option<&mut Stroke> {
		self.strokes.last_mut()
	}

	pub fn add_observer(&mut self, observer: impl DrawingObserver + 'static) {
		self.observers.push(Box::new(observer));
	}

	/// The registered kind for `name`, or the fallback kind if there is none.
	pub fn resolve_brush(&self, name: &str) -> Result<BrushId, DrawingError> {
		if let Some(id) = self.registry.lookup(name) {
			return Ok(id);
		}
		let fallback = self.registry.fallback().ok_or(DrawingError::NoBrushes)?;
		tracing::warn!(
			name,
			fallback = self.registry.kind(fallback).name(),
			"invalid brush name, using fallback"
		);
		Ok(fallback)
	}

	/// Starts a new stroke and returns it for point capture.
	pub fn add_stroke(
		&mut self,
		brush_name: &str,
		color: Vec3,
		size: f32,
	) -> Result<&mut Stroke, DrawingError> {
		let brush = self.resolve_brush(brush_name)?;
		Ok(self.add_stroke_with(brush, color, size))
	}

	pub(crate) fn add_stroke_with(&mut self, brush: BrushId, color: Vec3, size: f32) -> &mut Stroke {
		self.registry.mark_used(brush);
		let stroke = Stroke::new(brush, self.registry.kind(brush), color, size);
		self.push(stroke)
	}

	fn push(&mut self, stroke: Stroke) -> &mut Stroke {
		let index = self.strokes.len();
		for observer in &mut self.observers {
			observer.stroke_added(index, &stroke);
		}
		self.strokes.push(stroke);
		&mut self.strokes[index]
	}

	/// Removes the most recent stroke. Brush usage is left alone.
	pub fn undo(&mut self) -> Option<Stroke> {
		let stroke = self.strokes.pop()?;
		for observer in &mut self.observers {
			observer.stroke_removed(&stroke);
		}
		Some(stroke)
	}

	pub fn clear(&mut self) {
		for stroke in self.strokes.drain(..) {
			for observer in &mut self.observers {
				observer.stroke_removed(&stroke);
			}
		}
		self.registry.reset_usage();
	}

	pub fn tick(&mut self, time: f64, delta: f64) {
		for stroke in &mut self.strokes {
			stroke.tick(time, delta);
		}
	}

	/// Names of the used brushes, in the order of the binary index table.
	pub fn used_brush_names(&self) -> Vec<&str> {
		self.registry.used_names()
	}

	pub fn brush_name(&self, stroke: &Stroke) -> &str {
		self.registry.kind(stroke.brush()).name()
	}

	pub fn to_binary(&self) -> Vec<u8> {
		codec::encode(self)
	}

	/// Decodes `bytes` and appends its strokes after the existing ones.
	///
	/// Nothing is appended if decoding fails.
	pub fn load_binary(&mut self, bytes: &[u8]) -> Result<LoadReport, DecodeError> {
		let decoded = codec::decode(bytes, self.registry.clone())?;
		let strokes = decoded.drawing.strokes.len();
		for (id, _) in decoded.drawing.registry.used_kinds() {
			self.registry.mark_used(id);
		}
		for stroke in decoded.drawing.strokes {
			self.push(stroke);
		}
		tracing::debug!(strokes, total = self.strokes.len(), "binary drawing loaded");
		Ok(LoadReport {
			strokes,
			warnings: decoded.warnings,
		})
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::test::*;

	#[derive(Clone, Default)]
	struct Scene(Rc<RefCell<Vec<String>>>);

	impl DrawingObserver for Scene {
		fn stroke_added(&mut self, index: usize, stroke: &Stroke) {
			self.0.borrow_mut().push(format!("add {index} {}", stroke.size()));
		}

		fn stroke_removed(&mut self, stroke: &Stroke) {
			self.0.borrow_mut().push(format!("remove {}", stroke.size()));
		}
	}

	#[test]
	fn add_stroke_marks_brush_used() {
		let mut drawing = Drawing::new(registry_of(&["a", "b", "c"]));
		assert!(drawing.used_brush_names().is_empty());

		drawing.add_stroke("c", Vec3::ONE, 0.1).unwrap();
		drawing.add_stroke("b", Vec3::ONE, 0.1).unwrap();
		assert_eq!(drawing.used_brush_names(), ["b", "c"]);
		assert_eq!(drawing.len(), 2);
	}

	#[test]
	fn unknown_brush_falls_back_to_first_registered() {
		let mut drawing = Drawing::new(registry_of(&["a", "b"]));
		let brush = drawing.add_stroke("nope", Vec3::ONE, 0.1).unwrap().brush();
		assert_eq!(Some(brush), drawing.registry().lookup("a"));
		assert_eq!(drawing.used_brush_names(), ["a"]);
	}

	#[test]
	fn empty_registry_cannot_start_strokes() {
		let mut drawing = Drawing::new(BrushRegistry::new());
		assert_eq!(
			drawing.add_stroke("a", Vec3::ONE, 0.1).unwrap_err(),
			DrawingError::NoBrushes
		);
	}

	#[test]
	fn undo_on_empty_is_a_no_op() {
		let mut drawing = Drawing::new(registry_of(&["a"]));
		assert!(drawing.undo().is_none());
		assert!(drawing.is_empty());
	}

	#[test]
	fn undo_keeps_brush_usage() {
		let mut drawing = Drawing::new(registry_of(&["a", "b"]));
		drawing.add_stroke("a", Vec3::ONE, 0.1).unwrap();
		drawing.add_stroke("b", Vec3::ONE, 0.2).unwrap();
		let removed = drawing.undo().unwrap();
		assert_eq!(removed.size(), 0.2);
		assert_eq!(drawing.len(), 1);
		assert_eq!(drawing.used_brush_names(), ["a", "b"]);
	}

	#[test]
	fn clear_resets_usage_even_when_empty() {
		let mut drawing = Drawing::new(registry_of(&["a", "b"]));
		drawing.add_stroke("b", Vec3::ONE, 0.1).unwrap();
		drawing.undo();
		assert_eq!(drawing.used_brush_names(), ["b"]);
		drawing.clear();
		assert!(drawing.used_brush_names().is_empty());

		drawing.add_stroke("a", Vec3::ONE, 0.1).unwrap();
		drawing.clear();
		assert!(drawing.is_empty());
		assert!(drawing.used_brush_names().is_empty());
	}

	#[test]
	fn observers_see_lifecycle() {
		let scene = Scene::default();
		let mut drawing = Drawing::new(registry_of(&["a"]));
		drawing.add_observer(scene.clone());

		drawing.add_stroke("a", Vec3::ONE, 1.0).unwrap();
		drawing.add_stroke("a", Vec3::ONE, 2.0).unwrap();
		drawing.undo();
		drawing.add_stroke("a", Vec3::ONE, 3.0).unwrap();
		drawing.clear();

		assert_eq!(
			*scene.0.borrow(),
			["add 0 1", "add 1 2", "remove 2", "add 1 3", "remove 1", "remove 3"]
		);
	}

	#[test]
	fn tick_reaches_every_stroke() {
		let log = Log::default();
		let mut registry = BrushRegistry::new();
		register_recording(&mut registry, "rec", Default::default(), &log);
		let mut drawing = Drawing::new(registry);

		drawing.tick(0.0, 0.016);
		assert!(log.events().is_empty());

		drawing.add_stroke("rec", Vec3::ONE, 0.1).unwrap();
		drawing.add_stroke("rec", Vec3::ONE, 0.1).unwrap();
		drawing.tick(1.0, 0.016);
		let ticks = log
			.events()
			.into_iter()
			.filter(|e| *e == Event::Tick(1.0, 0.016))
			.count();
		assert_eq!(ticks, 2);
	}

	#[test]
	fn failed_load_appends_nothing() {
		let mut drawing = Drawing::new(registry_of(&["a"]));
		drawing.add_stroke("a", Vec3::ONE, 0.1).unwrap();
		assert!(drawing.load_binary(b"not a drawing at all").is_err());
		assert_eq!(drawing.len(), 1);
	}

	#[test]
	fn load_appends_after_existing_strokes() {
		let mut source = Drawing::new(registry_of(&["a", "b"]));
		source
			.add_stroke("b", Vec3::X, 0.5)
			.unwrap()
			.add_point(sample(1.0, 2.0, 3.0));
		let bytes = source.to_binary();

		let mut drawing = Drawing::new(registry_of(&["a", "b"]));
		drawing.add_stroke("a", Vec3::ONE, 0.1).unwrap();
		let report = drawing.load_binary(&bytes).unwrap();
		assert_eq!(report.strokes, 1);
		assert!(report.warnings.is_empty());
		assert_eq!(drawing.len(), 2);
		assert_eq!(drawing.brush_name(&drawing.strokes()[1]), "b");
		assert_eq!(drawing.strokes()[1].points()[0].position, Vec3::new(1.0, 2.0, 3.0));
		assert_eq!(drawing.used_brush_names(), ["a", "b"]);
	}
}
