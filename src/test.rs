//! Shared fixtures for unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Quat, Vec3};

use crate::brush::{Brush, BrushId, BrushRegistry, PartialBrushOptions, Sample};

/// A brush that accepts everything and remembers nothing.
#[derive(Debug, Default)]
pub struct NullBrush;

impl Brush for NullBrush {
	fn accept_point(&mut self, _sample: &Sample) -> bool {
		true
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
	Initialize(Vec3, f32),
	Accept(Sample),
	Tick(f64, f64),
}

#[derive(Default)]
struct LogState {
	events: Vec<Event>,
	veto: bool,
}

/// Records every call made to the brushes created by [`register_recording`].
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<LogState>>);

impl Log {
	pub fn events(&self) -> Vec<Event> {
		self.0.borrow().events.clone()
	}

	/// While set, recording brushes decline every sample.
	pub fn set_veto(&self, veto: bool) {
		self.0.borrow_mut().veto = veto;
	}

	fn record(&self, event: Event) {
		self.0.borrow_mut().events.push(event);
	}
}

struct RecordingBrush {
	log: Log,
}

impl Brush for RecordingBrush {
	fn initialize(&mut self, color: Vec3, size: f32) {
		self.log.record(Event::Initialize(color, size));
	}

	fn accept_point(&mut self, sample: &Sample) -> bool {
		self.log.record(Event::Accept(*sample));
		!self.log.0.borrow().veto
	}

	fn tick(&mut self, time: f64, delta: f64) {
		self.log.record(Event::Tick(time, delta));
	}
}

pub fn register_recording(
	registry: &mut BrushRegistry,
	name: &str,
	options: PartialBrushOptions,
	log: &Log,
) -> BrushId {
	let log = log.clone();
	registry
		.register(
			name,
			move || {
				Box::new(RecordingBrush {
					log: log.clone(),
				})
			},
			options,
		)
		.unwrap()
}

/// A registry with one accept-all kind per name, in the given order.
pub fn registry_of(names: &[&str]) -> BrushRegistry {
	let mut registry = BrushRegistry::new();
	for name in names {
		registry
			.register_default::<NullBrush>(name, Default::default())
			.unwrap();
	}
	registry
}

pub fn sample(x: f32, y: f32, z: f32) -> Sample {
	let position = Vec3::new(x, y, z);
	Sample {
		position,
		orientation: Quat::IDENTITY,
		pointer_position: position,
		pressure: 1.0,
		timestamp: 0,
	}
}
