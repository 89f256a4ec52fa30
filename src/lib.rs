//! Recording, replaying and persisting freehand 3D paint strokes.
//!
//! A [`Drawing`] owns strokes made with brush kinds from a [`BrushRegistry`]. Points pass through
//! a capture filter before they reach a stroke, and drawings are saved in a compact little-endian
//! binary format (see [`codec`]). Drawings from the older JSON format can be imported with
//! [`legacy`].

pub mod brush;
pub mod brushes;
pub mod codec;
pub mod config;
pub mod drawing;
pub mod filter;
pub mod legacy;
pub mod orientation;
pub mod random;
pub mod stroke;

pub use brush::{Brush, BrushId, BrushOptions, BrushRegistry, PartialBrushOptions, Sample};
pub use codec::{DecodeError, DecodeWarning};
pub use config::{ImportOptions, PainterConfig};
pub use drawing::{Drawing, DrawingError, DrawingObserver, LoadReport};
pub use stroke::{Point, Stroke};

#[cfg(test)]
pub mod test;
