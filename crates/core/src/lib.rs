//! PDF Markup Core Library
//!
//! Annotation geometry and rendering model for drawing markup over PDF pages:
//! canvas/page coordinate transform, cloud and arrow path generators, the
//! annotation model and classifier, measurements, the content-stream emitter,
//! JSON save/restore and change detection. Nothing here touches a PDF file;
//! see the `pdfmark-engine` crate for document assembly.

pub mod annotation;
pub mod change;
pub mod classify;
pub mod color;
pub mod config;
pub mod drawable;
pub mod emitter;
pub mod font;
pub mod json;
pub mod measurement;
pub mod paths;
pub mod point;
pub mod transform;

pub use annotation::{Annotation, ModelError};
pub use change::ChangeTracker;
pub use classify::{classify, classify_all, ClassifyError};
pub use color::{ColorError, RgbColor};
pub use config::{ConfigError, ExportConfig};
pub use drawable::{
    Drawable, DrawableId, EditableSurface, Geometry, Primitive, ShapeOptions, ShapeTag, Surface,
    SurfaceEvent, SurfaceListener,
};
pub use emitter::{
    ContentOp, EmitError, Emitter, FontAsset, LineCap, MarkerAsset, Operand, ResourceProvider,
    TextPlacement,
};
pub use font::{FontMetrics, Helvetica};
pub use json::JsonError;
pub use measurement::{Calibration, CalibrationError, LengthUnit, Measurements, UNCALIBRATED};
pub use paths::{Path, PathCommand, PathStrategy};
pub use point::{Affine, Point};
pub use transform::{to_page_coords, to_page_radius, PageTransform, TransformError};
