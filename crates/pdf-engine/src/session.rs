//! Viewer session
//!
//! Ties one loaded PDF page to an editing surface: the page is rasterized to a
//! canvas, drawables are recorded in canvas pixels, measurement labels follow
//! the current calibration, and the whole surface can be exported back into
//! the PDF or saved and restored as JSON.

use crate::backend::EngineError;
use crate::exporter::{ExportError, PdfExporter};
use crate::raster::{BlankRasterizer, RasterPage, Rasterizer};
use pdfmark_core::json::{self, JsonError};
use pdfmark_core::{
    CalibrationError, ChangeTracker, ColorError, Drawable, DrawableId, EditableSurface, ExportConfig,
    Measurements, Point, RgbColor, Surface, TransformError,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Render scale used when the host does not pick one
const DEFAULT_RENDER_SCALE: f64 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Cannot save PDF before PDF has been loaded")]
    NotLoaded,
    #[error("page numbers start at 1, got {0}")]
    InvalidPageNumber(usize),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error(transparent)]
    Json(#[from] JsonError),
}

pub type SessionResult<T> = Result<T, SessionError>;

struct LoadedFile {
    bytes: Vec<u8>,
    name: String,
    page: RasterPage,
}

pub struct Session {
    config: ExportConfig,
    page_number: usize,
    render_scale: f64,
    rasterizer: Box<dyn Rasterizer>,
    file: Option<LoadedFile>,
    surface: Surface,
    measurements: Measurements,
    tracker: Rc<RefCell<ChangeTracker>>,
}

impl Session {
    pub fn new(config: ExportConfig) -> SessionResult<Self> {
        let mut surface = Surface::new();
        let tracker = Rc::new(RefCell::new(ChangeTracker::new(&surface)?));
        surface.subscribe(tracker.clone());

        Ok(Self {
            config,
            page_number: 1,
            render_scale: DEFAULT_RENDER_SCALE,
            rasterizer: Box::new(BlankRasterizer::new()),
            file: None,
            surface,
            measurements: Measurements::new(),
            tracker,
        })
    }

    /// Show the given page, counting from 1
    pub fn with_page_number(mut self, page_number: usize) -> SessionResult<Self> {
        if page_number == 0 {
            return Err(SessionError::InvalidPageNumber(page_number));
        }
        self.page_number = page_number;
        Ok(self)
    }

    pub fn with_rasterizer(mut self, rasterizer: Box<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_render_scale(mut self, scale: f64) -> Self {
        self.render_scale = scale;
        self
    }

    /// Register the callback fired when [`Session::refresh_changed`] finds
    /// unsaved edits
    pub fn on_change(&mut self, callback: impl FnMut() + 'static) {
        self.tracker.borrow_mut().on_change(callback);
    }

    /// Load a PDF, dropping every drawable of the previous file
    ///
    /// `name` is kept for the host to save the exported PDF under.
    pub fn load_file(&mut self, bytes: Vec<u8>, name: impl Into<String>) -> SessionResult<()> {
        let page = self.rasterizer.render(&bytes, self.page_number - 1, self.render_scale)?;
        self.measurements.update_dimensions(page.page_width, page.page_height, page.canvas_width())?;

        self.surface.clear();
        self.tracker.borrow_mut().mark_saved(&self.surface)?;
        let name = name.into();
        log::debug!(
            "loaded {} page {} as {}x{} canvas",
            name,
            self.page_number,
            page.canvas.width(),
            page.canvas.height()
        );
        self.file = Some(LoadedFile { bytes, name, page });
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.file.is_some()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.name.as_str())
    }

    pub fn page(&self) -> Option<&RasterPage> {
        self.file.as_ref().map(|f| &f.page)
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// Canvas width in pixels, 0 before a file is loaded
    pub fn canvas_width(&self) -> f64 {
        self.page().map(RasterPage::canvas_width).unwrap_or(0.0)
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn measurements(&self) -> &Measurements {
        &self.measurements
    }

    /// Add a drawable, labelling rulers and areas with their measurement
    pub fn add(&mut self, mut drawable: Drawable) -> DrawableId {
        if let Some(label) = self.measurements.label_for(&drawable) {
            drawable.label = Some(label);
        }
        self.surface.add(drawable)
    }

    /// Edit a drawable in place and refresh its measurement label
    pub fn update(&mut self, id: DrawableId, edit: impl FnOnce(&mut Drawable)) -> bool {
        let measurements = &self.measurements;
        self.surface.update(id, |drawable| {
            edit(drawable);
            if let Some(label) = measurements.label_for(drawable) {
                drawable.label = Some(label);
            }
        })
    }

    pub fn remove(&mut self, id: DrawableId) -> Option<Drawable> {
        self.surface.remove(id)
    }

    /// Set the color of every drawable except the measurement shapes
    pub fn set_color(&mut self, color: &str) -> SessionResult<()> {
        RgbColor::from_hex(color)?;
        self.surface.set_color(color);
        Ok(())
    }

    /// Page-space length in points of a calibration line drawn on the canvas
    pub fn calibration_length(&self, start: Point, end: Point) -> f64 {
        self.measurements.calibration_length(&[start, end])
    }

    /// Calibrate against a line of `measured_length` points that is really
    /// `actual_length` long (e.g. `23ft` or `8m`), then relabel every ruler
    /// and area
    pub fn adjust_scale(&mut self, measured_length: f64, actual_length: &str) -> SessionResult<()> {
        self.measurements.adjust_scale(measured_length, actual_length)?;
        let measurements = &self.measurements;
        self.surface.relabel(|drawable| measurements.label_for(drawable));
        Ok(())
    }

    /// The loaded PDF with every drawable drawn on the session's page
    pub fn save_pdf(&mut self) -> SessionResult<Vec<u8>> {
        let file = self.file.as_ref().ok_or(SessionError::NotLoaded)?;
        let exporter = PdfExporter::new(&file.bytes, file.page.canvas_width(), self.config.clone())?;
        let bytes = exporter.export(&self.surface.drawables(), self.page_number - 1)?;

        self.tracker.borrow_mut().mark_saved(&self.surface)?;
        Ok(bytes)
    }

    pub fn to_json(&self) -> SessionResult<String> {
        Ok(json::encode(&self.surface.drawables())?)
    }

    /// Add every drawable saved in `json`, returning how many were restored
    ///
    /// Saved measurement labels are kept as written; only rulers and areas
    /// saved without one are labelled against the current calibration.
    pub fn import_json(&mut self, json: &str) -> SessionResult<usize> {
        let drawables = json::decode(json)?;
        let count = drawables.len();
        for drawable in drawables {
            if drawable.label.is_some() {
                self.surface.add(drawable);
            } else {
                self.add(drawable);
            }
        }
        Ok(count)
    }

    /// Compare the surface with the last saved state; fires the change
    /// callback at most once
    pub fn refresh_changed(&mut self) -> SessionResult<bool> {
        Ok(self.tracker.borrow_mut().recompute(&self.surface)?)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.tracker.borrow().has_changed()
    }
}
