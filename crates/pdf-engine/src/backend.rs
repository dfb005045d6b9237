use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use pdfmark_core::{ContentOp, Operand};
use std::fs;
use std::path::Path;

/// Parents searched for inherited page attributes before giving up
const MAX_INHERITANCE_DEPTH: usize = 32;

const LETTER: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: usize, page_count: usize },
    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f64,
    pub height_pt: f64,
}

/// Document-level object embedded once and bound to pages by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(u32, u16);

impl From<ObjectId> for AssetId {
    fn from((number, generation): ObjectId) -> Self {
        Self(number, generation)
    }
}

impl From<AssetId> for ObjectId {
    fn from(asset: AssetId) -> Self {
        (asset.0, asset.1)
    }
}

/// A PDF document that annotations can be drawn into
///
/// Page indices are zero-based. Resource names returned by the `bind_*` and
/// `add_opacity_state` calls are unique within the page's resource dictionary.
pub trait DocumentBackend {
    fn page_count(&self) -> usize;

    fn page_size(&self, page_index: usize) -> Result<PageSize, EngineError>;

    /// Embed a non-embedded standard Type1 font with WinAnsiEncoding
    fn embed_standard_font(&mut self, base_font: &str) -> Result<AssetId, EngineError>;

    /// Embed a PNG as an image XObject, keeping its alpha channel as a soft mask
    fn embed_png(&mut self, png: &[u8]) -> Result<AssetId, EngineError>;

    fn bind_font(&mut self, page_index: usize, font: AssetId) -> Result<String, EngineError>;

    fn bind_image(&mut self, page_index: usize, image: AssetId) -> Result<String, EngineError>;

    /// Register an `ExtGState` with fill alpha `alpha` on the page
    fn add_opacity_state(&mut self, page_index: usize, alpha: f64) -> Result<String, EngineError>;

    /// Append operators to the page, drawn on top of the existing content
    fn push_operators(&mut self, page_index: usize, ops: &[ContentOp]) -> Result<(), EngineError>;

    fn save(&mut self) -> Result<Vec<u8>, EngineError>;
}

/// [`DocumentBackend`] over an in-memory `lopdf` document
#[derive(Debug, Clone)]
pub struct LopdfBackend {
    doc: Document,
    pages: Vec<ObjectId>,
}

impl LopdfBackend {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(EngineError::EncryptedUnsupported);
        }

        let doc = Document::load_mem(bytes)?;
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(EngineError::Backend("document has no pages".to_owned()));
        }

        log::debug!("loaded PDF with {} page(s)", pages.len());
        Ok(Self { doc, pages })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::from_bytes(&fs::read(path)?)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn page_id(&self, page_index: usize) -> Result<ObjectId, EngineError> {
        self.pages
            .get(page_index)
            .copied()
            .ok_or(EngineError::PageOutOfRange { page: page_index, page_count: self.pages.len() })
    }

    /// Look up `key` on the page or the nearest ancestor in the page tree
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = Some(page_id);
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = self.doc.get_dictionary(current?).ok()?;
            if let Ok(value) = dict.get(key) {
                return self.resolve(value);
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        None
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    /// Edit one category (`Font`, `XObject`, `ExtGState`) of the page resources
    ///
    /// Shared or inherited resource dictionaries are copied onto the page
    /// first, so other pages never see the new entries.
    fn edit_resources<R>(
        &mut self,
        page_index: usize,
        category: &str,
        edit: impl FnOnce(&mut Dictionary) -> R,
    ) -> Result<R, EngineError> {
        let page_id = self.page_id(page_index)?;
        let mut resources = match self.inherited(page_id, b"Resources") {
            Some(Object::Dictionary(dict)) => dict.clone(),
            Some(_) => return Err(EngineError::Backend("page resources are not a dictionary".to_owned())),
            None => Dictionary::new(),
        };
        let mut entries = match resources.get(category.as_bytes()).ok().and_then(|obj| self.resolve(obj)) {
            Some(Object::Dictionary(dict)) => dict.clone(),
            Some(_) => return Err(EngineError::Backend(format!("/{category} resources are not a dictionary"))),
            None => Dictionary::new(),
        };

        let result = edit(&mut entries);
        resources.set(category, Object::Dictionary(entries));
        self.doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)?
            .set("Resources", Object::Dictionary(resources));
        Ok(result)
    }

    fn bind(&mut self, page_index: usize, category: &str, prefix: &str, id: ObjectId) -> Result<String, EngineError> {
        self.edit_resources(page_index, category, |entries| {
            let name = unused_name(entries, prefix);
            entries.set(name.as_str(), Object::Reference(id));
            name
        })
    }

    /// Prepend a `q` stream to the page content so our operators start from
    /// the default graphics state after a matching `Q`
    ///
    /// Returns false when the page has no content to isolate.
    fn isolate_existing_content(&mut self, page_id: ObjectId) -> Result<bool, EngineError> {
        let existing = match self.doc.get_dictionary(page_id)?.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(streams)) => streams.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(streams)) => streams.clone(),
            _ => return Ok(false),
        };
        if existing.is_empty() {
            return Ok(false);
        }

        let save_id = self.doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let mut contents = Vec::with_capacity(existing.len() + 1);
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        self.doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)?
            .set("Contents", Object::Array(contents));
        Ok(true)
    }
}

impl DocumentBackend for LopdfBackend {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page_index: usize) -> Result<PageSize, EngineError> {
        let page_id = self.page_id(page_index)?;
        let size = self
            .inherited(page_id, b"MediaBox")
            .and_then(|obj| obj.as_array().ok())
            .and_then(|array| {
                if array.len() != 4 {
                    return None;
                }
                let x0 = array[0].as_float().ok()?;
                let y0 = array[1].as_float().ok()?;
                let x1 = array[2].as_float().ok()?;
                let y1 = array[3].as_float().ok()?;
                Some(PageSize {
                    width_pt: f64::from((x1 - x0).abs()),
                    height_pt: f64::from((y1 - y0).abs()),
                })
            })
            .unwrap_or(LETTER);

        Ok(size)
    }

    fn embed_standard_font(&mut self, base_font: &str) -> Result<AssetId, EngineError> {
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
            "Encoding" => "WinAnsiEncoding",
        });
        log::debug!("embedded standard font {} as object {:?}", base_font, id);
        Ok(id.into())
    }

    fn embed_png(&mut self, png: &[u8]) -> Result<AssetId, EngineError> {
        let img = image::load_from_memory_with_format(png, image::ImageFormat::Png)?.to_rgba8();
        let (width, height) = img.dimensions();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for pixel in img.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel[3]);
        }

        let smask_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        ));
        let image_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "SMask" => smask_id,
            },
            rgb,
        ));

        log::debug!("embedded {}x{} image as object {:?}", width, height, image_id);
        Ok(image_id.into())
    }

    fn bind_font(&mut self, page_index: usize, font: AssetId) -> Result<String, EngineError> {
        self.bind(page_index, "Font", "F", font.into())
    }

    fn bind_image(&mut self, page_index: usize, image: AssetId) -> Result<String, EngineError> {
        self.bind(page_index, "XObject", "Im", image.into())
    }

    fn add_opacity_state(&mut self, page_index: usize, alpha: f64) -> Result<String, EngineError> {
        let id = self.doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => Object::Real(alpha as f32),
        });
        let name = self.bind(page_index, "ExtGState", "GS", id)?;
        log::debug!("registered opacity state {} (ca={}) on page {}", name, alpha, page_index);
        Ok(name)
    }

    fn push_operators(&mut self, page_index: usize, ops: &[ContentOp]) -> Result<(), EngineError> {
        if ops.is_empty() {
            return Ok(());
        }
        let page_id = self.page_id(page_index)?;

        // Streams are concatenated on rendering and the existing one may not
        // end in whitespace, so ours starts on a fresh line
        let mut bytes = if self.isolate_existing_content(page_id)? { b"\nQ\n".to_vec() } else { b"\n".to_vec() };
        let operations: Vec<_> = ops.iter().map(to_operation).collect();
        bytes.extend(Content { operations }.encode()?);
        self.doc.add_page_contents(page_id, bytes)?;
        Ok(())
    }

    fn save(&mut self) -> Result<Vec<u8>, EngineError> {
        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

fn unused_name(entries: &Dictionary, prefix: &str) -> String {
    let mut n = 1usize;
    loop {
        let name = format!("{prefix}{n}");
        if !entries.has(name.as_bytes()) {
            return name;
        }
        n += 1;
    }
}

fn to_operation(op: &ContentOp) -> Operation {
    Operation::new(op.operator(), op.operands().into_iter().map(to_object).collect())
}

fn to_object(operand: Operand) -> Object {
    match operand {
        Operand::Number(value) => Object::Real(value as f32),
        Operand::Integer(value) => Object::Integer(value),
        Operand::Name(name) => Object::Name(name.into_bytes()),
        Operand::Bytes(bytes) => Object::String(bytes, StringFormat::Literal),
    }
}
