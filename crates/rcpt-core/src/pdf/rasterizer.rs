//! Page rasterizing for receipt PDFs.
//!
//! With the `pdfium` feature and a loadable Pdfium library, pages are rendered
//! in full, so vector-only pages (text drawn as glyphs) work too. Otherwise a
//! page is rendered by decoding its largest image XObject with lopdf and
//! resampling it to the page width at the requested DPI. Scanned receipts
//! carry each page as such an image.

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Document, Object, ObjectId};
#[cfg(feature = "pdfium")]
use pdfium_render::prelude::*;
#[cfg(feature = "pdfium")]
use tracing::warn;
use tracing::{debug, trace};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// Points per inch in PDF user space.
const POINTS_PER_INCH: f32 = 72.0;

/// US Letter width, used when a page has no readable MediaBox.
const DEFAULT_PAGE_WIDTH_PT: f32 = 612.0;

/// PDF page rasterizer backed by lopdf, and by Pdfium when available.
pub struct PdfRasterizer {
    document: Option<Document>,
    #[cfg_attr(not(feature = "pdfium"), allow(dead_code))]
    data: Vec<u8>,
    #[cfg_attr(not(feature = "pdfium"), allow(dead_code))]
    use_pdfium: bool,
}

impl PdfRasterizer {
    /// Create a rasterizer with no document loaded.
    pub fn new() -> Self {
        Self {
            document: None,
            data: Vec::new(),
            use_pdfium: true,
        }
    }

    /// Enable or disable Pdfium rendering. Without it only embedded page
    /// images can be rendered.
    pub fn with_pdfium(mut self, enabled: bool) -> Self {
        self.use_pdfium = enabled;
        self
    }

    /// Render a page from its largest embedded image.
    fn render_embedded_image(
        &self,
        doc: &Document,
        page_id: ObjectId,
        page: u32,
        dpi: u32,
    ) -> Result<DynamicImage> {
        let image = self
            .page_images(doc, page_id)
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or(PdfError::NoPageImage(page))?;

        let page_width_pt = page_width(doc, page_id).unwrap_or(DEFAULT_PAGE_WIDTH_PT);
        let target_width = (page_width_pt / POINTS_PER_INCH * dpi as f32).round() as u32;

        if target_width == 0 || image.width() == 0 {
            return Err(PdfError::Render {
                page,
                reason: format!("degenerate target width {} at {} DPI", target_width, dpi),
            });
        }

        if target_width == image.width() {
            return Ok(image);
        }

        let target_height = ((u64::from(image.height()) * u64::from(target_width))
            / u64::from(image.width()))
        .max(1) as u32;

        debug!(
            "Rendering page {} at {} DPI: {}x{} -> {}x{}",
            page,
            dpi,
            image.width(),
            image.height(),
            target_width,
            target_height
        );

        Ok(image.resize_exact(target_width, target_height, FilterType::Triangle))
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    fn page_id(&self, doc: &Document, page: u32) -> Result<ObjectId> {
        doc.get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Decode all image XObjects referenced by a page.
    fn page_images(&self, doc: &Document, page_id: ObjectId) -> Vec<DynamicImage> {
        let mut images = Vec::new();

        let Some(resources) = inherited_entry(doc, page_id, b"Resources") else {
            return images;
        };
        let Object::Dictionary(resources) = resources else {
            return images;
        };

        if let Ok(xobjects) = resources.get(b"XObject") {
            if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                for (name, obj_ref) in xobj_dict.iter() {
                    if let Ok((_, obj)) = doc.dereference(obj_ref) {
                        if let Some(img) = self.try_extract_image_from_object(doc, obj) {
                            trace!(
                                "Decoded XObject {} ({}x{})",
                                String::from_utf8_lossy(name),
                                img.width(),
                                img.height()
                            );
                            images.push(img);
                        }
                    }
                }
            }
        }

        images
    }

    fn try_extract_image_from_object(&self, doc: &Document, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

        trace!("Found image object: {}x{}", width, height);

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) if !arr.is_empty() => {
                    arr.first().and_then(|o| o.as_name().ok())
                }
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("Unsupported image filter {:?}", filter_name.map(String::from_utf8_lossy));
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .map_or(Some(8), |b| u8::try_from(b).ok())?;

        create_image_from_raw(&data, width, height, color_space, bits)
    }
}

impl Default for PdfRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfRasterizer {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        self.data = data.to_vec();
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        let doc = self.document()?;
        let page_id = self.page_id(doc, page)?;

        #[cfg(feature = "pdfium")]
        if self.use_pdfium {
            match bind_pdfium() {
                Some(pdfium) => match render_with_pdfium(&pdfium, &self.data, page, dpi) {
                    Ok(image) => return Ok(image),
                    Err(e) => warn!("Pdfium could not render page {}: {}", page, e),
                },
                None => debug!("Pdfium library not found, using embedded page images"),
            }
        }

        self.render_embedded_image(doc, page_id, page, dpi)
    }
}

/// Bind a fresh Pdfium instance, preferring a library shipped in `./lib`.
#[cfg(feature = "pdfium")]
fn bind_pdfium() -> Option<Pdfium> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./lib"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .ok()
}

/// Render a whole page, vector content included, at the requested DPI.
#[cfg(feature = "pdfium")]
fn render_with_pdfium(pdfium: &Pdfium, data: &[u8], page: u32, dpi: u32) -> Result<DynamicImage> {
    let render_error = |reason: String| PdfError::Render { page, reason };

    let document = pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(|e| render_error(e.to_string()))?;
    let index = page
        .checked_sub(1)
        .and_then(|i| u16::try_from(i).ok())
        .ok_or(PdfError::InvalidPage(page))?;
    let pdf_page = document
        .pages()
        .get(index)
        .map_err(|_| PdfError::InvalidPage(page))?;

    let target_width = (pdf_page.width().value / POINTS_PER_INCH * dpi as f32).round() as i32;
    if target_width <= 0 {
        return Err(render_error(format!(
            "degenerate target width {} at {} DPI",
            target_width, dpi
        )));
    }

    let config = PdfRenderConfig::new().set_target_width(target_width);
    let bitmap = pdf_page
        .render_with_config(&config)
        .map_err(|e| render_error(e.to_string()))?;

    let width = u32::try_from(bitmap.width()).map_err(|e| render_error(e.to_string()))?;
    let height = u32::try_from(bitmap.height()).map_err(|e| render_error(e.to_string()))?;

    // Pdfium bitmaps are BGRA.
    let mut pixels = bitmap.as_raw_bytes().to_vec();
    for pixel in pixels.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }

    debug!("Pdfium rendered page {} at {} DPI: {}x{}", page, dpi, width, height);

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| render_error(format!("bitmap size mismatch for {}x{}", width, height)))
}

/// Look up a page attribute, walking up the page tree for inherited values.
fn inherited_entry<'a>(doc: &'a Document, node_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(value) = dict.get(key) {
        if let Ok((_, resolved)) = doc.dereference(value) {
            return Some(resolved);
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => inherited_entry(doc, *parent_id, key),
        _ => None,
    }
}

fn page_width(doc: &Document, page_id: ObjectId) -> Option<f32> {
    let Object::Array(media_box) = inherited_entry(doc, page_id, b"MediaBox")? else {
        return None;
    };
    if media_box.len() != 4 {
        return None;
    }

    let coord = |i: usize| -> Option<f32> {
        let (_, obj) = doc.dereference(&media_box[i]).ok()?;
        obj.as_float().ok()
    };

    let width = (coord(2)? - coord(0)?).abs();
    (width > 0.0).then_some(width)
}

fn create_image_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: u8,
) -> Option<DynamicImage> {
    trace!(
        "Creating image from raw data: {}x{}, colorspace={:?}, bits={}",
        width,
        height,
        String::from_utf8_lossy(color_space),
        bits_per_component
    );

    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = (width as usize).checked_mul(height as usize)?;
    let components = match color_space {
        b"DeviceRGB" | b"RGB" => 3,
        b"DeviceGray" | b"G" => 1,
        _ => {
            trace!("Unsupported color space");
            return None;
        }
    };

    // Dimensions are untrusted; the data must cover them before anything is allocated.
    let needed = pixels.checked_mul(components)?;
    if data.len() < needed {
        trace!(
            "Could not decode image: data_len={}, needed={}",
            data.len(),
            needed
        );
        return None;
    }

    let mut rgba_data = Vec::with_capacity(pixels.checked_mul(4)?);
    for chunk in data[..needed].chunks_exact(components) {
        match *chunk {
            [r, g, b] => rgba_data.extend_from_slice(&[r, g, b, 255]),
            [gray] => rgba_data.extend_from_slice(&[gray, gray, gray, 255]),
            _ => return None,
        }
    }

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba_data).map(DynamicImage::ImageRgba8)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{dictionary, Dictionary, Stream};

    /// Build a one-page PDF, optionally carrying a 2x2 white RGB scan.
    pub(crate) fn sample_pdf(page_count: usize, with_image: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut xobjects = Dictionary::new();
        if with_image {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 2i64,
                    "Height" => 2i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8i64,
                },
                vec![255u8; 12],
            ));
            xobjects.set("Im0", image_id);
        }
        let resources_id = doc.add_object(dictionary! { "XObject" => xobjects });

        let kids: Vec<Object> = (0..page_count)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Resources" => resources_id,
                    "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(4), Object::Integer(4)],
                })
                .into()
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();
        data
    }

    #[test]
    fn test_rasterizer_new() {
        let rasterizer = PdfRasterizer::new();
        assert!(rasterizer.document.is_none());
        assert_eq!(rasterizer.page_count(), 0);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut rasterizer = PdfRasterizer::new();
        assert!(matches!(
            rasterizer.load(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_render_scales_to_dpi() {
        let mut rasterizer = PdfRasterizer::new().with_pdfium(false);
        rasterizer.load(&sample_pdf(2, true)).unwrap();
        assert_eq!(rasterizer.page_count(), 2);

        // 4pt wide page at 72 DPI is 4px, at 144 DPI 8px.
        let image = rasterizer.render_page(1, 72).unwrap();
        assert_eq!((image.width(), image.height()), (4, 4));

        let image = rasterizer.render_page(2, 144).unwrap();
        assert_eq!((image.width(), image.height()), (8, 8));
    }

    #[test]
    fn test_render_page_without_image() {
        let mut rasterizer = PdfRasterizer::new().with_pdfium(false);
        rasterizer.load(&sample_pdf(1, false)).unwrap();

        assert!(matches!(
            rasterizer.render_page(1, 300),
            Err(PdfError::NoPageImage(1))
        ));
    }

    #[test]
    fn test_render_invalid_page() {
        let mut rasterizer = PdfRasterizer::new();
        rasterizer.load(&sample_pdf(1, true)).unwrap();

        assert!(matches!(
            rasterizer.render_page(5, 300),
            Err(PdfError::InvalidPage(5))
        ));
    }

    #[test]
    fn test_gray_image_from_raw() {
        let image = create_image_from_raw(&[0, 128, 255, 64], 2, 2, b"DeviceGray", 8).unwrap();
        assert_eq!(image.to_rgba8().get_pixel(1, 0).0, [128, 128, 128, 255]);
    }

    #[test]
    fn test_raw_image_with_oversized_dimensions() {
        assert!(create_image_from_raw(&[0; 16], u32::MAX, u32::MAX, b"DeviceRGB", 8).is_none());
        assert!(create_image_from_raw(&[0; 16], 1 << 20, 1 << 20, b"DeviceGray", 8).is_none());
    }

    #[test]
    fn test_raw_image_short_data() {
        assert!(create_image_from_raw(&[0; 11], 2, 2, b"DeviceRGB", 8).is_none());
        assert!(create_image_from_raw(&[0; 12], 2, 2, b"CalRGB", 8).is_none());
    }

    #[test]
    fn test_negative_image_dimensions_are_skipped() {
        let doc = Document::with_version("1.5");
        let obj = Object::Stream(Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => -2i64,
                "Height" => 2i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
            },
            vec![255u8; 12],
        ));

        let rasterizer = PdfRasterizer::new();
        assert!(rasterizer.try_extract_image_from_object(&doc, &obj).is_none());
    }
}
