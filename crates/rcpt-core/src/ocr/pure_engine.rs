//! Local OCR engine using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::GenericImageView;
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::TextRecognizer;

/// Vertical band height (pixels) treated as one text row when ordering regions.
const ROW_HEIGHT: f64 = 20.0;

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct LocalOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    config: OcrConfig,
}

impl LocalOcrEngine {
    /// Create an engine from model files in a directory.
    pub fn from_dir(model_dir: &Path, config: OcrConfig) -> Result<Self, OcrError> {
        let det_path = model_dir.join("det.onnx");
        let rec_path = model_dir.join("latin_rec.onnx");
        let dict_path = model_dir.join("latin_dict.txt");

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self { engine, config })
    }
}

impl TextRecognizer for LocalOcrEngine {
    fn name(&self) -> &str {
        "pure-onnx-ocr"
    }

    fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let start = Instant::now();

        let image = image::load_from_memory(image)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;
        let (width, height) = image.dimensions();

        let results = self
            .engine
            .run_from_image(&image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let regions: Vec<(i64, f64, String)> = results
            .iter()
            .map(|r| {
                let (x, y) = top_left(&r.bounding_box);
                let text = if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                ((y / ROW_HEIGHT) as i64, x, text)
            })
            .collect();

        let text = join_regions(regions);

        info!(
            "OCR complete on {}x{} image in {}ms",
            width,
            height,
            start.elapsed().as_millis()
        );

        Ok(text)
    }
}

/// Lay out `(row, x, text)` regions in reading order: rows top to bottom,
/// regions within a row left to right and separated by a space.
fn join_regions(mut regions: Vec<(i64, f64, String)>) -> String {
    regions.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<(i64, String)> = Vec::new();
    for (row, _, text) in regions {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        match lines.last_mut() {
            Some((last_row, line)) if *last_row == row => {
                line.push(' ');
                line.push_str(text);
            }
            _ => lines.push((row, text.to_string())),
        }
    }

    lines
        .into_iter()
        .map(|(_, line)| line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Smallest x and y of a region polygon.
fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f64, f64) {
    polygon
        .exterior()
        .coords()
        .fold((f64::INFINITY, f64::INFINITY), |(x, y), c| {
            (x.min(c.x), y.min(c.y))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(row: i64, x: f64, text: &str) -> (i64, f64, String) {
        (row, x, text.to_string())
    }

    #[test]
    fn test_same_row_regions_share_a_line() {
        let text = join_regions(vec![
            region(0, 50.0, "$12.34"),
            region(0, 0.0, "Total:"),
            region(1, 0.0, "Thanks"),
        ]);
        assert_eq!(text, "Total: $12.34\nThanks");
    }

    #[test]
    fn test_rows_in_vertical_order() {
        let text = join_regions(vec![
            region(3, 0.0, "TOTAL 9.00"),
            region(0, 10.0, "CORNER CAFE"),
            region(1, 120.0, "4.50"),
            region(1, 5.0, "Latte"),
        ]);
        assert_eq!(text, "CORNER CAFE\nLatte 4.50\nTOTAL 9.00");
    }

    #[test]
    fn test_blank_regions_skipped() {
        assert_eq!(join_regions(vec![region(0, 0.0, "  "), region(0, 9.0, "Pen ")]), "Pen");
        assert_eq!(join_regions(Vec::new()), "");
    }
}
