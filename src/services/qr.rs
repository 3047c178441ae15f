//! QR code rendering

use std::io::Cursor;

use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};

use crate::{
    config::QrConfig,
    error::{AppError, AppResult},
};

/// Largest rendered image, in pixels per side
const MAX_IMAGE_SIDE: u32 = 16_384;

#[derive(Clone)]
pub struct QrService {
    config: QrConfig,
}

impl QrService {
    pub fn new(config: QrConfig) -> Self {
        Self { config }
    }

    pub fn output_dir(&self) -> Option<&str> {
        self.config.output_dir.as_deref()
    }

    /// Encode text as a black-on-white PNG
    pub fn encode_png(&self, text: &str) -> AppResult<Vec<u8>> {
        let code = QrCode::new(text.as_bytes())
            .map_err(|e| AppError::Validation(format!("Cannot encode QR code: {}", e)))?;

        let modules = code.width() as u32;
        let colors = code.to_colors();
        let scale = self.config.box_size.max(1);
        let border = self.config.border;
        let side = border
            .checked_mul(2)
            .and_then(|quiet| quiet.checked_add(modules))
            .and_then(|width| width.checked_mul(scale))
            .filter(|side| *side <= MAX_IMAGE_SIDE)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "QR image too large (box_size {}, border {})",
                    scale, border
                ))
            })?;

        let image = GrayImage::from_fn(side, side, |x, y| {
            let (mx, my) = (x / scale, y / scale);
            let inside = (border..border + modules).contains(&mx)
                && (border..border + modules).contains(&my);
            if inside {
                let idx = ((my - border) * modules + (mx - border)) as usize;
                if colors[idx] == Color::Dark {
                    return Luma([0u8]);
                }
            }
            Luma([255u8])
        });

        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| AppError::Internal(format!("Failed to encode PNG: {}", e)))?;
        Ok(bytes)
    }
}
