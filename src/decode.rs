//! Декодирование контейнера изображения (JPEG/PNG/GIF/BMP) в `PixelGrid`.
//!
//! Заявленный клиентом формат — только подсказка: сначала пробуем его,
//! при неудаче определяем формат по содержимому.

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::core::PixelGrid;
use crate::error::DecodeError;

/// Разобрать байты изображения. Цветные картинки дают 3 канала, серые — 1;
/// альфа-канал отбрасывается.
pub fn decode(bytes: &[u8], declared_format: &str) -> Result<PixelGrid, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let img = match format_hint(declared_format) {
        Some(fmt) => match image::load_from_memory_with_format(bytes, fmt) {
            Ok(img) => img,
            Err(e) => {
                debug!(declared = %declared_format, error = %e, "declared format did not decode, sniffing content");
                image::load_from_memory(bytes)?
            }
        },
        None => image::load_from_memory(bytes)?,
    };

    into_grid(&img)
}

/// Тег формата вида "jpeg", "JPG", "image/png" → `ImageFormat`.
fn format_hint(declared: &str) -> Option<ImageFormat> {
    let tag = declared.trim();
    let tag = tag.rsplit('/').next().unwrap_or(tag);
    let tag = tag.trim_start_matches('.');
    if tag.is_empty() {
        return None;
    }
    ImageFormat::from_extension(tag.to_ascii_lowercase())
}

fn into_grid(img: &DynamicImage) -> Result<PixelGrid, DecodeError> {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return Err(DecodeError::ZeroSized { width: w, height: h });
    }

    let (width, height) = (w as usize, h as usize);
    let grid = if img.color().has_color() {
        PixelGrid::new(width, height, 3, img.to_rgb8().into_raw())
    } else {
        PixelGrid::from_luma(width, height, img.to_luma8().into_raw())
    };
    // буферы `image` всегда согласованы с размерами
    grid.ok_or(DecodeError::ZeroSized { width: w, height: h })
}
