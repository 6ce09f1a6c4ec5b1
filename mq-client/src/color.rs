use bevy::prelude::Color;
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Side of the square grid a photo is reduced to before averaging.
pub const SAMPLE_GRID: u32 = 50;
/// Pixels at or below this alpha are padding, not garment.
pub const ALPHA_THRESHOLD: u8 = 128;

/// Representative color of a garment photo, channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DominantColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl DominantColor {
    pub const FALLBACK: Self = Self {
        r: 0.5,
        g: 0.5,
        b: 0.5,
    };
}

impl From<DominantColor> for Color {
    fn from(value: DominantColor) -> Self {
        Color::srgb(value.r, value.g, value.b)
    }
}

/// Mean color of the opaque-enough pixels of `photo`, sampled on a
/// 50x50 grid. Falls back to mid gray when nothing qualifies.
pub fn dominant_color(photo: &RgbaImage) -> DominantColor {
    if photo.width() == 0 || photo.height() == 0 {
        return DominantColor::FALLBACK;
    }

    let grid = imageops::resize(photo, SAMPLE_GRID, SAMPLE_GRID, FilterType::Triangle);

    let (mut r, mut g, mut b, mut count) = (0u64, 0u64, 0u64, 0u64);
    for pixel in grid.pixels() {
        let [pr, pg, pb, pa] = pixel.0;
        if pa > ALPHA_THRESHOLD {
            r += pr as u64;
            g += pg as u64;
            b += pb as u64;
            count += 1;
        }
    }

    if count == 0 {
        return DominantColor::FALLBACK;
    }

    let channel = |sum: u64| (sum as f64 / count as f64).round() as f32 / 255.0;
    DominantColor {
        r: channel(r),
        g: channel(g),
        b: channel(b),
    }
}
