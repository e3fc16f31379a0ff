// texbatch/src/processors/filter.rs
use crate::core::{ConvertError, KernelShape, Result};
use crate::processors::backend::{KernelSpec, PixelBuffer};
use rayon::prelude::*;

const CHANNELS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Linear,
    Srgb,
}

impl ColorSpace {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "linear" | "lin_rec709" | "scene_linear" => Some(Self::Linear),
            "srgb" => Some(Self::Srgb),
            _ => None,
        }
    }
}

/// Normalized 1-D weights for a kernel of `width` pixels. Always odd length.
pub fn kernel_weights(shape: KernelShape, width: f32) -> Vec<f32> {
    let taps = (width.ceil() as usize).max(1) | 1;
    let radius = (taps / 2) as f32;
    let half_width = (width / 2.0).max(0.5);

    let mut weights: Vec<f32> = (0..taps)
        .map(|i| {
            let x = (i as f32 - radius) / half_width;
            match shape {
                KernelShape::Box => 1.0,
                KernelShape::Triangle => (1.0 - x.abs()).max(0.0),
                KernelShape::Gaussian => (-0.5 * (x * 3.0).powi(2)).exp(),
                KernelShape::BSpline => bspline(x * 2.0),
            }
        })
        .collect();

    let sum: f32 = weights.iter().sum();
    if sum > 0.0 {
        weights.iter_mut().for_each(|w| *w /= sum);
    } else {
        weights = vec![0.0; taps];
        weights[taps / 2] = 1.0;
    }
    weights
}

fn bspline(t: f32) -> f32 {
    let t = t.abs();
    if t < 1.0 {
        (4.0 - 6.0 * t * t + 3.0 * t * t * t) / 6.0
    } else if t < 2.0 {
        (2.0 - t).powi(3) / 6.0
    } else {
        0.0
    }
}

/// Separable convolution with independent horizontal and vertical widths.
pub fn convolve(image: &PixelBuffer, kernel: &KernelSpec) -> Result<PixelBuffer> {
    let shape = KernelShape::from_name(&kernel.name).ok_or_else(|| {
        ConvertError::InvalidParameter(format!("Unknown blur kernel: {}", kernel.name))
    })?;

    if kernel.width_x <= 0.0 || kernel.width_y <= 0.0 {
        return Err(ConvertError::InvalidParameter(format!(
            "Kernel widths must be positive, got {}x{}",
            kernel.width_x, kernel.width_y
        )));
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ConvertError::InvalidParameter("Cannot convolve an empty image".to_string()));
    }
    let (w, h) = (width as usize, height as usize);

    log::debug!(
        "Convolving {}x{} with {:?} kernel {}x{}",
        width,
        height,
        shape,
        kernel.width_x,
        kernel.width_y
    );

    let horizontal = kernel_weights(shape, kernel.width_x);
    let vertical = kernel_weights(shape, kernel.width_y);
    let src = image.as_raw();

    let mut pass = vec![0.0f32; src.len()];
    let radius = (horizontal.len() / 2) as isize;
    pass.par_chunks_mut(w * CHANNELS)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src[y * w * CHANNELS..(y + 1) * w * CHANNELS];
            for x in 0..w {
                let mut acc = [0.0f32; CHANNELS];
                for (k, weight) in horizontal.iter().enumerate() {
                    let sx = (x as isize + k as isize - radius).clamp(0, w as isize - 1) as usize;
                    for c in 0..CHANNELS {
                        acc[c] += weight * src_row[sx * CHANNELS + c];
                    }
                }
                row[x * CHANNELS..(x + 1) * CHANNELS].copy_from_slice(&acc);
            }
        });

    let mut out = vec![0.0f32; src.len()];
    let radius = (vertical.len() / 2) as isize;
    out.par_chunks_mut(w * CHANNELS)
        .enumerate()
        .for_each(|(y, row)| {
            for (k, weight) in vertical.iter().enumerate() {
                let sy = (y as isize + k as isize - radius).clamp(0, h as isize - 1) as usize;
                let src_row = &pass[sy * w * CHANNELS..(sy + 1) * w * CHANNELS];
                for (dst, value) in row.iter_mut().zip(src_row) {
                    *dst += weight * value;
                }
            }
        });

    PixelBuffer::from_raw(width, height, out).ok_or_else(|| {
        ConvertError::InvalidParameter("Convolution produced a mismatched buffer".to_string())
    })
}

/// Transfer-function conversion on RGB; alpha passes through.
pub fn color_convert(image: &PixelBuffer, from: &str, to: &str) -> Result<PixelBuffer> {
    let from_space = ColorSpace::from_name(from)
        .ok_or_else(|| ConvertError::InvalidParameter(format!("Unknown color space: {}", from)))?;
    let to_space = ColorSpace::from_name(to)
        .ok_or_else(|| ConvertError::InvalidParameter(format!("Unknown color space: {}", to)))?;

    let mut out = image.clone();
    if from_space == to_space {
        return Ok(out);
    }

    let transfer: fn(f32) -> f32 = match to_space {
        ColorSpace::Srgb => linear_to_srgb,
        ColorSpace::Linear => srgb_to_linear,
    };

    out.par_chunks_mut(CHANNELS).for_each(|pixel| {
        for value in pixel.iter_mut().take(3) {
            *value = transfer(*value);
        }
    });

    Ok(out)
}

fn linear_to_srgb(value: f32) -> f32 {
    if value <= 0.0031308 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}
