use crate::color::LabImage;
use crate::error::RestoreError;
use image::RgbImage;

/// Filter strength for the lightness plane
const LUMINANCE_STRENGTH: f32 = 10.0;
/// Filter strength for the two chroma planes
const COLOR_STRENGTH: f32 = 10.0;
/// Patch size compared between pixels
const TEMPLATE_WINDOW: usize = 7;
/// Neighborhood searched for similar patches
const SEARCH_WINDOW: usize = 21;

/// Non-local-means color denoising
///
/// Works in Lab space: lightness and chroma are filtered separately so
/// color noise can be smoothed without bleeding luminance detail.
pub fn apply(image: RgbImage) -> Result<RgbImage, RestoreError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Ok(image);
    }

    let mut lab = LabImage::from_rgb(&image);
    let (w, h) = (width as usize, height as usize);

    let l = to_plane(&lab.l);
    let denoised = nl_means(&[l], w, h, LUMINANCE_STRENGTH, TEMPLATE_WINDOW, SEARCH_WINDOW);
    lab.l = from_plane(&denoised[0]);

    let a = to_plane(&lab.a);
    let b = to_plane(&lab.b);
    let denoised = nl_means(&[a, b], w, h, COLOR_STRENGTH, TEMPLATE_WINDOW, SEARCH_WINDOW);
    lab.a = from_plane(&denoised[0]);
    lab.b = from_plane(&denoised[1]);

    Ok(lab.to_rgb())
}

fn to_plane(channel: &[u8]) -> Vec<f32> {
    channel.iter().map(|&v| v as f32).collect()
}

fn from_plane(plane: &[f32]) -> Vec<u8> {
    plane
        .iter()
        .map(|&v| v.round().clamp(0.0, 255.0) as u8)
        .collect()
}

/// Non-local means over planar channels that share patch weights
///
/// For every search offset, the squared difference between the image and
/// its shifted copy is box-summed with an integral image, giving all patch
/// distances for that offset in one pass.
fn nl_means(
    planes: &[Vec<f32>],
    width: usize,
    height: usize,
    strength: f32,
    template: usize,
    search: usize,
) -> Vec<Vec<f32>> {
    let len = width * height;
    let tr = (template / 2) as isize;
    let sr = (search / 2) as isize;
    let inv_h2 = 1.0 / (strength * strength).max(f32::EPSILON);
    let channels = planes.len() as f32;

    let mut weight_sum = vec![0.0f32; len];
    let mut accum = vec![vec![0.0f32; len]; planes.len()];
    let mut diff = vec![0.0f64; len];
    let mut integral = vec![0.0f64; (width + 1) * (height + 1)];

    let clamp_x = |x: isize| x.clamp(0, width as isize - 1) as usize;
    let clamp_y = |y: isize| y.clamp(0, height as isize - 1) as usize;

    for dy in -sr..=sr {
        for dx in -sr..=sr {
            // Squared difference between each pixel and its shifted partner
            for y in 0..height {
                let sy = clamp_y(y as isize + dy);
                for x in 0..width {
                    let sx = clamp_x(x as isize + dx);
                    let (i, j) = (y * width + x, sy * width + sx);
                    diff[i] = planes
                        .iter()
                        .map(|p| {
                            let d = (p[i] - p[j]) as f64;
                            d * d
                        })
                        .sum();
                }
            }

            build_integral(&diff, width, height, &mut integral);

            for y in 0..height {
                let y0 = (y as isize - tr).max(0) as usize;
                let y1 = ((y as isize + tr) as usize).min(height - 1) + 1;
                let sy = clamp_y(y as isize + dy);
                for x in 0..width {
                    let x0 = (x as isize - tr).max(0) as usize;
                    let x1 = ((x as isize + tr) as usize).min(width - 1) + 1;

                    let area = ((x1 - x0) * (y1 - y0)) as f32;
                    let sum = box_sum(&integral, width, x0, y0, x1, y1) as f32;
                    let distance = sum / (area * channels);
                    let weight = (-distance * inv_h2).exp();

                    let i = y * width + x;
                    let j = sy * width + clamp_x(x as isize + dx);
                    weight_sum[i] += weight;
                    for (acc, plane) in accum.iter_mut().zip(planes) {
                        acc[i] += weight * plane[j];
                    }
                }
            }
        }
    }

    accum
        .into_iter()
        .map(|acc| {
            acc.iter()
                .zip(&weight_sum)
                .map(|(&v, &w)| if w > 0.0 { v / w } else { v })
                .collect()
        })
        .collect()
}

fn build_integral(values: &[f64], width: usize, height: usize, integral: &mut [f64]) {
    let stride = width + 1;
    integral[..stride].fill(0.0);
    for y in 0..height {
        let mut row_sum = 0.0;
        integral[(y + 1) * stride] = 0.0;
        for x in 0..width {
            row_sum += values[y * width + x];
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }
}

fn box_sum(integral: &[f64], width: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
    let stride = width + 1;
    integral[y1 * stride + x1] - integral[y0 * stride + x1] - integral[y1 * stride + x0]
        + integral[y0 * stride + x0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn variance(values: &[f32]) -> f32 {
        let mean = values.iter().sum::<f32>() / values.len() as f32;
        values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32
    }

    #[test]
    fn test_nl_means_reduces_noise_on_flat_plane() {
        let (w, h) = (24, 24);
        // Deterministic pseudo-random noise in -6..=6 around 100
        let mut seed = 12345u32;
        let plane: Vec<f32> = (0..w * h)
            .map(|_| {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
                100.0 + ((seed >> 16) % 13) as f32 - 6.0
            })
            .collect();

        let out = nl_means(&[plane.clone()], w, h, 10.0, 7, 21);
        assert!(variance(&out[0]) < variance(&plane) / 4.0);
    }

    #[test]
    fn test_nl_means_keeps_strong_edges() {
        let (w, h) = (20, 10);
        let plane: Vec<f32> = (0..w * h)
            .map(|i| if i % w < 10 { 30.0 } else { 220.0 })
            .collect();

        let out = nl_means(&[plane], w, h, 10.0, 7, 21);
        assert!(out[0][5 * w + 2] < 40.0);
        assert!(out[0][5 * w + 17] > 210.0);
    }

    #[test]
    fn test_box_sum_matches_direct_sum() {
        let (w, h) = (5, 4);
        let values: Vec<f64> = (0..w * h).map(|i| i as f64).collect();
        let mut integral = vec![0.0; (w + 1) * (h + 1)];
        build_integral(&values, w, h, &mut integral);

        let direct: f64 = (1..3)
            .flat_map(|y| (2..5).map(move |x| (y * w + x) as f64))
            .sum();
        assert_eq!(box_sum(&integral, w, 2, 1, 5, 3), direct);
    }

    #[test]
    fn test_denoise_preserves_dimensions() {
        let img = RgbImage::from_fn(17, 9, |x, y| Rgb([(x * 13) as u8, (y * 20) as u8, 64]));
        let result = apply(img).unwrap();
        assert_eq!(result.dimensions(), (17, 9));
    }
}
