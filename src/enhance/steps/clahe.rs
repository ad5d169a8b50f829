use crate::color::LabImage;
use crate::error::RestoreError;
use image::{GrayImage, Luma, RgbImage};

/// Histogram clip limit, relative to a flat histogram
const CLIP_LIMIT: f32 = 2.0;
/// Tiles per axis
const TILE_GRID: (u32, u32) = (8, 8);

const BINS: usize = 256;

/// Contrast-limited adaptive histogram equalization of the Lab lightness plane
/// Chroma planes are left untouched
pub fn apply(image: RgbImage) -> Result<RgbImage, RestoreError> {
    let mut lab = LabImage::from_rgb(&image);
    let lightness = equalize(&lab.lightness()?, CLIP_LIMIT, TILE_GRID);
    lab.set_lightness(lightness)?;
    Ok(lab.to_rgb())
}

/// Tile-based equalization with bilinear blending between tile lookup tables
pub fn equalize(img: &GrayImage, clip_limit: f32, grid: (u32, u32)) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let tiles_x = grid.0.clamp(1, width);
    let tiles_y = grid.1.clamp(1, height);

    // Tile boundaries: tile t spans [bounds[t], bounds[t + 1])
    let bounds_x: Vec<u32> = (0..=tiles_x).map(|t| t * width / tiles_x).collect();
    let bounds_y: Vec<u32> = (0..=tiles_y).map(|t| t * height / tiles_y).collect();

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y as usize {
        for tx in 0..tiles_x as usize {
            luts.push(tile_lut(
                img,
                (bounds_x[tx], bounds_x[tx + 1]),
                (bounds_y[ty], bounds_y[ty + 1]),
                clip_limit,
            ));
        }
    }

    let tile_w = width as f32 / tiles_x as f32;
    let tile_h = height as f32 / tiles_y as f32;

    GrayImage::from_fn(width, height, |x, y| {
        let value = img.get_pixel(x, y).0[0] as usize;

        let (tx0, tx1, wx) = neighbours(x, tile_w, tiles_x);
        let (ty0, ty1, wy) = neighbours(y, tile_h, tiles_y);
        let lut = |tx: usize, ty: usize| luts[ty * tiles_x as usize + tx][value] as f32;

        let top = lut(tx0, ty0) * (1.0 - wx) + lut(tx1, ty0) * wx;
        let bottom = lut(tx0, ty1) * (1.0 - wx) + lut(tx1, ty1) * wx;
        let v = top * (1.0 - wy) + bottom * wy;

        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// The two tiles whose centers surround `pos`, and the weight of the second
fn neighbours(pos: u32, tile_size: f32, tiles: u32) -> (usize, usize, f32) {
    let f = (pos as f32 + 0.5) / tile_size - 0.5;
    let last = tiles as isize - 1;
    let t0 = (f.floor() as isize).clamp(0, last);
    let t1 = (t0 + 1).min(last);
    let weight = if t1 == t0 {
        0.0
    } else {
        (f - t0 as f32).clamp(0.0, 1.0)
    };
    (t0 as usize, t1 as usize, weight)
}

fn tile_lut(img: &GrayImage, xs: (u32, u32), ys: (u32, u32), clip_limit: f32) -> [u8; BINS] {
    let mut hist = [0u32; BINS];
    for y in ys.0..ys.1 {
        for x in xs.0..xs.1 {
            hist[img.get_pixel(x, y).0[0] as usize] += 1;
        }
    }

    let area = (xs.1 - xs.0) * (ys.1 - ys.0);
    clip_histogram(&mut hist, clip_limit, area);

    let scale = 255.0 / area.max(1) as f32;
    let mut lut = [0u8; BINS];
    let mut cumulative = 0u32;
    for (bin, count) in hist.iter().enumerate() {
        cumulative += count;
        lut[bin] = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Clip bins above the limit and spread the excess evenly over all bins
fn clip_histogram(hist: &mut [u32; BINS], clip_limit: f32, area: u32) {
    if clip_limit <= 0.0 {
        return;
    }
    let limit = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);

    let mut excess = 0u32;
    for count in hist.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }

    let batch = excess / BINS as u32;
    let residual = excess % BINS as u32;
    for count in hist.iter_mut() {
        *count += batch;
    }
    if residual > 0 {
        let step = (BINS as u32 / residual).max(1) as usize;
        for count in hist.iter_mut().step_by(step).take(residual as usize) {
            *count += 1;
        }
    }
}
