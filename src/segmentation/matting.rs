use image::{GrayImage, Luma};
use imageproc::{distance_transform::Norm, filter::box_filter, morphology::erode};

const TRIMAP_FOREGROUND: u8 = 255;
const TRIMAP_BACKGROUND: u8 = 0;
const TRIMAP_UNKNOWN: u8 = 128;

fn threshold(mask: &GrayImage, keep: impl Fn(u8) -> bool) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if keep(mask.get_pixel(x, y)[0]) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// `erode_size` is the side of a square structuring element, so the erosion
/// radius is half of it. Radii above 255 are clamped.
fn shrink(region: &GrayImage, erode_size: u32) -> GrayImage {
    let radius = erode_size / 2;
    if radius == 0 {
        return region.clone();
    }
    let k = u8::try_from(radius).unwrap_or(u8::MAX);
    erode(region, Norm::LInf, k)
}

/// Split a soft mask into certain foreground, certain background and an
/// unknown band between them.
///
/// Values at or above `foreground_threshold` are certain foreground, values
/// at or below `background_threshold` certain background. Both regions are
/// eroded by `erode_size` so the unknown band widens around object edges.
pub fn build_trimap(
    mask: &GrayImage,
    foreground_threshold: u8,
    background_threshold: u8,
    erode_size: u32,
) -> GrayImage {
    let foreground = shrink(&threshold(mask, |v| v >= foreground_threshold), erode_size);
    let background = shrink(&threshold(mask, |v| v <= background_threshold), erode_size);

    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if foreground.get_pixel(x, y)[0] == 255 {
            Luma([TRIMAP_FOREGROUND])
        } else if background.get_pixel(x, y)[0] == 255 {
            Luma([TRIMAP_BACKGROUND])
        } else {
            Luma([TRIMAP_UNKNOWN])
        }
    })
}

/// Produce a refined alpha channel: known trimap regions are hard 0/255 and
/// the unknown band takes a box-filtered version of the raw mask.
pub fn refine_alpha(mask: &GrayImage, trimap: &GrayImage, erode_size: u32) -> GrayImage {
    let radius = (erode_size / 2).max(1);
    let smoothed = box_filter(mask, radius, radius);

    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        match trimap.get_pixel(x, y)[0] {
            TRIMAP_FOREGROUND => Luma([255]),
            TRIMAP_BACKGROUND => Luma([0]),
            _ => *smoothed.get_pixel(x, y),
        }
    })
}
