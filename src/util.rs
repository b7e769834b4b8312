use float_ord::FloatOrd;
use image::{imageops, GrayImage, ImageBuffer, Luma};

use crate::result::Gray16Image;
use ndarray::{ArrayView2, Axis};
use tracing::instrument;

use crate::geometry::Point;

#[instrument(level = "debug", skip(image))]
pub(crate) fn pad_page(image: &GrayImage, padding: u32) -> GrayImage {
    if padding == 0 {
        return image.clone();
    }
    let offset = padding / 2;
    let mut padded = ImageBuffer::from_pixel(
        image.width() + padding,
        image.height() + padding,
        Luma([255u8]),
    );
    imageops::replace(&mut padded, image, offset as i64, offset as i64);
    log::debug!(
        "Padded page from (w: {}, h: {}) to (w: {}, h: {}).",
        image.width(),
        image.height(),
        padded.width(),
        padded.height()
    );
    padded
}

pub(crate) fn offset_points(points: &[Point], offset: f64) -> Vec<Point> {
    points
        .iter()
        .map(|&(x, y)| (x + offset, y + offset))
        .collect()
}

// Integer axis-aligned extent of a point list, fractions truncated.
pub(crate) fn point_extent(points: &[Point]) -> (i64, i64, i64, i64) {
    let min_x = points.iter().map(|p| FloatOrd(p.0)).min().unwrap().0 as i64;
    let max_x = points.iter().map(|p| FloatOrd(p.0)).max().unwrap().0 as i64;
    let min_y = points.iter().map(|p| FloatOrd(p.1)).min().unwrap().0 as i64;
    let max_y = points.iter().map(|p| FloatOrd(p.1)).max().unwrap().0 as i64;
    (min_x, min_y, max_x, max_y)
}

pub(crate) fn part_image(
    image: &GrayImage,
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
) -> GrayImage {
    let x = min_x.clamp(0, image.width() as i64) as u32;
    let y = min_y.clamp(0, image.height() as i64) as u32;
    let width = (max_x.clamp(0, image.width() as i64) - x as i64).max(0) as u32;
    let height = (max_y.clamp(0, image.height() as i64) - y as i64).max(0) as u32;
    log::trace!("Slicing subimage to ({x}, {y}) size (w: {width}, h: {height})");
    imageops::crop_imm(image, x, y, width, height).to_image()
}

// Same center imageproc uses in rotate_about_center.
pub(crate) fn center_of(image: &GrayImage) -> Point {
    (image.width() as f64 / 2.0, image.height() as f64 / 2.0)
}

pub(crate) fn to_luma16_image(data: ArrayView2<u16>) -> Gray16Image {
    let height = data.len_of(Axis(0));
    let width = data.len_of(Axis(1));
    let pixel_data = data
        .axis_iter(Axis(0))
        .flat_map(|row| row.into_iter().copied())
        .collect::<Vec<u16>>();
    ImageBuffer::from_raw(width as u32, height as u32, pixel_data).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn pad_page_offsets_content_and_fills_white() {
        let mut page = GrayImage::from_pixel(4, 3, Luma([0u8]));
        page.put_pixel(0, 0, Luma([77u8]));

        let padded = pad_page(&page, 10);
        assert_eq!(padded.dimensions(), (14, 13));
        assert_eq!(padded.get_pixel(0, 0)[0], 255);
        assert_eq!(padded.get_pixel(5, 5)[0], 77);
        assert_eq!(padded.get_pixel(6, 5)[0], 0);
    }

    #[test]
    fn pad_page_zero_is_identity() {
        let page = GrayImage::from_pixel(4, 3, Luma([9u8]));
        assert_eq!(pad_page(&page, 0).dimensions(), (4, 3));
    }

    #[test]
    fn point_extent_truncates() {
        let (min_x, min_y, max_x, max_y) = point_extent(&[(1.9, 2.2), (10.7, 8.9), (3.0, 0.4)]);
        assert_eq!((min_x, min_y, max_x, max_y), (1, 0, 10, 8));
    }

    #[test]
    fn part_image_clamps_to_bounds() {
        let page = GrayImage::from_pixel(10, 10, Luma([5u8]));
        let crop = part_image(&page, -3, 4, 8, 25);
        assert_eq!(crop.dimensions(), (8, 6));
    }

    #[test]
    fn luma16_round_trip() {
        let data = Array2::from_shape_fn((2, 3), |(y, x)| (y * 3 + x) as u16 * 10);
        let image = to_luma16_image(data.view());
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1)[0], 50);
    }
}
