use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use tracing::instrument;

use crate::error::Result;
use crate::geometry::{minimum_bounding_box, Point};
use crate::markup::Zone;
use crate::result::{ExtractedLines, LineImage};
use crate::rotate::{get_smaller_angle, rotate_rectangle_corners};
use crate::util::{center_of, offset_points, pad_page, part_image, point_extent};

#[instrument(skip(page, zones), level = "debug")]
pub(crate) fn extract_lines(page: &GrayImage, zones: &[Zone], padding: u32) -> ExtractedLines {
    let padded = pad_page(page, padding);
    let offset = (padding / 2) as f64;

    let mut lines = Vec::with_capacity(zones.len());
    let mut skipped = Vec::new();
    for zone in zones {
        match extract_zone(&padded, zone, offset) {
            Ok(image) => lines.push(LineImage {
                zone_id: zone.id.clone(),
                image,
            }),
            Err(err) => {
                log::warn!("Skipping zone {}: {err}", zone.id);
                skipped.push(zone.id.clone());
            }
        }
    }
    ExtractedLines { lines, skipped }
}

// Crop the corner extent, rotate only that sub-image, re-crop to the rotated
// corners' span. The whole page is never rotated.
#[instrument(skip(padded_page, zone), level = "trace")]
fn extract_zone(padded_page: &GrayImage, zone: &Zone, offset: f64) -> Result<GrayImage> {
    let points = offset_points(&zone.all_points(), offset);
    let bbox = minimum_bounding_box(&points)?;

    let (min_x, min_y, max_x, max_y) = point_extent(&bbox.corner_points);
    let initial = part_image(padded_page, min_x, min_y, max_x, max_y);

    let angle = get_smaller_angle(&bbox);
    let rotated = rotate_about_center(
        &initial,
        -(angle as f32),
        Interpolation::Bicubic,
        Luma([0u8]),
    );

    // The box corners, moved into the crop's frame and derotated about the
    // same center the raster rotation used, span the final crop.
    let local: [Point; 4] = bbox
        .corner_points
        .map(|(x, y)| (x - min_x as f64, y - min_y as f64));
    let aligned = rotate_rectangle_corners(&local, center_of(&initial), -angle);
    let (end_min_x, end_min_y, end_max_x, end_max_y) = point_extent(&aligned);
    Ok(part_image(&rotated, end_min_x, end_min_y, end_max_x, end_max_y))
}
