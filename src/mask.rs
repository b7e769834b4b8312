use itertools::iproduct;
use ndarray::{s, Array2};
use tracing::instrument;

use crate::geometry::{minimum_bounding_box, BoundingBox, Point};
use crate::markup::Zone;
use crate::result::PageMask;
use crate::rotate::{get_smaller_angle, rotate_point, rotate_rectangle_corners};
use crate::util::{offset_points, point_extent, to_luma16_image};

// Fixed step between consecutive zone intensities, unique per zone on the
// 16-bit canvas.
pub(crate) const INTENSITY_STEP: u16 = 10;

#[instrument(skip(zones), level = "debug")]
pub(crate) fn compose_mask(width: u32, height: u32, zones: &[Zone], padding: u32) -> PageMask {
    let offset = padding / 2;
    let mut canvas = Array2::<u16>::zeros(((height + padding) as usize, (width + padding) as usize));

    let mut intensity = 0u16;
    let mut previous: Option<BoundingBox> = None;
    let mut zones_drawn = 0usize;
    let mut skipped = Vec::new();

    for zone in zones {
        // Skipped zones still consume a step so intensity stays a function
        // of the zone's annotation index.
        let previous_intensity = intensity;
        intensity += INTENSITY_STEP;

        let points = offset_points(&zone.all_points(), offset as f64);
        let bbox = match minimum_bounding_box(&points) {
            Ok(bbox) => bbox,
            Err(err) => {
                log::warn!("Skipping zone {} in mask: {err}", zone.id);
                skipped.push(zone.id.clone());
                previous = None;
                continue;
            }
        };

        let previous_narrower = previous
            .map(|prev| prev.narrow_dimension() < bbox.narrow_dimension())
            .unwrap_or(false);
        draw_zone(
            &mut canvas,
            &bbox,
            previous_narrower,
            previous_intensity,
            intensity,
        );
        zones_drawn += 1;
        previous = Some(bbox);
    }

    let (x0, y0) = (offset as usize, offset as usize);
    let image = to_luma16_image(
        canvas.slice(s![y0..y0 + height as usize, x0..x0 + width as usize]),
    );
    PageMask {
        image,
        zones_drawn,
        skipped,
    }
}

// Enumerates the zone's pixels in its derotated local frame and rotates each
// one back, so the painted footprint is the oriented rectangle itself.
fn draw_zone(
    canvas: &mut Array2<u16>,
    bbox: &BoundingBox,
    previous_narrower: bool,
    previous_intensity: u16,
    intensity: u16,
) {
    let (min_x, min_y, max_x, max_y) = point_extent(&bbox.corner_points);
    let center = ((max_x - min_x) as f64 / 2.0, (max_y - min_y) as f64 / 2.0);
    let angle = get_smaller_angle(bbox);

    let local: [Point; 4] = bbox
        .corner_points
        .map(|(x, y)| (x - min_x as f64, y - min_y as f64));
    let aligned = rotate_rectangle_corners(&local, center, -angle);
    let (a_min_x, a_min_y, a_max_x, a_max_y) = point_extent(&aligned);

    let (canvas_height, canvas_width) = canvas.dim();
    for (x, y) in iproduct!(a_min_x..a_max_x, a_min_y..a_max_y) {
        let restored = rotate_point((x as f64, y as f64), center, angle);
        let page_x = (restored.0 + min_x as f64) as i64;
        let page_y = (restored.1 + min_y as f64) as i64;
        if page_x < 0
            || page_y < 0
            || page_x >= canvas_width as i64
            || page_y >= canvas_height as i64
        {
            continue;
        }
        let pixel = &mut canvas[[page_y as usize, page_x as usize]];
        if previous_narrower && *pixel == previous_intensity {
            continue;
        }
        *pixel = intensity;
    }
}
