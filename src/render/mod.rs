// Skeleton overlay drawing on RGB24 frame buffers.
// Records with no detection leave the frame untouched.

use crate::constants::{CONNECTION_COLOR, JOINT_COLOR, JOINT_RADIUS};
use crate::landmarks::{LandmarkRecord, PoseLandmarks, SKELETON_CONNECTIONS};

/// Draw the fixed connection set and joint dots over the frame, in place.
/// Coordinates are denormalized against the frame dimensions; points outside
/// the frame are clipped pixel by pixel.
pub fn draw_skeleton(pixels: &mut [u8], width: u32, height: u32, record: &LandmarkRecord) {
    let landmarks = match record {
        LandmarkRecord::Absent => return,
        LandmarkRecord::Present(landmarks) => landmarks,
    };

    for (a, b) in SKELETON_CONNECTIONS {
        if let (Some(pa), Some(pb)) = (landmarks.get(a), landmarks.get(b)) {
            let (x0, y0) = to_pixel(pa.x, pa.y, width, height);
            let (x1, y1) = to_pixel(pb.x, pb.y, width, height);
            draw_segment(pixels, width, height, x0, y0, x1, y1, CONNECTION_COLOR);
        }
    }

    draw_joints(pixels, width, height, landmarks);
}

fn draw_joints(pixels: &mut [u8], width: u32, height: u32, landmarks: &PoseLandmarks) {
    for point in landmarks.iter().flatten() {
        let (cx, cy) = to_pixel(point.x, point.y, width, height);
        for dy in -JOINT_RADIUS..=JOINT_RADIUS {
            for dx in -JOINT_RADIUS..=JOINT_RADIUS {
                if dx * dx + dy * dy <= JOINT_RADIUS * JOINT_RADIUS {
                    set_pixel(pixels, width, height, cx + dx, cy + dy, JOINT_COLOR);
                }
            }
        }
    }
}

/// Denormalize a [0,1] coordinate pair to pixel space. Values are clamped
/// to one frame-size of margin so segment walks stay bounded even for
/// out-of-range coordinates.
fn to_pixel(x: f32, y: f32, width: u32, height: u32) -> (i64, i64) {
    let clamp = |v: f32, dim: u32| {
        let limit = dim as f32;
        (v * limit).clamp(-limit, 2.0 * limit) as i64
    };
    (clamp(x, width), clamp(y, height))
}

/// Bresenham line between two pixel positions
fn draw_segment(
    pixels: &mut [u8],
    width: u32,
    height: u32,
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
    color: [u8; 3],
) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        set_pixel(pixels, width, height, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn set_pixel(pixels: &mut [u8], width: u32, height: u32, x: i64, y: i64, color: [u8; 3]) {
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        return;
    }
    let offset = (y as usize * width as usize + x as usize) * 3;
    if offset + 3 <= pixels.len() {
        pixels[offset..offset + 3].copy_from_slice(&color);
    }
}
