//! Sensor model: quadrant cameras, proximity rays, ground detector.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, FRAC_PI_8, PI, TAU};

use super::world::{Pad, Robot};
use super::{CAMERA_RANGE, PROXIMITY_RANGE, ROBOT_RADIUS};

/// Pose snapshot of one robot, taken before the think phase so every
/// robot senses the same pre-tick world.
#[derive(Clone, Copy)]
pub(crate) struct RobotView {
    pub x: f32,
    pub y: f32,
    /// Whether any signalling LED is lit.
    pub lit: bool,
}

/// Fills `robot.sensors` in the reference layout: cameras 0..4,
/// proximity 4..12, ground 12.
pub(crate) fn sense(
    robot: &mut Robot,
    index: usize,
    views: &[RobotView],
    pads: &[Pad; 2],
    half_width: f32,
    half_height: f32,
) {
    let (x, y, theta) = (robot.x, robot.y, robot.theta);

    for camera in 0..4 {
        let dir = theta + camera as f32 * FRAC_PI_2;
        let mut intensity: f32 = 0.0;

        for pad in pads {
            intensity = intensity.max(target_intensity(x, y, dir, pad.x, pad.y, CAMERA_RANGE));
        }
        for (j, view) in views.iter().enumerate() {
            if j == index || !view.lit {
                continue;
            }
            intensity = intensity.max(target_intensity(x, y, dir, view.x, view.y, CAMERA_RANGE));
        }
        robot.sensors[camera] = intensity;
    }

    for ray in 0..8 {
        let dir = theta + ray as f32 * FRAC_PI_4;
        let mut distance = ray_to_walls(x, y, dir, half_width, half_height) - ROBOT_RADIUS;

        for (j, view) in views.iter().enumerate() {
            if j == index {
                continue;
            }
            let (dx, dy) = (view.x - x, view.y - y);
            let dist = (dx * dx + dy * dy).sqrt();
            if dist - 2.0 * ROBOT_RADIUS >= distance {
                continue;
            }
            if angle_delta(dy.atan2(dx), dir).abs() <= FRAC_PI_8 {
                distance = dist - 2.0 * ROBOT_RADIUS;
            }
        }
        robot.sensors[4 + ray] = (1.0 - distance / PROXIMITY_RANGE).clamp(0.0, 1.0);
    }

    robot.sensors[12] = if pads.iter().any(|p| p.contains(x, y)) {
        1.0
    } else {
        0.0
    };
}

/// Range-attenuated visibility of a point target inside a 90 degree
/// sector centred on `dir`.
fn target_intensity(x: f32, y: f32, dir: f32, tx: f32, ty: f32, range: f32) -> f32 {
    let (dx, dy) = (tx - x, ty - y);
    let dist = (dx * dx + dy * dy).sqrt();
    if dist < 1e-6 || dist > range {
        return 0.0;
    }
    if angle_delta(dy.atan2(dx), dir).abs() > FRAC_PI_4 {
        return 0.0;
    }
    1.0 - dist / range
}

/// Distance from `(x, y)` along `dir` to the nearest arena wall.
fn ray_to_walls(x: f32, y: f32, dir: f32, half_width: f32, half_height: f32) -> f32 {
    let (c, s) = (dir.cos(), dir.sin());
    let mut distance = f32::INFINITY;
    if c > 1e-6 {
        distance = distance.min((half_width - x) / c);
    } else if c < -1e-6 {
        distance = distance.min((-half_width - x) / c);
    }
    if s > 1e-6 {
        distance = distance.min((half_height - y) / s);
    } else if s < -1e-6 {
        distance = distance.min((-half_height - y) / s);
    }
    distance.max(0.0)
}

/// Signed angular difference wrapped to [-pi, pi].
fn angle_delta(a: f32, b: f32) -> f32 {
    (a - b + PI).rem_euclid(TAU) - PI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_to_walls_axis_aligned() {
        let d = ray_to_walls(0.0, 0.0, 0.0, 2.0, 1.0);
        assert!((d - 2.0).abs() < 1e-6);
        let d = ray_to_walls(0.0, 0.0, FRAC_PI_2, 2.0, 1.0);
        assert!((d - 1.0).abs() < 1e-6);
        let d = ray_to_walls(1.5, 0.0, PI, 2.0, 1.0);
        assert!((d - 3.5).abs() < 1e-5);
    }

    #[test]
    fn test_angle_delta_wraps() {
        assert!(angle_delta(0.1, TAU + 0.1).abs() < 1e-5);
        assert!((angle_delta(PI - 0.1, -PI + 0.1) + 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_target_intensity_sector_and_range() {
        // Dead ahead, half range.
        let i = target_intensity(0.0, 0.0, 0.0, CAMERA_RANGE / 2.0, 0.0, CAMERA_RANGE);
        assert!((i - 0.5).abs() < 1e-6);
        // Behind the sensor.
        let i = target_intensity(0.0, 0.0, 0.0, -1.0, 0.0, CAMERA_RANGE);
        assert_eq!(i, 0.0);
        // Out of range.
        let i = target_intensity(0.0, 0.0, 0.0, CAMERA_RANGE * 2.0, 0.0, CAMERA_RANGE);
        assert_eq!(i, 0.0);
    }
}
