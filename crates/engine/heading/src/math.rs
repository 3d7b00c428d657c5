//! Heading math
//!
//! Pure conversions from raw orientation data to compass headings, plus the
//! wraparound-aware angle helpers the rest of the engine builds on. All
//! angles are degrees unless a name says otherwise.

use devices::{OrientationSample, PlatformProfile, RawReading};
use glam::{DQuat, DVec2};

use crate::landmark::{CoordMap, LandmarkEntry};

/// Offset added to planar landmark bearings so they share the heading's zero
///
/// Tuned to the scene's rendering convention, not derived from geometry.
pub const BEARING_OFFSET_DEG: f64 = 90.0;

/// Wrap any angle into `[0, 360)`
///
/// NaN stays NaN.
pub fn normalize_angle(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360; `+ 0.0` clears -0.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped + 0.0
    }
}

/// Signed shortest rotation from `b` to `a`, in `(-180, 180]`
pub fn shortest_angle_diff(a: f64, b: f64) -> f64 {
    let diff = (a - b + 540.0).rem_euclid(360.0) - 180.0;
    if diff <= -180.0 {
        180.0
    } else {
        diff
    }
}

/// Unsigned wraparound distance between two angles, in `[0, 180]`
pub fn angular_distance(a: f64, b: f64) -> f64 {
    shortest_angle_diff(a, b).abs()
}

/// Round to whole degrees, staying inside `[0, 360)`
pub fn round_heading(deg: f64) -> f64 {
    normalize_angle(deg.round())
}

/// Compass heading from device-orientation Euler angles
///
/// Returns `None` if any axis is unknown. `alpha` rotates about Z, `beta`
/// about X and `gamma` about Y.
pub fn euler_to_compass_heading(
    alpha: Option<f64>,
    beta: Option<f64>,
    gamma: Option<f64>,
) -> Option<f64> {
    let z = alpha?.to_radians();
    let x = beta?.to_radians();
    let y = gamma?.to_radians();

    let (sin_x, _) = x.sin_cos();
    let (sin_y, cos_y) = y.sin_cos();
    let (sin_z, cos_z) = z.sin_cos();

    let vx = -cos_z * sin_y - sin_z * sin_x * cos_y;
    let vy = -sin_z * sin_y + cos_z * sin_x * cos_y;

    Some(normalize_angle(vx.atan2(vy).to_degrees()))
}

/// Compass heading from a fused-sensor quaternion
///
/// Heading is the negated yaw.
pub fn quaternion_to_heading(q: DQuat) -> f64 {
    let yaw = (2.0 * (q.w * q.z + q.x * q.y)).atan2(1.0 - 2.0 * (q.y * q.y + q.z * q.z));
    normalize_angle(-yaw.to_degrees())
}

/// Heading from alpha alone, for platforms with an unknown axis convention
pub fn alpha_inversion_heading(alpha: Option<f64>) -> Option<f64> {
    alpha.map(|a| round_heading((360.0 - a) % 360.0))
}

/// Heading of an orientation event under a platform's convention
///
/// iOS reports a true compass heading directly; it is returned rounded.
/// Without it iOS falls back to alpha inversion. Android and desktop
/// browsers report raw rotation that goes through the Euler formula.
pub fn platform_heading(sample: &OrientationSample, profile: PlatformProfile) -> Option<f64> {
    match profile {
        PlatformProfile::Ios => match sample.native_heading {
            Some(native) => Some(round_heading(native)),
            None => alpha_inversion_heading(sample.euler.alpha),
        },
        PlatformProfile::Android | PlatformProfile::Desktop => {
            euler_to_compass_heading(sample.euler.alpha, sample.euler.beta, sample.euler.gamma)
        }
        PlatformProfile::Unknown => alpha_inversion_heading(sample.euler.alpha),
    }
}

/// Heading of any raw reading
pub fn reading_heading(reading: &RawReading, profile: PlatformProfile) -> Option<f64> {
    match reading {
        RawReading::Euler(sample) => platform_heading(sample, profile),
        RawReading::Quaternion(q) if q.is_finite() => Some(quaternion_to_heading(*q)),
        RawReading::Quaternion(_) => None,
    }
}

/// Bearing of a scene-plane position after rotating the scene by `yaw_rad`
pub fn planar_bearing(position: DVec2, yaw_rad: f64) -> f64 {
    let (sin_yaw, cos_yaw) = yaw_rad.sin_cos();
    let rx = position.x * cos_yaw + position.y * sin_yaw;
    let rz = -position.x * sin_yaw + position.y * cos_yaw;

    normalize_angle(rz.atan2(rx).to_degrees() + BEARING_OFFSET_DEG)
}

/// Bearing of a landmark under a coordinate mapping and scene yaw
pub fn landmark_bearing(entry: &LandmarkEntry, coord_map: &CoordMap, yaw_rad: f64) -> f64 {
    planar_bearing(coord_map.project(entry), yaw_rad)
}

/// 8-point cardinal direction of a heading
pub fn cardinal(heading: f64) -> &'static str {
    match normalize_angle(heading) as i32 {
        338..=360 | 0..=22 => "N",
        23..=67 => "NE",
        68..=112 => "E",
        113..=157 => "SE",
        158..=202 => "S",
        203..=247 => "SW",
        248..=292 => "W",
        293..=337 => "NW",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devices::EulerAngles;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_normalize_angle_range() {
        for x in [-720.5, -360.0, -1e-20, -0.1, 0.0, 45.0, 359.999, 360.0, 725.0, 1e9] {
            let n = normalize_angle(x);
            assert!((0.0..360.0).contains(&n), "{x} -> {n}");
            assert_eq!(normalize_angle(n), n);
        }
        assert!((normalize_angle(-90.0) - 270.0).abs() < EPS);
        assert!((normalize_angle(370.0) - 10.0).abs() < EPS);
    }

    #[test]
    fn test_shortest_angle_diff() {
        assert_eq!(shortest_angle_diff(350.0, 10.0), -20.0);
        assert_eq!(shortest_angle_diff(10.0, 350.0), 20.0);
        assert_eq!(shortest_angle_diff(123.0, 123.0), 0.0);
        assert_eq!(shortest_angle_diff(180.0, 0.0), 180.0);
        assert_eq!(shortest_angle_diff(0.0, 180.0), 180.0);

        for a in (0..720).step_by(7) {
            for b in (0..720).step_by(11) {
                let d = shortest_angle_diff(a as f64, b as f64);
                assert!(d > -180.0 && d <= 180.0);
            }
        }
    }

    #[test]
    fn test_euler_requires_all_axes() {
        assert!(euler_to_compass_heading(Some(0.0), Some(0.0), Some(0.0)).is_some());
        assert!(euler_to_compass_heading(None, Some(0.0), Some(0.0)).is_none());
        assert!(euler_to_compass_heading(Some(0.0), None, Some(0.0)).is_none());
        assert!(euler_to_compass_heading(Some(0.0), Some(0.0), None).is_none());
    }

    #[test]
    fn test_euler_upright_device() {
        // Held upright (beta = 90) the heading follows alpha backwards
        let north = euler_to_compass_heading(Some(0.0), Some(90.0), Some(0.0)).unwrap();
        assert!(angular_distance(north, 0.0) < 1e-6);

        let west = euler_to_compass_heading(Some(90.0), Some(90.0), Some(0.0)).unwrap();
        assert!((west - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_quaternion_heading() {
        assert!(quaternion_to_heading(DQuat::IDENTITY).abs() < EPS);

        // +90 deg yaw about Z reads as heading 270
        let q = DQuat::from_rotation_z(90f64.to_radians());
        assert!((quaternion_to_heading(q) - 270.0).abs() < 1e-6);

        let q = DQuat::from_rotation_z(-45f64.to_radians());
        assert!((quaternion_to_heading(q) - 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_platform_heading_dispatch() {
        let sample = OrientationSample::from_euler(EulerAngles::new(90.0, 90.0, 0.0))
            .with_native_heading(123.4);

        assert_eq!(platform_heading(&sample, PlatformProfile::Ios), Some(123.0));

        let android = platform_heading(&sample, PlatformProfile::Android).unwrap();
        assert!((android - 270.0).abs() < 1e-6);

        assert_eq!(platform_heading(&sample, PlatformProfile::Unknown), Some(270.0));

        let ios_without_native = OrientationSample::from_euler(EulerAngles::new(30.0, 0.0, 0.0));
        assert_eq!(
            platform_heading(&ios_without_native, PlatformProfile::Ios),
            Some(330.0)
        );

        let empty = OrientationSample::default();
        assert_eq!(platform_heading(&empty, PlatformProfile::Ios), None);
        assert_eq!(platform_heading(&empty, PlatformProfile::Desktop), None);
    }

    #[test]
    fn test_native_heading_rounds_into_range() {
        let sample = OrientationSample::default().with_native_heading(359.7);
        assert_eq!(platform_heading(&sample, PlatformProfile::Ios), Some(0.0));
    }

    #[test]
    fn test_planar_bearing() {
        // +X axis sits at the 90 degree convention offset
        assert!((planar_bearing(DVec2::new(1.0, 0.0), 0.0) - 90.0).abs() < 1e-9);
        assert!((planar_bearing(DVec2::new(0.0, 1.0), 0.0) - 180.0).abs() < 1e-9);
        assert!((planar_bearing(DVec2::new(-1.0, 0.0), 0.0) - 270.0).abs() < 1e-9);
        assert!(angular_distance(planar_bearing(DVec2::new(0.0, -1.0), 0.0), 0.0) < 1e-9);

        // Scene yaw of +90 degrees rotates +Z onto +X
        let rotated = planar_bearing(DVec2::new(0.0, 1.0), std::f64::consts::FRAC_PI_2);
        assert!((rotated - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_cardinal() {
        assert_eq!(cardinal(0.0), "N");
        assert_eq!(cardinal(359.9), "N");
        assert_eq!(cardinal(45.0), "NE");
        assert_eq!(cardinal(90.0), "E");
        assert_eq!(cardinal(180.0), "S");
        assert_eq!(cardinal(-90.0), "W");
    }
}
