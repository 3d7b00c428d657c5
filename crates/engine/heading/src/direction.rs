//! Landmark direction strip
//!
//! Places every landmark relative to the displayed heading: which ones sit
//! inside the visible arc and where, which is nearest the centre, and which
//! selected ones are off to the left or right.

use serde::Serialize;

use crate::landmark::{LandmarkCatalog, LandmarkFrame};
use crate::math::shortest_angle_diff;

/// One landmark relative to the camera
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkAngle {
    pub key: String,
    pub label: String,
    /// Bearing in `[0, 360)`
    pub absolute_angle: f64,
    /// Negative is left, in `(-180, 180]`
    pub relative_angle: f64,
    pub is_selected: bool,
}

/// A landmark inside the visible arc
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleLandmark {
    #[serde(flatten)]
    pub angle: LandmarkAngle,
    /// Horizontal position across the strip, 0 at the left edge
    pub position_percent: f64,
}

/// Everything the direction strip renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionStrip {
    pub landmark_angles: Vec<LandmarkAngle>,
    pub visible_landmarks: Vec<VisibleLandmark>,
    pub nearest_landmark: Option<VisibleLandmark>,
    pub out_of_range_landmarks: Vec<LandmarkAngle>,
    pub show_left_indicator: bool,
    pub show_right_indicator: bool,
    pub view_angle_range: f64,
}

/// Inputs that change per frame
#[derive(Debug, Clone, Copy)]
pub struct StripQuery<'a> {
    /// Displayed heading
    pub camera_rotation: f64,
    /// Landmarks selected by anyone
    pub selected: &'a [String],
    /// Landmarks selected by the local user
    pub my_selected: &'a [String],
    pub view_angle_range: f64,
}

/// Every landmark's bearing relative to `camera_rotation`, in key order
pub fn landmark_angles(
    catalog: &LandmarkCatalog,
    frame: &LandmarkFrame,
    camera_rotation: f64,
    selected: &[String],
) -> Vec<LandmarkAngle> {
    catalog
        .iter()
        .map(|(key, entry)| {
            let absolute_angle = frame.bearing(entry);
            LandmarkAngle {
                key: key.to_string(),
                label: entry.label.clone(),
                absolute_angle,
                relative_angle: shortest_angle_diff(absolute_angle, camera_rotation),
                is_selected: selected.iter().any(|s| s == key),
            }
        })
        .collect()
}

/// Build the full strip for one frame
pub fn direction_strip(
    catalog: &LandmarkCatalog,
    frame: &LandmarkFrame,
    query: StripQuery<'_>,
) -> DirectionStrip {
    let range = query.view_angle_range;
    let landmark_angles = landmark_angles(catalog, frame, query.camera_rotation, query.selected);

    let visible_landmarks: Vec<VisibleLandmark> = landmark_angles
        .iter()
        .filter(|l| range > 0.0 && l.relative_angle.abs() <= range)
        .map(|l| VisibleLandmark {
            angle: l.clone(),
            position_percent: (l.relative_angle + range) / (range * 2.0) * 100.0,
        })
        .collect();

    // Ties keep the earlier landmark
    let nearest_landmark = if query.my_selected.is_empty() {
        visible_landmarks
            .iter()
            .fold(None::<&VisibleLandmark>, |nearest, current| match nearest {
                Some(n) if n.angle.relative_angle.abs() <= current.angle.relative_angle.abs() => {
                    Some(n)
                }
                _ => Some(current),
            })
            .cloned()
    } else {
        None
    };

    let out_of_range_landmarks: Vec<LandmarkAngle> = landmark_angles
        .iter()
        .filter(|l| l.is_selected && l.relative_angle.abs() > range)
        .cloned()
        .collect();

    let show_left_indicator = out_of_range_landmarks
        .iter()
        .any(|l| l.relative_angle < -range);
    let show_right_indicator = out_of_range_landmarks
        .iter()
        .any(|l| l.relative_angle > range);

    DirectionStrip {
        landmark_angles,
        visible_landmarks,
        nearest_landmark,
        out_of_range_landmarks,
        show_left_indicator,
        show_right_indicator,
        view_angle_range: range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::LandmarkEntry;

    /// Bearings under the default frame: east 90, south 180, west 270, north 0
    fn compass_catalog() -> LandmarkCatalog {
        LandmarkCatalog::new()
            .with("east", LandmarkEntry::new("East", 10.0, 0.0))
            .with("south", LandmarkEntry::new("South", 0.0, 10.0))
            .with("west", LandmarkEntry::new("West", -10.0, 0.0))
            .with("north", LandmarkEntry::new("North", 0.0, -10.0))
    }

    #[test]
    fn test_relative_angles() {
        let angles = landmark_angles(
            &compass_catalog(),
            &LandmarkFrame::default(),
            80.0,
            &["west".to_string()],
        );
        let east = angles.iter().find(|a| a.key == "east").unwrap();
        assert!((east.relative_angle - 10.0).abs() < 1e-9);
        assert!(!east.is_selected);

        let west = angles.iter().find(|a| a.key == "west").unwrap();
        assert!((west.relative_angle - -170.0).abs() < 1e-9);
        assert!(west.is_selected);

        for a in &angles {
            assert!(a.relative_angle > -180.0 && a.relative_angle <= 180.0);
        }
    }

    #[test]
    fn test_visible_and_nearest() {
        let strip = direction_strip(
            &compass_catalog(),
            &LandmarkFrame::default(),
            StripQuery {
                camera_rotation: 100.0,
                selected: &[],
                my_selected: &[],
                view_angle_range: 90.0,
            },
        );

        let visible: Vec<_> = strip
            .visible_landmarks
            .iter()
            .map(|v| v.angle.key.as_str())
            .collect();
        assert_eq!(visible, vec!["east", "south"]);

        let east = &strip.visible_landmarks[0];
        // relative -10 over a 180 degree strip
        assert!((east.position_percent - 80.0 / 180.0 * 100.0).abs() < 1e-9);

        assert_eq!(strip.nearest_landmark.unwrap().angle.key, "east");
        assert!(strip.out_of_range_landmarks.is_empty());
        assert!(!strip.show_left_indicator && !strip.show_right_indicator);
    }

    #[test]
    fn test_no_nearest_with_own_selection() {
        let mine = vec!["east".to_string()];
        let strip = direction_strip(
            &compass_catalog(),
            &LandmarkFrame::default(),
            StripQuery {
                camera_rotation: 95.0,
                selected: &mine,
                my_selected: &mine,
                view_angle_range: 90.0,
            },
        );
        assert!(strip.nearest_landmark.is_none());
        assert_eq!(strip.visible_landmarks.len(), 2);
    }

    #[test]
    fn test_out_of_range_indicators() {
        let selected = vec!["west".to_string(), "north".to_string()];
        let strip = direction_strip(
            &compass_catalog(),
            &LandmarkFrame::default(),
            StripQuery {
                camera_rotation: 140.0,
                selected: &selected,
                my_selected: &[],
                view_angle_range: 60.0,
            },
        );

        // west: 270 - 140 = 130 (right), north: 0 - 140 = -140 (left)
        let out: Vec<_> = strip
            .out_of_range_landmarks
            .iter()
            .map(|l| l.key.as_str())
            .collect();
        assert_eq!(out, vec!["north", "west"]);
        assert!(strip.show_left_indicator);
        assert!(strip.show_right_indicator);
    }

    #[test]
    fn test_strip_edges_inclusive() {
        let strip = direction_strip(
            &LandmarkCatalog::new().with("east", LandmarkEntry::new("East", 10.0, 0.0)),
            &LandmarkFrame::default(),
            StripQuery {
                camera_rotation: 0.0,
                selected: &[],
                my_selected: &[],
                view_angle_range: 90.0,
            },
        );
        assert_eq!(strip.visible_landmarks.len(), 1);
        assert!((strip.visible_landmarks[0].position_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_view_range_shows_nothing() {
        let strip = direction_strip(
            &compass_catalog(),
            &LandmarkFrame::default(),
            StripQuery {
                camera_rotation: 90.0,
                selected: &[],
                my_selected: &[],
                view_angle_range: 0.0,
            },
        );
        assert!(strip.visible_landmarks.is_empty());
        assert!(strip.nearest_landmark.is_none());
    }
}
