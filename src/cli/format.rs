//! Output formatting for CLI display.

use std::fmt::Write as _;

use crate::engine::StopStatus;
use crate::model::{Progress, Stop};
use crate::session::Status;

/// `N m` below a kilometre, `N.NN km` from there on.
pub(super) fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

/// `completed / total (percent%)`.
pub(super) fn format_progress(progress: &Progress) -> String {
    format!(
        "{} / {} ({}%)",
        progress.completed, progress.total, progress.percent
    )
}

/// Bearing in whole degrees with its compass point, e.g. `312° NW`.
pub(super) fn format_bearing(degrees: f64) -> String {
    format!("{degrees:.0}° {}", compass_point(degrees))
}

fn compass_point(degrees: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let sector = ((degrees.rem_euclid(360.0) + 22.5) / 45.0).floor() as usize % POINTS.len();
    POINTS[sector]
}

/// Which way to turn, given the pointer angle relative to where the
/// visitor faces.
pub(super) fn turn_hint(pointer_degrees: f64) -> &'static str {
    let angle = (pointer_degrees + 180.0).rem_euclid(360.0) - 180.0;
    let abs_angle = angle.abs();

    if abs_angle > 160.0 {
        "behind you"
    } else if abs_angle > 100.0 {
        if angle > 0.0 { "sharp right" } else { "sharp left" }
    } else if abs_angle > 45.0 {
        if angle > 0.0 { "turn right" } else { "turn left" }
    } else if abs_angle > 15.0 {
        if angle > 0.0 { "bear right" } else { "bear left" }
    } else {
        "straight ahead"
    }
}

pub(super) fn format_stop_status(status: StopStatus) -> &'static str {
    match status {
        StopStatus::Visited => "visited",
        StopStatus::Skipped => "skipped",
        StopStatus::Next => "next",
        StopStatus::Pending => "pending",
    }
}

pub(super) fn format_status(status: &Status) -> String {
    match status {
        Status::Acquiring => "Acquiring position...".to_string(),
        Status::Tracking => "Tracking position".to_string(),
        Status::TimedOut => "No position fix yet; still waiting".to_string(),
        Status::FeedError(reason) => format!("GPS unavailable: {reason}"),
        Status::FeedEnded => "Position feed ended".to_string(),
        Status::HeadingActive => "Compass active".to_string(),
        Status::HeadingDenied => "Compass permission denied.".to_string(),
        Status::HeadingUnsupported => "Compass not supported.".to_string(),
    }
}

/// Full content of a stop, as revealed on arrival.
pub(super) fn format_stop(stop: &Stop) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", stop.name);
    let _ = writeln!(out, "{}", "=".repeat(stop.name.chars().count()));
    let _ = writeln!(out, "{}", stop.content.info);
    if let Some(image) = &stop.content.image {
        let _ = writeln!(out, "Image: {image}");
    }
    for clip in &stop.content.audio {
        let _ = writeln!(out, "Audio: {} ({})", clip.label, clip.src);
    }
    let _ = write!(out, "Location: {}", stop.coordinate);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{AudioClip, Content, Coordinate};

    #[test]
    fn format_distance_meters() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(12.4), "12 m");
        assert_eq!(format_distance(999.0), "999 m");
    }

    #[test]
    fn format_distance_km() {
        assert_eq!(format_distance(1000.0), "1.00 km");
        assert_eq!(format_distance(2534.0), "2.53 km");
    }

    #[test]
    fn format_progress_shows_completed_of_total() {
        let progress = Progress::new(2, 1, 3, 16);
        assert_eq!(format_progress(&progress), "3 / 16 (19%)");
    }

    #[test]
    fn compass_points() {
        assert_eq!(format_bearing(0.0), "0° N");
        assert_eq!(format_bearing(44.0), "44° NE");
        assert_eq!(format_bearing(180.0), "180° S");
        assert_eq!(format_bearing(350.0), "350° N");
        assert_eq!(format_bearing(300.0), "300° NW");
    }

    #[test]
    fn turn_hints() {
        assert_eq!(turn_hint(0.0), "straight ahead");
        assert_eq!(turn_hint(355.0), "straight ahead");
        assert_eq!(turn_hint(30.0), "bear right");
        assert_eq!(turn_hint(-30.0), "bear left");
        assert_eq!(turn_hint(270.0), "turn left");
        assert_eq!(turn_hint(130.0), "sharp right");
        assert_eq!(turn_hint(180.0), "behind you");
        // The smoothed pointer is not wrapped.
        assert_eq!(turn_hint(720.0 + 90.0), "turn right");
    }

    #[test]
    fn format_stop_lists_content() {
        let stop = Stop {
            name: "Goonhilly".into(),
            coordinate: Coordinate::new(52.057_9, 1.28),
            arrival_radius_meters: 15.0,
            content: Content {
                info: "A dish.".into(),
                image: Some("images/goonhilly.jpg".into()),
                audio: vec![AudioClip {
                    label: "Intro".into(),
                    src: "audio/intro.mp3".into(),
                }],
            },
        };

        assert_eq!(
            format_stop(&stop),
            "Goonhilly\n=========\nA dish.\nImage: images/goonhilly.jpg\n\
             Audio: Intro (audio/intro.mp3)\nLocation: 52.057900, 1.280000"
        );
    }
}
