use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-width of the "in front of you" band, as a fraction of the center offset.
pub const CENTER_BAND_FRACTION: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Center,
    Right,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Center => "center",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an observed horizontal position onto left/center/right.
///
/// The band boundaries belong to `Center`. A non-positive or non-finite
/// `center` (unmeasured viewport) and a non-finite `observed_x` also yield
/// `Center`.
pub fn estimate_direction(observed_x: f32, center: f32) -> Direction {
    if !center.is_finite() || center <= 0.0 || !observed_x.is_finite() {
        return Direction::Center;
    }
    let band = center * CENTER_BAND_FRACTION;
    if observed_x < center - band {
        Direction::Left
    } else if observed_x > center + band {
        Direction::Right
    } else {
        Direction::Center
    }
}
