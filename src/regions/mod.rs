//! Focus-point geometry
//!
//! Converts normalized focus points into metering rectangles on the sensor's
//! active pixel array. Used by the collaborator when it builds the AF lock
//! request; the number of rectangles is what it passes to
//! [`ConvergenceMachine::start`](crate::convergence::ConvergenceMachine::start).

use crate::errors::{ConvergeError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Highest metering weight accepted by capture requests
pub const METERING_WEIGHT_MAX: i32 = 1000;

/// Focus point in normalized preview coordinates (0.0..=1.0 on each axis)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusPoint {
    pub x: f32,
    pub y: f32,
}

impl FocusPoint {
    /// Create a focus point, clamping both axes into the unit range
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }
}

/// Sensor active pixel array bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActiveArray {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ActiveArray {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Weighted metering region in active-array coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeteringRectangle {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub weight: i32,
}

impl MeteringRectangle {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Half-size of a focus rectangle in pixels for the given display density
pub fn focus_radius(radius_dp: f32, density: f32) -> i32 {
    ((radius_dp * density) as i32).max(1)
}

/// Build AF metering regions around each focus point.
///
/// Points past `max_regions` are dropped.
pub fn build_af_regions(
    points: &[FocusPoint],
    array: &ActiveArray,
    radius: i32,
    max_regions: i32,
) -> Result<Vec<MeteringRectangle>> {
    if max_regions <= 0 {
        return Err(ConvergeError::AfRegionsUnsupported { max_regions });
    }
    if points.is_empty() {
        return Err(ConvergeError::NoFocusPoints);
    }

    let limit = max_regions as usize;
    if points.len() > limit {
        warn!(
            requested = points.len(),
            supported = limit,
            "more focus points than AF regions; extra points dropped"
        );
    }

    let regions = points
        .iter()
        .take(limit)
        .map(|point| {
            let x = array.left + (array.width() as f32 * point.x) as i32;
            let y = array.top + (array.height() as f32 * point.y) as i32;
            MeteringRectangle {
                left: array.left.max(x - radius),
                top: array.top.max(y - radius),
                right: (x + radius).min(array.right),
                bottom: (y + radius).min(array.bottom),
                weight: METERING_WEIGHT_MAX,
            }
        })
        .collect();

    Ok(regions)
}
