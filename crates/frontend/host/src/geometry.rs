//! Placement of the virtual display inside a host window and conversion of
//! pointer positions to display coordinates.

use nx_core::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use serde::{Deserialize, Serialize};

/// Rectangle in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub window_width: u32,
    pub window_height: u32,
    pub rect: ScreenRect,
    /// Window y grows upwards (bottom-left origin)
    pub flip_y: bool,
}

impl DisplayGeometry {
    /// Largest integer scale of the display that fits the window, at least
    /// 1x, centered.
    pub fn fit(window_width: u32, window_height: u32) -> Self {
        let factor = (window_width / DISPLAY_WIDTH)
            .min(window_height / DISPLAY_HEIGHT)
            .max(1);
        let width = DISPLAY_WIDTH * factor;
        let height = DISPLAY_HEIGHT * factor;
        Self {
            window_width,
            window_height,
            rect: ScreenRect {
                x: (window_width as i32 - width as i32) / 2,
                y: (window_height as i32 - height as i32) / 2,
                width,
                height,
            },
            flip_y: false,
        }
    }

    /// Use an explicit display rectangle, e.g. one laid out by a view system.
    pub fn with_rect(window_width: u32, window_height: u32, rect: ScreenRect) -> Self {
        Self {
            window_width,
            window_height,
            rect,
            flip_y: false,
        }
    }

    pub fn flipped(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    /// Integer scale of the display rectangle.
    pub fn scale(&self) -> u32 {
        self.rect.width / DISPLAY_WIDTH
    }

    /// Map a window position to display pixels, clamped to the display.
    pub fn map_point(&self, x: f64, y: f64) -> (i32, i32) {
        let y = if self.flip_y {
            f64::from(self.window_height) - y
        } else {
            y
        };
        let w = f64::from(self.rect.width.max(1));
        let h = f64::from(self.rect.height.max(1));
        let dx = (x - f64::from(self.rect.x)) * f64::from(DISPLAY_WIDTH) / w;
        let dy = (y - f64::from(self.rect.y)) * f64::from(DISPLAY_HEIGHT) / h;
        (
            (dx.floor() as i32).clamp(0, DISPLAY_WIDTH as i32 - 1),
            (dy.floor() as i32).clamp(0, DISPLAY_HEIGHT as i32 - 1),
        )
    }

    /// Whether a window position lies on the display rectangle.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let y = if self.flip_y {
            f64::from(self.window_height) - y
        } else {
            y
        };
        let left = f64::from(self.rect.x);
        let top = f64::from(self.rect.y);
        x >= left
            && y >= top
            && x < left + f64::from(self.rect.width)
            && y < top + f64::from(self.rect.height)
    }
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        Self::fit(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}
