//! Viewport Geometry
//!
//! Rectangles, CSS-style root margins and intersection ratios.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Axis-aligned rectangle in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rectangle
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlapping region, if any. Touching edges count as an empty overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Fraction of `self` that lies inside `root`, in `[0, 1]`.
    ///
    /// A zero-area element reports 1.0 when it lies on or inside `root`.
    pub fn intersection_ratio(&self, root: &Rect) -> f64 {
        let Some(overlap) = self.intersection(root) else {
            return 0.0;
        };
        let area = self.area();
        if area == 0.0 {
            return 1.0;
        }
        (overlap.area() / area).clamp(0.0, 1.0)
    }
}

/// One side of a root margin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginValue {
    /// Absolute pixels
    Px(f64),
    /// Percentage of the root's matching dimension
    Percent(f64),
}

impl MarginValue {
    fn parse(token: &str) -> Result<Self> {
        let invalid = || Error::Config(format!("Invalid root margin value: {:?}", token));

        if let Some(px) = token.strip_suffix("px") {
            px.parse::<f64>().map(MarginValue::Px).map_err(|_| invalid())
        } else if let Some(pct) = token.strip_suffix('%') {
            pct.parse::<f64>().map(MarginValue::Percent).map_err(|_| invalid())
        } else if token == "0" {
            Ok(MarginValue::Px(0.0))
        } else {
            Err(invalid())
        }
    }

    fn resolve(&self, dimension: f64) -> f64 {
        match *self {
            MarginValue::Px(px) => px,
            MarginValue::Percent(pct) => dimension * pct / 100.0,
        }
    }
}

/// CSS `margin` shorthand applied to the viewport before intersecting.
///
/// Positive values pre-trigger elements before they scroll into view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: MarginValue,
    pub right: MarginValue,
    pub bottom: MarginValue,
    pub left: MarginValue,
}

impl RootMargin {
    /// No expansion.
    pub const ZERO: RootMargin = RootMargin {
        top: MarginValue::Px(0.0),
        right: MarginValue::Px(0.0),
        bottom: MarginValue::Px(0.0),
        left: MarginValue::Px(0.0),
    };

    /// Parse 1 to 4 space-separated `px`/`%` values, CSS order.
    pub fn parse(text: &str) -> Result<Self> {
        let values = text
            .split_whitespace()
            .map(MarginValue::parse)
            .collect::<Result<Vec<_>>>()?;

        let (top, right, bottom, left) = match values.as_slice() {
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            _ => {
                return Err(Error::Config(format!(
                    "Root margin needs 1 to 4 values, got {:?}",
                    text
                )))
            }
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    /// Grow `root` by this margin.
    pub fn expand(&self, root: &Rect) -> Rect {
        let top = self.top.resolve(root.height);
        let right = self.right.resolve(root.width);
        let bottom = self.bottom.resolve(root.height);
        let left = self.left.resolve(root.width);
        Rect::new(
            root.x - left,
            root.y - top,
            root.width + left + right,
            root.height + top + bottom,
        )
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::str::FromStr for RootMargin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
