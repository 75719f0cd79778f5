//! Pixel margins removed from extracted still frames.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

/// Margins, in pixels, to cut from each edge of a still frame.
///
/// A spec with every margin at zero means "do not crop": no filter argument
/// is produced for it at all, rather than a no-op `crop` filter.
///
/// # Example
///
/// ```
/// use subdeck::CropSpec;
///
/// assert_eq!(CropSpec::default().filter(), None);
///
/// let letterbox = CropSpec::new(140, 0, 140, 0);
/// assert_eq!(
///     letterbox.filter().as_deref(),
///     Some("crop=in_w-0-0:in_h-140-140:0:140"),
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CropSpec {
    /// Pixels removed from the top edge.
    pub top: u32,
    /// Pixels removed from the right edge.
    pub right: u32,
    /// Pixels removed from the bottom edge.
    pub bottom: u32,
    /// Pixels removed from the left edge.
    pub left: u32,
}

impl CropSpec {
    /// Create a crop spec in CSS order: top, right, bottom, left.
    pub const fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Returns `true` when every margin is zero.
    pub const fn is_empty(&self) -> bool {
        self.top == 0 && self.right == 0 && self.bottom == 0 && self.left == 0
    }

    /// The FFmpeg `crop` filter expression, or `None` when nothing is cut.
    pub fn filter(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl Display for CropSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "crop=in_w-{}-{}:in_h-{}-{}:{}:{}",
            self.right, self.left, self.top, self.bottom, self.left, self.top
        )
    }
}
