use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Pixel dimensions of a piece of media. Both sides are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
}
impl Dimensions {
    /// Returns `None` if either side is zero (or doesn't fit in a `u32`).
    pub fn new(width: impl TryInto<u32>, height: impl TryInto<u32>) -> Option<Self> {
        let width = NonZeroU32::new(width.try_into().ok()?)?;
        let height = NonZeroU32::new(height.try_into().ok()?)?;
        Some(Self { width, height })
    }

    /// Total pixel count, used to rank variants by resolution.
    pub fn area(&self) -> u64 {
        u64::from(self.width.get()) * u64::from(self.height.get())
    }
}
