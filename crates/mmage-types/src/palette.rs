use serde::Serialize;

/// A 4-color NES palette. Color 0 is always the shared 0x0F backdrop; only
/// the other three colors are stored in the ROM (6 bits each).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette(pub [u8; 4]);

impl Palette {
    pub const BACKDROP: u8 = 0x0F;

    pub const fn from_colors(colors: [u8; 3]) -> Self {
        Self([Self::BACKDROP, colors[0], colors[1], colors[2]])
    }

    /// The three stored colors, excluding the backdrop.
    pub const fn colors(self) -> [u8; 3] {
        [self.0[1], self.0[2], self.0[3]]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self([Self::BACKDROP, 0, 0, 0])
    }
}
