use serde::Serialize;

/// An object placement within a level. Coordinates are in micro-tiles
/// (8-pixel units); `x` spans the 32-tile row, `y` counts up from the
/// bottom of the level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelObject {
    pub x: u8,
    pub y: u8,
    /// Global object id, an index into the engine's object tables.
    pub gid: u8,
    #[serde(rename = "flip-x")]
    pub flip_x: bool,
    #[serde(rename = "flip-y")]
    pub flip_y: bool,
    /// Whether the object was (or should be) stored in the short format.
    pub compressed: bool,
    /// Spawns as an item drop instead of a level placement. Drop objects
    /// live in a separate table and need the extended-objects mod.
    pub drop: bool,
}
