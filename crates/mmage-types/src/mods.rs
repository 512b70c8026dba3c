use serde::Serialize;

/// Optional gameplay patches applied over the committed image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Mods {
    /// Disables the bounce-back on taking damage.
    #[serde(rename = "no_bounce")]
    pub no_bounce: bool,
    /// Camera only scrolls when a player climbs.
    #[serde(rename = "no_auto_scroll")]
    pub no_auto_scroll: bool,
    /// Unlocks the long object format's 6-bit raw gid field (and drop
    /// objects, together with the mapper extension).
    #[serde(rename = "extended_objects")]
    pub extended_objects: bool,
    /// Disables collection of relics 1-4 respectively.
    #[serde(rename = "no_relic")]
    pub no_relic: [bool; 4],
}
