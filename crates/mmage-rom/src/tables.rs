//! Static name tables and the known-good ROM digests.

/// MD5 digests of unmodified base ROMs; anything else gets a warning on
/// load.
pub const BASE_HASHES: [&str; 2] =
    ["1062df5838a11e0e17ed590bdc1095c6", "11c3f3f8d6473d9672dd8aabb842c3a0"];

pub const SONG_NAMES: [&str; 9] =
    ["Mysterious", "Heroic", "Spooky", "Dreamy", "Evil", "Intro", "Fanfare", "Boss", "March"];

/// The four musical virtual channels followed by the two SFX channels.
pub const VCHANNEL_NAMES: [&str; 6] = ["Lead", "Counterpoint", "Triangle", "Noise", "SFX0", "SFX1"];

/// Known aliases per object id; the first alias is canonical.
pub const OBJECT_NAMES: &[&[&str]] = &[
    &["none"],
    &["boss-ghost", "boss-grim", "boss-grimmig", "boss-1"],
    &["boss-thor", "boss-thorrix", "boss-viking", "boss-2"],
    &["boss-eye", "boss-4"],
    &["flag"],
    &["beer", "barrel-thrower", "beer-bros"],
    &["boss-final", "boss-5", "boss-finale"],
    &["goat"],
    &["boss-knight", "boss-3"],
    &["wisp", "willowisp"],
    &["bone", "bone-boomer"],
    &["troll", "pitchfork-tosser", "fork", "demon-troll"],
    &["snake", "snek"],
    &["p-ghost"],
    &["skeleton", "skel"],
    &["i-gem-blue"],
    &["p-barrel"],
    &["i-warp"],
    &["bat"],
    &["ghost"],
    &["goblin", "gbln"],
    &["i-gem-green"],
    &["abat", "active-bat"],
    &["i-orb"],
    &["eye", "ball", "eyeball"],
    &["grinder"],
    &["fanh", "fan-horizontal"],
    &["elec", "electric-discharge", "electricity"],
    &["exit"],
    &["trampoline", "tramp"],
    &["p-sword"],
    &["fanv", "fan-vertical"],
    &["i-feather"],
    &["spawn", "mage", "player"],
    &["fx-destroyable-block-explosion"],
    &["fx-explosion"],
    &["boss-staff", "boss-knight-staff", "boss-3-staff"],
    &[],
    &[],
    &[],
    &["torch"],
    &[],
    &["i-heart"],
    &["i-fairy"],
    &["eye-inv"],
    &["dog"],
    &["pipe-A"],
    &["boss-bats"],
    &["pipe-B"],
    &["gate", "boss-gate"],
    &[],
    &["pipe-C"],
    &["p-bone"],
    &["p-shot-charged"],
    &["relic"],
    &[],
    &["p-fork"],
    &[],
    &["p-shot"],
    &["p-bubble"],
];

/// Canonical display name for an object id.
pub fn object_name(gid: u8) -> String {
    match OBJECT_NAMES.get(usize::from(gid)).and_then(|names| names.first()) {
        Some(name) => (*name).to_owned(),
        None => format!("obj-{gid:02x}"),
    }
}

/// Resolves a name or `obj-XX`/`unk-XX` alias back to an object id.
pub fn object_gid(name: &str) -> Option<u8> {
    if let Some(hex) = name.strip_prefix("obj-").or_else(|| name.strip_prefix("unk-")) {
        if let Ok(gid) = u8::from_str_radix(hex, 16) {
            return Some(gid);
        }
    }
    for (gid, names) in OBJECT_NAMES.iter().enumerate() {
        if names.contains(&name) {
            return Some(gid as u8);
        }
    }
    None
}
