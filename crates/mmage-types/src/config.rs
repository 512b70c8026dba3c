use serde::Serialize;
use strum::{EnumIter, FromRepr};

/// Table lengths from the engine; entry 0 of each table is unused.
const HP_TABLE_LEN: u8 = 0x19;
const POINTS_TABLE_LEN: u8 = 0x19;
const FLAGS_TABLE_LEN: u8 = 0x46;
const BBOX_TABLE_LEN: u8 = 0x3B;

/// Per-object tunables stored as byte tables or single engine bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, FromRepr, EnumIter)]
#[repr(u8)]
pub enum ConfigKind {
    Hp,
    Points,
    /// Low 2 bits select the sprite palette, the rest is spawn priority.
    Flags,
    BBox,
    /// Skeleton bone-throw interval; a single engine byte.
    ThrowInterval,
    /// Shot travel time; one byte per shot type.
    ShotLifespan,
}

/// Which config kinds apply to a given object id.
pub fn config_kinds(gid: u8) -> Vec<ConfigKind> {
    let mut kinds = Vec::new();
    if gid == 0 {
        return kinds;
    }
    if gid < HP_TABLE_LEN {
        kinds.push(ConfigKind::Hp);
    }
    if gid < POINTS_TABLE_LEN {
        kinds.push(ConfigKind::Points);
    }
    if gid < FLAGS_TABLE_LEN {
        kinds.push(ConfigKind::Flags);
    }
    if gid < BBOX_TABLE_LEN {
        kinds.push(ConfigKind::BBox);
    }
    if gid == 0x0E {
        kinds.push(ConfigKind::ThrowInterval);
    }
    if gid == 0x35 || gid == 0x3A {
        kinds.push(ConfigKind::ShotLifespan);
    }
    kinds
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfigValue {
    Hp(u8),
    Points(u8),
    Flags(u8),
    BBox(u8),
    ThrowInterval(u8),
    ShotLifespan(u8),
}

impl ConfigValue {
    pub fn kind(self) -> ConfigKind {
        match self {
            Self::Hp(_) => ConfigKind::Hp,
            Self::Points(_) => ConfigKind::Points,
            Self::Flags(_) => ConfigKind::Flags,
            Self::BBox(_) => ConfigKind::BBox,
            Self::ThrowInterval(_) => ConfigKind::ThrowInterval,
            Self::ShotLifespan(_) => ConfigKind::ShotLifespan,
        }
    }

    pub fn byte(self) -> u8 {
        match self {
            Self::Hp(b)
            | Self::Points(b)
            | Self::Flags(b)
            | Self::BBox(b)
            | Self::ThrowInterval(b)
            | Self::ShotLifespan(b) => b,
        }
    }

    /// Sprite palette for a `Flags` value.
    pub fn palette(self) -> Option<u8> {
        match self {
            Self::Flags(b) => Some(b & 0x03),
            _ => None,
        }
    }

    /// Spawn priority for a `Flags` value; objects can evict lower values.
    pub fn priority(self) -> Option<u8> {
        match self {
            Self::Flags(b) => Some(b >> 2),
            _ => None,
        }
    }
}

/// One object's config byte for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectConfig {
    pub gid: u8,
    pub value: ConfigValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_assignment() {
        assert!(config_kinds(0).is_empty());
        assert_eq!(
            config_kinds(1),
            vec![ConfigKind::Hp, ConfigKind::Points, ConfigKind::Flags, ConfigKind::BBox]
        );
        // past the hp/points tables, still in flags/bbox range
        assert_eq!(config_kinds(0x20), vec![ConfigKind::Flags, ConfigKind::BBox]);
        assert!(config_kinds(0x0E).contains(&ConfigKind::ThrowInterval));
        assert!(config_kinds(0x35).contains(&ConfigKind::ShotLifespan));
        assert!(config_kinds(0x3A).contains(&ConfigKind::ShotLifespan));
        assert_eq!(config_kinds(0x50), vec![]);
    }

    #[test]
    fn flags_fields() {
        let v = ConfigValue::Flags(0b0110_1110);
        assert_eq!(v.palette(), Some(2));
        assert_eq!(v.priority(), Some(0b0001_1011));
        assert_eq!(ConfigValue::Hp(3).palette(), None);
    }
}
