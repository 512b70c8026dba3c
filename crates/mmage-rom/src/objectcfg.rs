//! Per-object config bytes: the hp/points/flags/bbox tables plus a few
//! loose engine bytes (skeleton throw interval, shot lifespans).

use mmage_types::{ConfigKind, ConfigValue, ObjectConfig, config_kinds};

use crate::bitstream::{StreamError, read_byte, write_byte};
use crate::layout::{self, Layout};

fn config_rom(layout: Layout, gid: u8, kind: ConfigKind) -> usize {
    let addr = match kind {
        ConfigKind::Hp => layout::OBJECT_HP_TABLE + u16::from(gid),
        ConfigKind::Points => layout::OBJECT_POINTS_TABLE + u16::from(gid),
        ConfigKind::Flags => layout::OBJECT_FLAGS_TABLE + u16::from(gid),
        ConfigKind::BBox => layout::OBJECT_BBOX_TABLE + u16::from(gid),
        ConfigKind::ThrowInterval => layout::SKELETON_THROW_INTERVAL,
        // the second shot type's byte follows the first
        ConfigKind::ShotLifespan => {
            layout::SHOT_LIFESPAN_TABLE + u16::from(gid == 0x35)
        }
    };
    layout.ram_to_rom(addr)
}

fn value_of(kind: ConfigKind, b: u8) -> ConfigValue {
    match kind {
        ConfigKind::Hp => ConfigValue::Hp(b),
        ConfigKind::Points => ConfigValue::Points(b),
        ConfigKind::Flags => ConfigValue::Flags(b),
        ConfigKind::BBox => ConfigValue::BBox(b),
        ConfigKind::ThrowInterval => ConfigValue::ThrowInterval(b),
        ConfigKind::ShotLifespan => ConfigValue::ShotLifespan(b),
    }
}

/// Reads every applicable config byte for every object id.
pub fn read_all(bin: &[u8], layout: Layout) -> Result<Vec<ObjectConfig>, StreamError> {
    let mut configs = Vec::new();
    for gid in 0..=u8::MAX {
        for kind in config_kinds(gid) {
            let b = read_byte(bin, config_rom(layout, gid, kind))?;
            configs.push(ObjectConfig { gid, value: value_of(kind, b) });
        }
    }
    Ok(configs)
}

pub fn write_all(
    bin: &mut [u8],
    layout: Layout,
    configs: &[ObjectConfig],
) -> Result<(), StreamError> {
    for cfg in configs {
        // entries for ids without that table are ignored
        if !config_kinds(cfg.gid).contains(&cfg.value.kind()) {
            continue;
        }
        write_byte(bin, config_rom(layout, cfg.gid, cfg.value.kind()), cfg.value.byte())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BASE_ROM_LEN;

    #[test]
    fn round_trip_covers_all_tables() {
        let mut bin = vec![0u8; BASE_ROM_LEN];
        let configs = vec![
            ObjectConfig { gid: 1, value: ConfigValue::Hp(4) },
            ObjectConfig { gid: 1, value: ConfigValue::Points(2) },
            ObjectConfig { gid: 0x20, value: ConfigValue::Flags(0x4D) },
            ObjectConfig { gid: 0x0E, value: ConfigValue::ThrowInterval(0x60) },
            ObjectConfig { gid: 0x3A, value: ConfigValue::ShotLifespan(0x22) },
            ObjectConfig { gid: 0x35, value: ConfigValue::ShotLifespan(0x23) },
        ];
        write_all(&mut bin, Layout::BASE, &configs).unwrap();
        let back = read_all(&bin, Layout::BASE).unwrap();
        for cfg in &configs {
            assert!(back.contains(cfg), "{cfg:?} did not survive");
        }
    }

    #[test]
    fn shot_lifespans_use_adjacent_bytes() {
        let mut bin = vec![0u8; BASE_ROM_LEN];
        write_all(
            &mut bin,
            Layout::BASE,
            &[
                ObjectConfig { gid: 0x3A, value: ConfigValue::ShotLifespan(0x11) },
                ObjectConfig { gid: 0x35, value: ConfigValue::ShotLifespan(0x12) },
            ],
        )
        .unwrap();
        let rom = Layout::BASE.ram_to_rom(layout::SHOT_LIFESPAN_TABLE);
        assert_eq!(bin[rom], 0x11);
        assert_eq!(bin[rom + 1], 0x12);
    }

    #[test]
    fn inapplicable_entries_are_ignored() {
        let mut bin = vec![0u8; BASE_ROM_LEN];
        write_all(
            &mut bin,
            Layout::BASE,
            &[ObjectConfig { gid: 0x20, value: ConfigValue::Hp(9) }],
        )
        .unwrap();
        assert!(bin.iter().all(|&b| b == 0));
    }
}
