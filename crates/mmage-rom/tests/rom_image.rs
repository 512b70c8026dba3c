//! Whole-image round trips over a synthetic base ROM.

use mmage_rom::bitstream::{read_word, write_byte, write_word};
use mmage_rom::layout::{self, BASE_ROM_LEN, EXTENDED_ROM_LEN, Layout};
use mmage_rom::rom::{RomData, RomError};
use mmage_rom::tables::SONG_NAMES;
use mmage_rom::{level, music, text, title};
use mmage_types::{
    ConfigValue, Level, LevelId, LevelObject, MacroRow, MusicArg, MusicCommand, MusicData,
    MusicItem, MusicOpcode, MusicTarget, ObjectConfig, Palette, STRING_COUNT, Song, TextBank,
    TileQuad, TitleScreen, UnitilePatch, WORLD_COUNT,
};

const DURATIONS: [u8; 8] = [1, 2, 3, 4, 6, 8, 0x10, 0x20];

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn full_level() -> Level {
    let mut level = Level::default();
    for i in 0..0x20u8 {
        level.macro_rows.push(MacroRow { seam: 0, tiles: [i % 0x10, 1, 2, 3] });
    }
    level
}

/// A minimal image with every table RomData::read depends on: corner
/// pointers, world blocks, level blobs, a music bank that fills its
/// window exactly, a text bank and a title blob.
fn synthetic_base() -> Vec<u8> {
    let l = Layout::BASE;
    let mut bin = vec![0u8; BASE_ROM_LEN];

    // keep the bounce byte off the no_bounce detection value
    write_byte(&mut bin, l.ram_to_rom(0xD5D7), 0x60).unwrap();

    let rom = l.ram_to_rom(layout::MUSIC_DURATION_TABLE);
    bin[rom..rom + DURATIONS.len()].copy_from_slice(&DURATIONS);

    for (j, ptr) in [0x9000u16, 0x9100, 0x9200, 0x9300].into_iter().enumerate() {
        write_word(&mut bin, l.ram_to_rom(layout::MED_TILES_TABLE + 2 * j as u16), ptr).unwrap();
    }
    for (j, ptr) in [0x9400u16, 0x9500, 0x9600, 0x9700].into_iter().enumerate() {
        write_word(&mut bin, l.ram_to_rom(layout::MACRO_TILES_TABLE + 2 * j as u16), ptr)
            .unwrap();
    }

    // empty world blocks: zero local tiles, zeroed palettes
    for i in 0..WORLD_COUNT {
        let ram = 0x9800 + 0x80 * i as u16;
        write_word(&mut bin, l.ram_to_rom(layout::WORLD_MACRO_TILES_TABLE + 2 * i as u16), ram)
            .unwrap();
    }

    for i in 0..layout::SPAWNABLE_COUNT {
        write_byte(&mut bin, l.ram_to_rom(layout::SPAWNABLE_TABLE + i as u16), i as u8).unwrap();
    }

    let spawnable: Vec<u8> = (0..layout::SPAWNABLE_COUNT as u8).collect();
    let mut ram = layout::LEVEL_RANGE.0;
    for id in LevelId::iter() {
        let mut lv = full_level();
        lv.macro_rows.truncate(id.macro_rows());
        ram = level::commit(&lv, &mut bin, l, id, ram, &spawnable, false).unwrap();
    }

    // the window is 3092 nibbles; 9 headers + one 3-nibble opcode leave
    // an even number of nibbles, so the zero padding parses as whole
    // notes and the stream ends exactly at the window boundary
    let songs: Vec<Song> = SONG_NAMES
        .iter()
        .map(|&name| Song {
            name: name.to_string(),
            tempo: 8,
            channel_entries: std::array::from_fn(|_| MusicTarget::Addr(117)),
        })
        .collect();
    let code = vec![MusicItem::new(MusicCommand::Op {
        op: MusicOpcode::Art,
        args: vec![MusicArg::Nibble(2)],
    })];
    music::commit(&MusicData { songs, code, code_start: 117 }, &mut bin, l).unwrap();

    let bank = TextBank { strings: vec![String::new(); STRING_COUNT], ..TextBank::default() };
    text::commit(&bank, &mut bin, l).unwrap();

    title::commit(&TitleScreen::default(), &mut bin, l).unwrap();

    bin
}

#[test]
fn wrong_size_is_refused() {
    let err = RomData::read(vec![0; 0x100]).unwrap_err();
    assert!(matches!(err, RomError::BadSize { len: 0x100 }));
    let err = RomData::read(vec![0; EXTENDED_ROM_LEN]).unwrap_err();
    assert!(matches!(err, RomError::BadSize { .. }));
}

#[test]
fn edit_commit_read_round_trips() {
    init_logging();
    let mut data = RomData::read(synthetic_base()).unwrap();

    data.default_lives = 5;
    data.sprite_palettes[1] = Palette::from_colors([0x15, 0x26, 0x30]);
    data.mirror_pairs.0[0] = [0x21, 0x22];
    data.chest_objects[2] = 0x15;
    data.pause_text = [1, 2, 3, 4, 5];
    data.pause_text_offset = 9;
    data.press_start_text_position = 0x2123;
    data.players_text_position = 0x2860;
    data.chr[0][1].pixels[0][0] = 3;
    data.object_config[0] = ObjectConfig { gid: 1, value: ConfigValue::Hp(7) };
    data.med_tiles[3] = TileQuad([1, 2, 3, 4]);
    data.macro_tiles[5] = TileQuad([9, 8, 7, 6]);
    data.worlds[0].max_symmetry_idx = 0x30;
    data.worlds[0].palettes[0] = Palette::from_colors([0x01, 0x11, 0x21]);
    data.worlds[0].med_tile_palettes[5] = 2;
    data.levels[0].objects.push(LevelObject {
        x: 7,
        y: 0x30,
        gid: 0x12,
        flip_x: true,
        ..Default::default()
    });
    data.levels[2].macro_rows[4].tiles = [4, 4, 4, 4];
    data.text.strings[0] = "HELLO WORLD".to_string();
    data.title_screen.tables[0][5] = 0x41;
    data.title_screen.palettes[0][1] = Palette::from_colors([0x0C, 0x1C, 0x2C]);

    let img = data.commit().unwrap();
    assert_eq!(img.len(), BASE_ROM_LEN);
    let back = RomData::read(img).unwrap();

    assert_eq!(back.default_lives, 5);
    assert_eq!(back.sprite_palettes, data.sprite_palettes);
    assert_eq!(back.mirror_pairs, data.mirror_pairs);
    assert_eq!(back.chest_objects, data.chest_objects);
    assert_eq!(back.pause_text, data.pause_text);
    assert_eq!(back.pause_text_offset, 9);
    assert_eq!(back.press_start_text_position, 0x2123);
    assert_eq!(back.players_text_position, 0x2860);
    assert_eq!(back.chr, data.chr);
    assert_eq!(back.object_config, data.object_config);
    assert_eq!(back.med_tiles, data.med_tiles);
    assert_eq!(back.macro_tiles, data.macro_tiles);
    assert_eq!(back.worlds, data.worlds);
    assert_eq!(back.levels, data.levels);
    assert_eq!(back.music, data.music);
    assert_eq!(back.text.strings, data.text.strings);
    // the LZ blob's trailing padding decodes as extra ending-screen
    // tiles, so only the fixed-size pieces compare exactly
    assert_eq!(back.title_screen.tables[0], data.title_screen.tables[0]);
    assert_eq!(back.title_screen.palette_idxs, data.title_screen.palette_idxs);
    assert_eq!(back.title_screen.palettes, data.title_screen.palettes);
}

#[test]
fn mapper_extension_reshapes_the_image() {
    init_logging();
    let mut data = RomData::read(synthetic_base()).unwrap();
    data.mapper_extension = true;
    data.mods.extended_objects = true;
    data.levels[0].objects.push(LevelObject {
        x: 4,
        y: 10,
        gid: 0x2A,
        drop: true,
        ..Default::default()
    });
    data.levels[1].unitile_patches.push(UnitilePatch {
        x: 2,
        y: 1,
        med_tile: Some(0x51),
        ..Default::default()
    });

    let img = data.commit().unwrap();
    let l = Layout::EXTENDED;
    assert_eq!(img.len(), EXTENDED_ROM_LEN);
    assert_eq!(&img[0x4..0x7], &[4, 1, 0x20]);
    assert!(img[0x4010..0x4110].iter().any(|&b| b != 0));

    // levels move into the first inserted bank
    assert_eq!(read_word(&img, l.ram_to_rom(layout::LEVEL_TABLE)).unwrap(), 0x8000);
    assert_eq!(img[l.level_to_rom(0x8000)], 0); // hardmode length byte

    // level 0 drop records sit at the start of the shared heap, with the
    // pointer table entry backed off by three
    let heap = layout::UNITILE_TABLE_RANGE.0 + 10 * mmage_types::LEVEL_COUNT as u16;
    assert_eq!(heap, 0xDD5D);
    assert_eq!(img[l.ram_to_rom(layout::UNITILE_TABLE_RANGE.0)], 0x5A);
    assert_eq!(img[l.ram_to_rom(layout::UNITILE_TABLE_RANGE.0 + 0xE)], 0xDD);
    let rom = l.ram_to_rom(heap);
    assert_eq!(&img[rom..rom + 5], &[0x20, 0x50, 0xFC, 0x2A, 0x01]);

    // level 1's unitile stream follows the drop records
    let table = layout::UNITILE_TABLE_RANGE.0 + 2 * mmage_types::LEVEL_COUNT as u16 + 8;
    assert_eq!(read_word(&img, l.ram_to_rom(table)).unwrap(), 0xDD62);

    // mapper trampolines and the extended-objects dispatcher are applied
    assert_eq!(img[l.ram_to_rom(0xFFFC)], 0xEC);
    assert_eq!(img[l.ram_to_rom(0xDAC4)], 0x0E);

    // the original first bank keeps its place
    assert_eq!(
        &img[l.ram_to_rom(layout::MUSIC_DURATION_TABLE)..][..DURATIONS.len()],
        &DURATIONS
    );
}

#[test]
fn commit_reports_every_failure_at_once() {
    init_logging();
    let mut data = RomData::read(synthetic_base()).unwrap();
    // world 0 was read with zero local tiles, so any growth overflows
    data.worlds[0].med_tiles.push(TileQuad([1, 2, 3, 4]));
    // duration 5 is not in the engine's table
    data.music.code[0] =
        MusicItem::new(MusicCommand::Note { pitch: mmage_types::NotePitch::Tone(0), duration: 5 });

    let errs = data.commit().unwrap_err();
    assert_eq!(errs.0.len(), 2);
    assert!(matches!(errs.0[0], RomError::World(_)));
    assert!(matches!(errs.0[1], RomError::Music(_)));
}
