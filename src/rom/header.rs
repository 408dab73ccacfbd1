//! Decoder for the fixed-size header region at the start of the ROM: the
//! stock GBA cartridge header, the GF header the games embed at 0x100, and
//! the expansion header at 0x204 that carries the table offsets and counts
//! used by the rest of the ROM reader.

use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{DecodeError, Result};

pub const ROM_HEADER_SIZE: usize = 0x21E;

const GAME_TITLE_OFFSET: u64 = 0x0A0;
const GAME_CODE_OFFSET: u64 = 0x0AC;
const MOVE_NAMES_OFFSET: u64 = 0x148;
const POKEMON_NAME_LENGTH_OFFSET: u64 = 0x176;
const SPECIES_INFO_OFFSET: u64 = 0x1B9;
const ITEMS_OFFSET: u64 = 0x1C5;
const EXPANSION_MAGIC_OFFSET: u64 = 0x204;

/// Marker the expansion writes into its header; a ROM without it has no
/// table offsets to read.
pub const EXPANSION_MAGIC: &[u8; 6] = b"RHHEXP";

const ROM_POINTER_BASE: u32 = 0x0800_0000;

/// The header fields the table decoders need, plus the identity fields worth
/// logging. Pointer fields are already translated to file offsets.
#[derive(Clone, Debug)]
pub struct RomHeader {
    pub game_title: String,
    pub game_code: String,
    pub pokemon_name_length: u8,
    pub move_names: u32,
    pub species_info: u32,
    pub items: u32,
    pub abilities: u32,
    pub expansion_version: (u8, u8, u8),
    pub moves_count: u32,
    pub num_species: u32,
    pub abilities_count: u32,
}

/// Cartridge ROM is memory-mapped at 0x08000000; header pointer fields hold
/// mapped addresses, not file offsets.
fn pointer_to_offset(pointer: u32) -> u32 {
    if pointer >= ROM_POINTER_BASE {
        pointer - ROM_POINTER_BASE
    } else {
        pointer
    }
}

pub fn decode_header(rom: &[u8]) -> Result<RomHeader> {
    if rom.len() < ROM_HEADER_SIZE {
        return Err(DecodeError::OutOfRange {
            context: "ROM header",
            offset: 0,
            len: ROM_HEADER_SIZE,
            size: rom.len(),
        });
    }

    let mut cursor = Cursor::new(rom);

    cursor.seek(SeekFrom::Start(GAME_TITLE_OFFSET))?;
    let mut game_title = [0u8; 12];
    cursor.read_exact(&mut game_title)?;
    let mut game_code = [0u8; 4];
    cursor.read_exact(&mut game_code)?;

    cursor.seek(SeekFrom::Start(MOVE_NAMES_OFFSET))?;
    let move_names = pointer_to_offset(cursor.read_u32::<LittleEndian>()?);

    cursor.seek(SeekFrom::Start(POKEMON_NAME_LENGTH_OFFSET))?;
    let pokemon_name_length = cursor.read_u8()?;

    cursor.seek(SeekFrom::Start(SPECIES_INFO_OFFSET))?;
    let species_info = pointer_to_offset(cursor.read_u32::<LittleEndian>()?);

    cursor.seek(SeekFrom::Start(ITEMS_OFFSET))?;
    let items = pointer_to_offset(cursor.read_u32::<LittleEndian>()?);

    cursor.seek(SeekFrom::Start(EXPANSION_MAGIC_OFFSET))?;
    let mut magic = [0u8; 6];
    cursor.read_exact(&mut magic)?;
    if &magic != EXPANSION_MAGIC {
        return Err(DecodeError::UnsupportedVersion(format!(
            "ROM has no {} header, not an expansion ROM",
            String::from_utf8_lossy(EXPANSION_MAGIC)
        )));
    }

    let major = cursor.read_u8()?;
    let minor = cursor.read_u8()?;
    let patch = cursor.read_u8()?;
    let _version_flags = cursor.read_u8()?;

    let moves_count = cursor.read_u32::<LittleEndian>()?;
    let num_species = cursor.read_u32::<LittleEndian>()?;
    let abilities_count = cursor.read_u32::<LittleEndian>()?;
    let abilities = pointer_to_offset(cursor.read_u32::<LittleEndian>()?);

    Ok(RomHeader {
        game_title: decode_ascii(&game_title),
        game_code: decode_ascii(&game_code),
        pokemon_name_length,
        move_names,
        species_info,
        items,
        abilities,
        expansion_version: (major, minor, patch),
        moves_count,
        num_species,
        abilities_count,
    })
}

// Cartridge identity fields are plain uppercase ASCII, NUL padded.
fn decode_ascii(raw: &[u8]) -> String {
    raw.iter()
        .take_while(|byte| **byte != 0)
        .map(|byte| char::from(*byte))
        .collect()
}
