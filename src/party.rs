//! Decryption and extraction of the party members stored in the team
//! section. Each 100-byte member hides its substance in four 12-byte
//! substructures, XOR encrypted with `personality ^ trainer_id` and shuffled
//! into one of 24 orders keyed off the personality value.

use std::io::Cursor;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use crate::error::{DecodeError, Result};
use crate::save::{Section, SECTION_FOOTER_OFFSET};
use crate::text::decode_text;

pub const PARTY_MEMBER_SIZE: usize = 100;

const NICKNAME_OFFSET: usize = 8;
const NICKNAME_LENGTH: usize = 10;
const CHECKSUM_OFFSET: usize = 28;
const SUBSTRUCTURE_OFFSET: usize = 32;
const SUBSTRUCTURE_SIZE: usize = 12;
const LEVEL_OFFSET: usize = 84;

/// The 24 ways the game shuffles the Growth, Attack, EVs/condition and Misc
/// substructures, indexed by `personality % 24`.
pub const SUBSTRUCTURE_ORDERS: [&str; 24] = [
    "GAEM", "GAME", "GEAM", "GEMA", "GMAE", "GMEA", "AGEM", "AGME", "AEGM", "AEMG", "AMGE", "AMEG",
    "EGAM", "EGMA", "EAGM", "EAMG", "EMGA", "EMAG", "MGAE", "MGEA", "MAGE", "MAEG", "MEGA", "MEAG",
];

pub fn substructure_order(personality: u32) -> &'static str {
    SUBSTRUCTURE_ORDERS[(personality % 24) as usize]
}

/// Six individual values plus the ability-slot flag, unpacked from the Misc
/// substructure's bit field: five bits per stat from the least significant
/// bit up, ability slot at bit 30.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IvSpread {
    pub hp: u8,
    pub attack: u8,
    pub defense: u8,
    pub speed: u8,
    pub sp_attack: u8,
    pub sp_defense: u8,
    pub ability_slot: u8,
}

impl IvSpread {
    pub fn from_word(word: u32) -> Self {
        let iv = |idx: u32| ((word >> (5 * idx)) & 0b11111) as u8;
        IvSpread {
            hp: iv(0),
            attack: iv(1),
            defense: iv(2),
            speed: iv(3),
            sp_attack: iv(4),
            sp_defense: iv(5),
            ability_slot: ((word >> 30) & 0b1) as u8,
        }
    }
}

/// Effort values in their on-disk order: speed sits before the special
/// stats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvSpread {
    pub hp: u8,
    pub attack: u8,
    pub defense: u8,
    pub speed: u8,
    pub sp_attack: u8,
    pub sp_defense: u8,
}

/// One decrypted party member, all fields still integer ids. Resolving them
/// against the ROM tables is the assembler's job.
#[derive(Clone, Debug)]
pub struct Pokemon {
    pub personality: u32,
    pub nickname: String,
    pub checksum: u16,
    pub level: u8,
    pub species_id: u16,
    pub held_item_id: u16,
    pub experience: u32,
    pub move_ids: [u16; 4],
    pub evs: EvSpread,
    pub ivs: IvSpread,
    /// `personality % 25`, distinct from the `% 24` substructure-order
    /// index.
    pub nature_index: u8,
    /// Low byte of the personality value, compared against the species
    /// gender ratio.
    pub gender_value: u8,
}

pub fn decrypt_party(
    team_section: &Section,
    team_offset: usize,
    trainer_id: u32,
    count: u32,
) -> Result<Vec<Pokemon>> {
    let capacity = (SECTION_FOOTER_OFFSET - team_offset) / PARTY_MEMBER_SIZE;
    if count as usize > capacity {
        return Err(DecodeError::OutOfRange {
            context: "team section",
            offset: team_offset,
            len: count as usize * PARTY_MEMBER_SIZE,
            size: SECTION_FOOTER_OFFSET - team_offset,
        });
    }

    (0..count as usize)
        .map(|slot| {
            let offset = team_offset + slot * PARTY_MEMBER_SIZE;
            let raw = team_section.read_bytes(offset, PARTY_MEMBER_SIZE)?;
            decrypt_member(raw, trainer_id)
        })
        .collect()
}

fn decrypt_member(raw: &[u8], trainer_id: u32) -> Result<Pokemon> {
    let personality = LittleEndian::read_u32(&raw[..4]);
    let decryption_key = personality ^ trainer_id;
    let order = substructure_order(personality);
    log::trace!("Personality {personality:#010x}, substructure order {order}");

    let mut growth = [0u8; SUBSTRUCTURE_SIZE];
    let mut attack = [0u8; SUBSTRUCTURE_SIZE];
    let mut condition = [0u8; SUBSTRUCTURE_SIZE];
    let mut misc = [0u8; SUBSTRUCTURE_SIZE];
    for (position, label) in order.chars().enumerate() {
        let start = SUBSTRUCTURE_OFFSET + position * SUBSTRUCTURE_SIZE;
        let block = decrypt_substructure(&raw[start..start + SUBSTRUCTURE_SIZE], decryption_key);
        match label {
            'G' => growth = block,
            'A' => attack = block,
            'E' => condition = block,
            'M' => misc = block,
            _ => unreachable!("substructure orders only contain G, A, E and M"),
        }
    }

    let mut cursor = Cursor::new(&growth[..]);
    let species_id = cursor.read_u16::<LittleEndian>()?;
    let held_item_id = cursor.read_u16::<LittleEndian>()?;
    let experience = cursor.read_u32::<LittleEndian>()?;

    let mut move_ids = [0u16; 4];
    LittleEndian::read_u16_into(&attack[..8], &mut move_ids);

    let evs = EvSpread {
        hp: condition[0],
        attack: condition[1],
        defense: condition[2],
        speed: condition[3],
        sp_attack: condition[4],
        sp_defense: condition[5],
    };

    let ivs = IvSpread::from_word(LittleEndian::read_u32(&misc[4..8]));

    Ok(Pokemon {
        personality,
        nickname: decode_text(&raw[NICKNAME_OFFSET..NICKNAME_OFFSET + NICKNAME_LENGTH]),
        checksum: LittleEndian::read_u16(&raw[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 2]),
        level: raw[LEVEL_OFFSET],
        species_id,
        held_item_id,
        experience,
        move_ids,
        evs,
        ivs,
        nature_index: (personality % 25) as u8,
        gender_value: (personality & 0xFF) as u8,
    })
}

/// XOR keystream over the three little-endian words of a substructure. Its
/// own inverse, so the same routine encrypts.
pub fn decrypt_substructure(block: &[u8], key: u32) -> [u8; SUBSTRUCTURE_SIZE] {
    let mut decrypted = [0u8; SUBSTRUCTURE_SIZE];
    for (idx, chunk) in block.chunks_exact(4).enumerate() {
        let word = LittleEndian::read_u32(chunk) ^ key;
        LittleEndian::write_u32(&mut decrypted[idx * 4..idx * 4 + 4], word);
    }
    decrypted
}
