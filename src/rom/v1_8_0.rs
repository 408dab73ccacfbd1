//! Record layouts for expansion release 1.8.0. Item and ability records
//! carry trailing padding the compiler adds for alignment, so the walk
//! stride is larger than the packed field sizes.

use std::collections::HashMap;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use super::{
    header, rom_slice, type_name, AbilityRecord, BaseStats, ItemRecord, RomHeader, SpeciesRecord,
    VersionLayout,
};
use crate::error::Result;
use crate::save::SaveLayout;
use crate::text::decode_text;

pub(super) struct Layout;

const SAVE_LAYOUT: SaveLayout = SaveLayout {
    player_name_length: 7,
    gender_offset: 8,
    trainer_id_offset: 10,
    team_count_offset: 0x234,
    team_offset: 0x238,
};

const SPECIES_RECORD_SIZE: usize = 160;
const SPECIES_TYPES_OFFSET: usize = 6;
const SPECIES_GENDER_RATIO_OFFSET: usize = 18;
const SPECIES_ABILITIES_OFFSET: usize = 24;
const SPECIES_CATEGORY_OFFSET: usize = 31;
const SPECIES_CATEGORY_LENGTH: usize = 13;
const SPECIES_NAME_OFFSET: usize = 44;
const SPECIES_DEX_NUMBER_OFFSET: usize = 56;

// The item count is not in the expansion header; 1.8.0 ships exactly this
// many.
const ITEM_COUNT: u16 = 846;
const ITEM_RECORD_SIZE: usize = 38 + 6;
const ITEM_NAME_OFFSET: usize = 19;
const ITEM_NAME_LENGTH: usize = 13;

const MOVE_NAME_LENGTH: usize = 13;

const ABILITY_RECORD_SIZE: usize = 19 + 9;
const ABILITY_NAME_LENGTH: usize = 13;

impl VersionLayout for Layout {
    fn save_layout(&self) -> &'static SaveLayout {
        &SAVE_LAYOUT
    }

    fn read_header(&self, rom: &[u8]) -> Result<RomHeader> {
        header::decode_header(rom)
    }

    fn read_species(&self, rom: &[u8], header: &RomHeader) -> Result<HashMap<u16, SpeciesRecord>> {
        let name_length = header.pokemon_name_length as usize + 1;
        let mut species = HashMap::new();
        // Save-side species ids are u16, so records past u16::MAX are
        // unreachable anyway.
        let count = u16::try_from(header.num_species).unwrap_or(u16::MAX);
        for id in 0..count {
            let offset = header.species_info as usize + SPECIES_RECORD_SIZE * id as usize;
            let record = rom_slice(rom, offset, SPECIES_RECORD_SIZE, "species table")?;
            species.insert(id, parse_species(record, name_length, id)?);
        }
        Ok(species)
    }

    fn read_items(&self, rom: &[u8], header: &RomHeader) -> Result<HashMap<u16, ItemRecord>> {
        let mut items = HashMap::new();
        for id in 0..ITEM_COUNT {
            let offset = header.items as usize + ITEM_RECORD_SIZE * id as usize;
            let record = rom_slice(rom, offset, ITEM_RECORD_SIZE, "item table")?;
            let mut cursor = Cursor::new(record);
            let price = cursor.read_u32::<LittleEndian>()?;
            let name = decode_text(&record[ITEM_NAME_OFFSET..ITEM_NAME_OFFSET + ITEM_NAME_LENGTH]);
            items.insert(id, ItemRecord { id, name, price });
        }
        Ok(items)
    }

    fn read_moves(&self, rom: &[u8], header: &RomHeader) -> Result<Vec<String>> {
        (0..header.moves_count as usize)
            .map(|idx| {
                let offset = header.move_names as usize + MOVE_NAME_LENGTH * idx;
                Ok(decode_text(rom_slice(
                    rom,
                    offset,
                    MOVE_NAME_LENGTH,
                    "move name table",
                )?))
            })
            .collect()
    }

    fn read_abilities(
        &self,
        rom: &[u8],
        header: &RomHeader,
    ) -> Result<HashMap<u16, AbilityRecord>> {
        let mut abilities = HashMap::new();
        let count = u16::try_from(header.abilities_count).unwrap_or(u16::MAX);
        for id in 0..count {
            let offset = header.abilities as usize + ABILITY_RECORD_SIZE * id as usize;
            let record = rom_slice(rom, offset, ABILITY_RECORD_SIZE, "ability table")?;
            let name = decode_text(&record[..ABILITY_NAME_LENGTH]);
            abilities.insert(id, AbilityRecord { id, name });
        }
        Ok(abilities)
    }
}

fn parse_species(record: &[u8], name_length: usize, id: u16) -> Result<SpeciesRecord> {
    let mut cursor = Cursor::new(record);
    let stats = BaseStats {
        hp: cursor.read_u8()?,
        attack: cursor.read_u8()?,
        defense: cursor.read_u8()?,
        speed: cursor.read_u8()?,
        sp_attack: cursor.read_u8()?,
        sp_defense: cursor.read_u8()?,
    };

    let primary_type = record[SPECIES_TYPES_OFFSET];
    let secondary_type = record[SPECIES_TYPES_OFFSET + 1];
    let types = if primary_type == secondary_type {
        vec![type_name(primary_type)]
    } else {
        vec![type_name(primary_type), type_name(secondary_type)]
    };

    let mut cursor = Cursor::new(&record[SPECIES_ABILITIES_OFFSET..]);
    let abilities = [
        cursor.read_u16::<LittleEndian>()?,
        cursor.read_u16::<LittleEndian>()?,
        cursor.read_u16::<LittleEndian>()?,
    ];

    let category = decode_text(
        &record[SPECIES_CATEGORY_OFFSET..SPECIES_CATEGORY_OFFSET + SPECIES_CATEGORY_LENGTH],
    );
    // The name length comes from a header byte, so it can claim more than
    // the record holds.
    let name = decode_text(rom_slice(
        record,
        SPECIES_NAME_OFFSET,
        name_length,
        "species record",
    )?);
    let gender_ratio = record[SPECIES_GENDER_RATIO_OFFSET];

    let mut cursor = Cursor::new(&record[SPECIES_DEX_NUMBER_OFFSET..]);
    let national_dex_number = cursor.read_u16::<LittleEndian>()?;

    Ok(SpeciesRecord {
        id,
        name,
        national_dex_number,
        stats,
        types,
        abilities,
        category,
        gender_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ByteOrder;
    use crate::rom::read_rom;

    // Byte values for the game code page: 'A' is 0xBB, 'a' is 0xD5.
    fn encode_text(text: &str, length: usize) -> Vec<u8> {
        let mut out = vec![0xFFu8; length];
        for (idx, ch) in text.chars().enumerate() {
            let byte = match ch {
                'A'..='Z' => 0xBB + (ch as u8 - b'A'),
                'a'..='z' => 0xD5 + (ch as u8 - b'a'),
                '0'..='9' => 0xA1 + (ch as u8 - b'0'),
                '-' => 0xAE,
                _ => 0x00,
            };
            out[idx] = byte;
        }
        out
    }

    fn synthetic_rom() -> Vec<u8> {
        const MOVES: usize = 0x1000;
        const SPECIES: usize = 0x1100;
        const ABILITIES: usize = 0x1400;
        const ITEMS: usize = 0x1600;

        let mut rom = vec![0u8; ITEMS + ITEM_RECORD_SIZE * ITEM_COUNT as usize];
        rom[0x204..0x20A].copy_from_slice(header::EXPANSION_MAGIC);
        rom[0x20A] = 1;
        rom[0x20B] = 8;
        rom[0x176] = 10;
        LittleEndian::write_u32(&mut rom[0x148..], MOVES as u32);
        LittleEndian::write_u32(&mut rom[0x1B9..], SPECIES as u32);
        LittleEndian::write_u32(&mut rom[0x1C5..], ITEMS as u32);
        LittleEndian::write_u32(&mut rom[0x20E..], 2); // movesCount
        LittleEndian::write_u32(&mut rom[0x212..], 2); // numSpecies
        LittleEndian::write_u32(&mut rom[0x216..], 2); // abilitiesCount
        LittleEndian::write_u32(&mut rom[0x21A..], ABILITIES as u32);

        rom[MOVES..MOVES + MOVE_NAME_LENGTH].copy_from_slice(&encode_text("-", MOVE_NAME_LENGTH));
        rom[MOVES + MOVE_NAME_LENGTH..MOVES + 2 * MOVE_NAME_LENGTH]
            .copy_from_slice(&encode_text("TACKLE", MOVE_NAME_LENGTH));

        let record = &mut rom[SPECIES + SPECIES_RECORD_SIZE..SPECIES + 2 * SPECIES_RECORD_SIZE];
        record[..6].copy_from_slice(&[45, 49, 49, 45, 65, 65]);
        record[SPECIES_TYPES_OFFSET] = 12; // Grass
        record[SPECIES_TYPES_OFFSET + 1] = 3; // Poison
        record[SPECIES_GENDER_RATIO_OFFSET] = 31;
        LittleEndian::write_u16(&mut record[SPECIES_ABILITIES_OFFSET..], 1);
        record[SPECIES_CATEGORY_OFFSET..SPECIES_CATEGORY_OFFSET + SPECIES_CATEGORY_LENGTH]
            .copy_from_slice(&encode_text("SEED", SPECIES_CATEGORY_LENGTH));
        record[SPECIES_NAME_OFFSET..SPECIES_NAME_OFFSET + 11]
            .copy_from_slice(&encode_text("BULBASAUR", 11));
        LittleEndian::write_u16(&mut record[SPECIES_DEX_NUMBER_OFFSET..], 1);

        let record = &mut rom[ABILITIES + ABILITY_RECORD_SIZE..ABILITIES + 2 * ABILITY_RECORD_SIZE];
        record[..ABILITY_NAME_LENGTH].copy_from_slice(&encode_text("STENCH", ABILITY_NAME_LENGTH));

        rom[ITEMS + ITEM_NAME_OFFSET..ITEMS + ITEM_NAME_OFFSET + ITEM_NAME_LENGTH]
            .copy_from_slice(&encode_text("NONE", ITEM_NAME_LENGTH));
        let oran = ITEMS + ITEM_RECORD_SIZE;
        LittleEndian::write_u32(&mut rom[oran..], 200);
        rom[oran + ITEM_NAME_OFFSET..oran + ITEM_NAME_OFFSET + ITEM_NAME_LENGTH]
            .copy_from_slice(&encode_text("ORAN BERRY", ITEM_NAME_LENGTH));

        rom
    }

    #[test]
    fn reads_all_four_tables() {
        let rom_data = read_rom(&synthetic_rom(), "1.8.0").unwrap();

        let species = rom_data.species(1).unwrap();
        assert_eq!(species.name, "BULBASAUR");
        assert_eq!(species.national_dex_number, 1);
        assert_eq!(species.types, vec!["Grass", "Poison"]);
        assert_eq!(species.abilities[0], 1);
        assert_eq!(species.category, "SEED");
        assert_eq!(species.gender_ratio, 31);
        assert_eq!(species.stats.hp, 45);
        assert_eq!(species.stats.sp_defense, 65);

        assert_eq!(rom_data.move_name(1).unwrap(), "TACKLE");
        assert_eq!(rom_data.item(0).unwrap().name, "NONE");
        let oran = rom_data.item(1).unwrap();
        assert_eq!(oran.name, "ORAN BERRY");
        assert_eq!(oran.price, 200);
        assert_eq!(rom_data.ability(1).unwrap().name, "STENCH");
    }

    #[test]
    fn matching_type_bytes_collapse_to_one_type() {
        let mut rom = synthetic_rom();
        let species = 0x1100 + SPECIES_RECORD_SIZE;
        rom[species + SPECIES_TYPES_OFFSET + 1] = 12;
        let rom_data = read_rom(&rom, "1.8.0").unwrap();
        assert_eq!(rom_data.species(1).unwrap().types, vec!["Grass"]);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let rom_data = read_rom(&synthetic_rom(), "1.8.0").unwrap();
        assert!(rom_data.species(999).is_err());
        assert!(rom_data.move_name(999).is_err());
        assert!(rom_data.ability(999).is_err());
        assert!(rom_data.item(999).is_err());
    }

    #[test]
    fn truncated_table_is_out_of_range() {
        let rom = synthetic_rom();
        let truncated = &rom[..0x1200];
        assert!(matches!(
            read_rom(truncated, "1.8.0"),
            Err(crate::error::DecodeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn name_length_past_the_record_end_is_out_of_range() {
        let mut rom = synthetic_rom();
        rom[0x176] = 200; // pokemonNameLength1 claims more than a record holds
        assert!(matches!(
            read_rom(&rom, "1.8.0"),
            Err(crate::error::DecodeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn species_counts_beyond_u16_are_clamped() {
        let header = RomHeader {
            game_title: String::new(),
            game_code: String::new(),
            pokemon_name_length: 10,
            move_names: 0,
            species_info: 0,
            items: 0,
            abilities: 0,
            expansion_version: (1, 8, 0),
            moves_count: 0,
            num_species: 70_000,
            abilities_count: 70_000,
        };

        let rom = vec![0u8; SPECIES_RECORD_SIZE * u16::MAX as usize];
        let species = Layout.read_species(&rom, &header).unwrap();
        assert_eq!(species.len(), u16::MAX as usize);

        let rom = vec![0u8; ABILITY_RECORD_SIZE * u16::MAX as usize];
        let abilities = Layout.read_abilities(&rom, &header).unwrap();
        assert_eq!(abilities.len(), u16::MAX as usize);
    }
}
