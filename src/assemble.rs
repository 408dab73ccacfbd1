//! Joins decrypted party members against the ROM's lookup tables to produce
//! self-contained, display-ready entries. Pure reads; the entries own their
//! strings and outlive both the save and the ROM buffers.

use crate::error::Result;
use crate::party::{EvSpread, IvSpread, Pokemon};
use crate::rom::{RomData, SpeciesRecord};

pub const NATURES: [&str; 25] = [
    "Hardy", "Lonely", "Brave", "Adamant", "Naughty", "Bold", "Docile", "Relaxed", "Impish", "Lax",
    "Timid", "Hasty", "Serious", "Jolly", "Naive", "Modest", "Mild", "Quiet", "Bashful", "Rash",
    "Calm", "Gentle", "Sassy", "Careful", "Quirky",
];

// Species gender-ratio bytes with only one possible outcome
const GENDER_RATIO_ALL_MALE: u8 = 0x00;
const GENDER_RATIO_ALL_FEMALE: u8 = 0xFE;
const GENDER_RATIO_GENDERLESS: u8 = 0xFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn symbol(&self) -> &'static str {
        match self {
            Gender::Male => "(M)",
            Gender::Female => "(F)",
        }
    }
}

/// A fully resolved party slot, ready for the exporter.
#[derive(Clone, Debug)]
pub struct PartyEntry {
    pub nickname: String,
    pub species: String,
    pub gender: Option<Gender>,
    pub item: String,
    pub ability: String,
    pub level: u8,
    pub evs: EvSpread,
    pub nature: &'static str,
    pub ivs: IvSpread,
    pub moves: Vec<String>,
}

pub fn assemble(pokemon: &Pokemon, rom: &RomData) -> Result<PartyEntry> {
    let species = rom.species(pokemon.species_id)?;
    let item = rom.item(pokemon.held_item_id)?;
    let ability_id = species.abilities[pokemon.ivs.ability_slot as usize];
    let ability = rom.ability(ability_id)?;
    let moves = pokemon
        .move_ids
        .iter()
        .map(|&id| rom.move_name(id).map(str::to_string))
        .collect::<Result<Vec<_>>>()?;

    log::trace!(
        "Assembled {} (species {}, ability slot {})",
        species.name,
        pokemon.species_id,
        pokemon.ivs.ability_slot
    );

    Ok(PartyEntry {
        nickname: pokemon.nickname.clone(),
        species: species.name.clone(),
        gender: classify_gender(species, pokemon.gender_value),
        item: item.name.clone(),
        ability: ability.name.clone(),
        level: pokemon.level,
        evs: pokemon.evs,
        nature: NATURES[pokemon.nature_index as usize],
        ivs: pokemon.ivs,
        moves,
    })
}

/// Single-gender and genderless species get no symbol; everything else
/// compares the personality's low byte against a threshold derived from the
/// ratio byte.
fn classify_gender(species: &SpeciesRecord, gender_value: u8) -> Option<Gender> {
    match species.gender_ratio {
        GENDER_RATIO_ALL_MALE | GENDER_RATIO_ALL_FEMALE | GENDER_RATIO_GENDERLESS => None,
        ratio => {
            let threshold = 224.0 * f32::from(ratio) / 100.0;
            if f32::from(gender_value) > threshold {
                Some(Gender::Male)
            } else {
                Some(Gender::Female)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::BaseStats;

    fn species_with_ratio(gender_ratio: u8) -> SpeciesRecord {
        SpeciesRecord {
            id: 1,
            name: "BULBASAUR".to_string(),
            national_dex_number: 1,
            stats: BaseStats {
                hp: 45,
                attack: 49,
                defense: 49,
                speed: 45,
                sp_attack: 65,
                sp_defense: 65,
            },
            types: vec!["Grass", "Poison"],
            abilities: [1, 0, 0],
            category: "SEED".to_string(),
            gender_ratio,
        }
    }

    #[test]
    fn unambiguous_ratios_have_no_symbol() {
        for ratio in [0x00, 0xFE, 0xFF] {
            assert_eq!(classify_gender(&species_with_ratio(ratio), 200), None);
        }
    }

    #[test]
    fn threshold_splits_male_and_female() {
        // ratio 31 -> threshold 69.44
        let species = species_with_ratio(31);
        assert_eq!(classify_gender(&species, 70), Some(Gender::Male));
        assert_eq!(classify_gender(&species, 69), Some(Gender::Female));
        assert_eq!(classify_gender(&species, 0), Some(Gender::Female));
    }

    #[test]
    fn nature_table_has_25_entries_starting_at_hardy() {
        assert_eq!(NATURES.len(), 25);
        assert_eq!(NATURES[0], "Hardy");
        assert_eq!(NATURES[24], "Quirky");
    }
}
