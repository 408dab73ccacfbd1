//! Reader for the reference tables baked into an expansion ROM. All party
//! fields in the save are integer ids; the ROM is the only place their names
//! live. Table offsets come from the expansion header, so the same decoders
//! work across ROM builds; what does vary between expansion versions (record
//! sizes, sub-offsets) lives behind the `VersionLayout` registry.

pub mod header;
mod v1_8_0;

use std::collections::HashMap;

use crate::error::{DecodeError, Result};
use crate::save::SaveLayout;
pub use header::RomHeader;

/// Expansion releases older than this predate the header fields the table
/// decoders depend on.
pub const MINIMUM_EXPANSION_VERSION: (u8, u8, u8) = (1, 8, 0);

const TYPE_NAMES: [&str; 19] = [
    "Normal", "Fighting", "Flying", "Poison", "Ground", "Rock", "Bug", "Ghost", "Steel", "Mystery",
    "Fire", "Water", "Grass", "Electric", "Psychic", "Ice", "Dragon", "Dark", "Fairy",
];

pub fn type_name(type_id: u8) -> &'static str {
    TYPE_NAMES.get(type_id as usize).copied().unwrap_or("???")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaseStats {
    pub hp: u8,
    pub attack: u8,
    pub defense: u8,
    pub speed: u8,
    pub sp_attack: u8,
    pub sp_defense: u8,
}

#[derive(Clone, Debug)]
pub struct SpeciesRecord {
    pub id: u16,
    pub name: String,
    pub national_dex_number: u16,
    pub stats: BaseStats,
    /// One entry for a pure type, two for a dual type.
    pub types: Vec<&'static str>,
    pub abilities: [u16; 3],
    pub category: String,
    pub gender_ratio: u8,
}

#[derive(Clone, Debug)]
pub struct ItemRecord {
    pub id: u16,
    pub name: String,
    pub price: u32,
}

#[derive(Clone, Debug)]
pub struct AbilityRecord {
    pub id: u16,
    pub name: String,
}

/// All lookup tables for one ROM. Read-only once constructed, so it can be
/// shared freely across threads decoding different saves.
#[derive(Clone, Debug)]
pub struct RomData {
    pub header: RomHeader,
    species: HashMap<u16, SpeciesRecord>,
    items: HashMap<u16, ItemRecord>,
    move_names: Vec<String>,
    abilities: HashMap<u16, AbilityRecord>,
}

impl RomData {
    pub fn species(&self, id: u16) -> Result<&SpeciesRecord> {
        self.species.get(&id).ok_or(DecodeError::UnknownId {
            kind: "species",
            id,
        })
    }

    pub fn item(&self, id: u16) -> Result<&ItemRecord> {
        self.items
            .get(&id)
            .ok_or(DecodeError::UnknownId { kind: "item", id })
    }

    pub fn move_name(&self, id: u16) -> Result<&str> {
        self.move_names
            .get(id as usize)
            .map(String::as_str)
            .ok_or(DecodeError::UnknownId { kind: "move", id })
    }

    pub fn ability(&self, id: u16) -> Result<&AbilityRecord> {
        self.abilities.get(&id).ok_or(DecodeError::UnknownId {
            kind: "ability",
            id,
        })
    }
}

/// Capability set for one supported expansion version: where things sit in
/// the save slot and how the ROM's records are shaped. Selected once at
/// ROM-load time.
pub trait VersionLayout: Sync {
    fn save_layout(&self) -> &'static SaveLayout;
    fn read_header(&self, rom: &[u8]) -> Result<RomHeader>;
    fn read_species(&self, rom: &[u8], header: &RomHeader) -> Result<HashMap<u16, SpeciesRecord>>;
    fn read_items(&self, rom: &[u8], header: &RomHeader) -> Result<HashMap<u16, ItemRecord>>;
    fn read_moves(&self, rom: &[u8], header: &RomHeader) -> Result<Vec<String>>;
    fn read_abilities(&self, rom: &[u8], header: &RomHeader)
        -> Result<HashMap<u16, AbilityRecord>>;
}

pub fn layout_for(version: &str) -> Result<&'static dyn VersionLayout> {
    let triple = parse_version(version)?;
    if triple < MINIMUM_EXPANSION_VERSION {
        return Err(version_too_old(triple));
    }
    match version {
        "1.8.0" => Ok(&v1_8_0::Layout),
        _ => Err(DecodeError::UnsupportedVersion(version.to_string())),
    }
}

pub fn read_rom(rom: &[u8], version: &str) -> Result<RomData> {
    let layout = layout_for(version)?;
    let header = layout.read_header(rom)?;
    log::debug!(
        "ROM {} ({}), expansion version {}.{}.{}",
        header.game_title,
        header.game_code,
        header.expansion_version.0,
        header.expansion_version.1,
        header.expansion_version.2
    );
    if header.expansion_version < MINIMUM_EXPANSION_VERSION {
        return Err(version_too_old(header.expansion_version));
    }

    let species = layout.read_species(rom, &header)?;
    let items = layout.read_items(rom, &header)?;
    let move_names = layout.read_moves(rom, &header)?;
    let abilities = layout.read_abilities(rom, &header)?;
    log::debug!(
        "Read {} species, {} items, {} moves, {} abilities",
        species.len(),
        items.len(),
        move_names.len(),
        abilities.len()
    );

    Ok(RomData {
        header,
        species,
        items,
        move_names,
        abilities,
    })
}

fn parse_version(version: &str) -> Result<(u8, u8, u8)> {
    let mut components = version.split('.');
    let mut next = || {
        components
            .next()
            .and_then(|component| component.parse::<u8>().ok())
            .ok_or_else(|| DecodeError::UnsupportedVersion(version.to_string()))
    };
    let triple = (next()?, next()?, next()?);
    if components.next().is_some() {
        return Err(DecodeError::UnsupportedVersion(version.to_string()));
    }
    Ok(triple)
}

fn version_too_old(found: (u8, u8, u8)) -> DecodeError {
    let (major, minor, patch) = found;
    let (min_major, min_minor, min_patch) = MINIMUM_EXPANSION_VERSION;
    DecodeError::VersionTooOld {
        found: format!("{major}.{minor}.{patch}"),
        minimum: format!("{min_major}.{min_minor}.{min_patch}"),
    }
}

pub(crate) fn rom_slice<'a>(
    rom: &'a [u8],
    offset: usize,
    len: usize,
    context: &'static str,
) -> Result<&'a [u8]> {
    match offset.checked_add(len) {
        Some(end) if end <= rom.len() => Ok(&rom[offset..end]),
        _ => Err(DecodeError::OutOfRange {
            context,
            offset,
            len,
            size: rom.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_below_minimum_are_too_old_before_any_table_walk() {
        // An empty buffer proves no table (or header) read happened first
        let err = read_rom(&[], "0.0.1").unwrap_err();
        assert!(matches!(err, DecodeError::VersionTooOld { .. }));
        if let DecodeError::VersionTooOld { found, minimum } = err {
            assert_eq!(found, "0.0.1");
            assert_eq!(minimum, "1.8.0");
        }
    }

    #[test]
    fn unknown_version_keys_are_unsupported() {
        assert!(matches!(
            layout_for("9.9.9"),
            Err(DecodeError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            layout_for("expansion"),
            Err(DecodeError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            layout_for("1.8"),
            Err(DecodeError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn registered_version_resolves() {
        assert!(layout_for("1.8.0").is_ok());
    }

    #[test]
    fn dual_and_pure_type_names() {
        assert_eq!(type_name(0), "Normal");
        assert_eq!(type_name(18), "Fairy");
        assert_eq!(type_name(200), "???");
    }
}
