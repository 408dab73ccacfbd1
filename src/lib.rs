//! Decoder for Gen III expansion save files and the ROM reference tables
//! needed to turn a saved party back into names: pick the authoritative save
//! slot, decrypt each party member's substructures, and join the decoded ids
//! against the species/item/move/ability tables baked into the ROM.

pub mod assemble;
pub mod error;
pub mod export;
pub mod party;
pub mod rom;
pub mod save;
pub mod text;

pub use assemble::PartyEntry;
pub use error::{DecodeError, Result};
pub use party::Pokemon;
pub use rom::RomData;
pub use save::{SaveFile, SaveImage};

/// Decodes and resolves the whole party of an already-selected save image.
pub fn decode_party(
    save: &SaveImage,
    rom_data: &RomData,
    layout: &'static dyn rom::VersionLayout,
) -> Result<Vec<PartyEntry>> {
    let save_layout = layout.save_layout();
    let trainer_info = save.trainer_info(save_layout)?;
    let team_count = save.team_count(save_layout)?;
    log::info!(
        "Decoding {} party members for {}",
        team_count,
        trainer_info.player_name
    );

    let team_section = save.section(save::TEAM_SECTION)?;
    let party = party::decrypt_party(
        team_section,
        save_layout.team_offset,
        trainer_info.trainer_id,
        team_count,
    )?;

    party
        .iter()
        .map(|pokemon| assemble::assemble(pokemon, rom_data))
        .collect()
}
