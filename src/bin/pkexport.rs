use std::path::PathBuf;

use clap::Parser;
use pkexport::{export, rom, save::SaveFile};

#[derive(Parser)]
#[command(about = "Export the party from a Gen III expansion save as a team sheet")]
struct Opts {
    /// Path to the expansion ROM image
    #[arg(short, long)]
    rom: PathBuf,
    /// Path to the 128 KiB save file
    #[arg(short, long)]
    sav: PathBuf,
    /// Expansion version the ROM was built from
    #[arg(long, default_value = "1.8.0")]
    game_version: String,
    /// Where to write the team sheet
    #[arg(short, long, default_value = "CompetitiveTeam.txt")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let layout = rom::layout_for(&opts.game_version)?;
    let rom_contents = std::fs::read(&opts.rom)?;
    let rom_data = rom::read_rom(&rom_contents, &opts.game_version)?;

    let save_file = SaveFile::new(&opts.sav)?;
    let current = save_file.current();
    log::info!("Using save slot {}", current.slot);

    let team = pkexport::decode_party(current, &rom_data, layout)?;
    export::write_team(&team, &opts.out)?;
    println!(
        "Wrote {} party members to {}",
        team.len(),
        opts.out.display()
    );

    Ok(())
}
