//! Fixed-template team-sheet writer. One block per party slot, blank-line
//! separated, in the format competitive team builders import.

use std::fmt::Write as _;
use std::io;
use std::path::Path;

use crate::assemble::PartyEntry;

const NO_ITEM: &str = "NONE";

pub fn render_team(team: &[PartyEntry]) -> String {
    let mut out = String::new();
    for entry in team {
        render_entry(&mut out, entry);
        out.push('\n');
    }
    out
}

fn render_entry(out: &mut String, entry: &PartyEntry) {
    if entry.nickname.eq_ignore_ascii_case(&entry.species) {
        out.push_str(&entry.nickname);
    } else {
        let _ = write!(out, "{} ({})", entry.nickname, entry.species);
    }
    if let Some(gender) = entry.gender {
        let _ = write!(out, " {}", gender.symbol());
    }
    if entry.item != NO_ITEM {
        let _ = write!(out, " @ {}", entry.item);
    }
    out.push('\n');

    let _ = writeln!(out, "Ability: {}", entry.ability);
    let _ = writeln!(out, "Level: {}", entry.level);
    let _ = writeln!(
        out,
        "EVs: {} HP / {} Atk / {} Def / {} SpA / {} SpD / {} Spe",
        entry.evs.hp,
        entry.evs.attack,
        entry.evs.defense,
        entry.evs.sp_attack,
        entry.evs.sp_defense,
        entry.evs.speed,
    );
    let _ = writeln!(out, "{} Nature", entry.nature);
    let _ = writeln!(
        out,
        "IVs: {} HP / {} Atk / {} Def / {} SpA / {} SpD / {} Spe",
        entry.ivs.hp,
        entry.ivs.attack,
        entry.ivs.defense,
        entry.ivs.sp_attack,
        entry.ivs.sp_defense,
        entry.ivs.speed,
    );
    for name in &entry.moves {
        let _ = writeln!(out, "- {name}");
    }
}

pub fn write_team(team: &[PartyEntry], path: impl AsRef<Path>) -> io::Result<()> {
    std::fs::write(path, render_team(team))
}
