use std::{
    io::{Cursor, Read},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{DecodeError, Result};
use crate::text::decode_text;

pub const GAME_SAVE_DATA_LENGTH: usize = 131072;
pub const SAVE_SLOT_LENGTH: usize = 57344;
pub const SECTION_SIZE: usize = 4096;
pub const NUMBER_OF_SECTIONS: usize = 14;
pub const SECTION_FOOTER_OFFSET: usize = 0x0FF4;

const SAVE_B_OFFSET: usize = 0xE000;
const PLAYTIME_OFFSET: usize = 14;

pub const TRAINER_INFO_SECTION: u16 = 0;
pub const TEAM_SECTION: u16 = 1;

/// Save-slot-side offsets that vary between ROM builds. Supplied by the
/// version layout selected at ROM-load time.
#[derive(Clone, Copy, Debug)]
pub struct SaveLayout {
    pub player_name_length: usize,
    pub gender_offset: usize,
    pub trainer_id_offset: usize,
    pub team_count_offset: usize,
    pub team_offset: usize,
}

/// One of the two redundant copies of the save data. The game alternates
/// writes between them for crash resilience.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveSlot {
    A,
    B,
}

impl std::fmt::Display for SaveSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SaveSlot::A => "A",
            SaveSlot::B => "B",
        })
    }
}

/// Last 12 bytes of every section. The checksum is parsed but not validated;
/// slot selection only needs the id and save index.
#[derive(Clone, Copy, Debug)]
pub struct SectionFooter {
    pub id: u16,
    pub checksum: u16,
    pub signature: u32,
    pub save_index: u32,
}

#[derive(Clone, Debug)]
pub struct Section {
    raw_data: Vec<u8>,
    pub footer: SectionFooter,
}

impl Section {
    fn parse(raw_data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(&raw_data[SECTION_FOOTER_OFFSET..]);
        let footer = SectionFooter {
            id: cursor.read_u16::<LittleEndian>()?,
            checksum: cursor.read_u16::<LittleEndian>()?,
            signature: cursor.read_u32::<LittleEndian>()?,
            save_index: cursor.read_u32::<LittleEndian>()?,
        };
        Ok(Section {
            raw_data: raw_data.to_vec(),
            footer,
        })
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<&[u8]> {
        if offset + len > self.raw_data.len() {
            return Err(DecodeError::OutOfRange {
                context: "save section",
                offset,
                len,
                size: self.raw_data.len(),
            });
        }
        Ok(&self.raw_data[offset..offset + len])
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.read_bytes(offset, 1)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        let mut cursor = Cursor::new(self.read_bytes(offset, 2)?);
        Ok(cursor.read_u16::<LittleEndian>()?)
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        let mut cursor = Cursor::new(self.read_bytes(offset, 4)?);
        Ok(cursor.read_u32::<LittleEndian>()?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerGender {
    Male,
    Female,
}

#[derive(Clone, Debug)]
pub struct TrainerInfo {
    pub player_name: String,
    pub player_gender: PlayerGender,
    pub trainer_id: u32,
}

/// One scanned 57344-byte save half with its 14 sections indexed by decoded
/// section id. The physical order of sections in the file rotates with every
/// save, so scan position means nothing.
#[derive(Clone, Debug)]
pub struct SaveImage {
    pub slot: SaveSlot,
    pub save_index: u32,
    pub playtime_seconds: u32,
    sections: Vec<Section>,
}

impl SaveImage {
    pub fn scan(buffer: &[u8], slot: SaveSlot) -> Result<Self> {
        if buffer.len() < SAVE_SLOT_LENGTH {
            return Err(DecodeError::MalformedSave(format!(
                "save slot {slot} is {} bytes, expected at least {SAVE_SLOT_LENGTH}",
                buffer.len()
            )));
        }

        let mut sections: Vec<Option<Section>> = vec![None; NUMBER_OF_SECTIONS];
        let mut save_index = None;
        let mut playtime_seconds = 0;

        for position in 0..NUMBER_OF_SECTIONS {
            let raw_data = &buffer[position * SECTION_SIZE..(position + 1) * SECTION_SIZE];
            let section = Section::parse(raw_data)?;
            let id = section.footer.id;

            if id as usize >= NUMBER_OF_SECTIONS {
                return Err(DecodeError::MalformedSave(format!(
                    "slot {slot}: section at position {position} has id {id}, expected 0-13"
                )));
            }
            if sections[id as usize].is_some() {
                return Err(DecodeError::MalformedSave(format!(
                    "slot {slot}: duplicate section id {id}"
                )));
            }

            if id == TRAINER_INFO_SECTION {
                let mut cursor = Cursor::new(section.read_bytes(PLAYTIME_OFFSET, 4)?);
                let hours = cursor.read_u16::<LittleEndian>()?;
                let minutes = cursor.read_u8()?;
                let seconds = cursor.read_u8()?;
                playtime_seconds =
                    u32::from(hours) * 3600 + u32::from(minutes) * 60 + u32::from(seconds);
                save_index = Some(section.footer.save_index);
            }

            sections[id as usize] = Some(section);
        }

        // 14 windows with unique in-range ids means every id is present, so
        // the trainer-info section must have been seen.
        let save_index = save_index.ok_or_else(|| {
            DecodeError::MalformedSave(format!("slot {slot}: no trainer info section"))
        })?;

        Ok(SaveImage {
            slot,
            save_index,
            playtime_seconds,
            sections: sections.into_iter().flatten().collect(),
        })
    }

    pub fn section(&self, id: u16) -> Result<&Section> {
        self.sections
            .iter()
            .find(|section| section.footer.id == id)
            .ok_or_else(|| DecodeError::MalformedSave(format!("missing section id {id}")))
    }

    pub fn trainer_info(&self, layout: &SaveLayout) -> Result<TrainerInfo> {
        let section = self.section(TRAINER_INFO_SECTION)?;
        let player_name = decode_text(section.read_bytes(0, layout.player_name_length)?);
        let player_gender = match section.read_u8(layout.gender_offset)? {
            0x00 => PlayerGender::Male,
            0x01 => PlayerGender::Female,
            byte => {
                return Err(DecodeError::MalformedSave(format!(
                    "invalid player gender byte: {byte:#x}"
                )))
            }
        };
        let trainer_id = section.read_u32(layout.trainer_id_offset)?;

        Ok(TrainerInfo {
            player_name,
            player_gender,
            trainer_id,
        })
    }

    pub fn team_count(&self, layout: &SaveLayout) -> Result<u32> {
        self.section(TEAM_SECTION)?
            .read_u32(layout.team_count_offset)
    }
}

/// Picks the authoritative save half: greater save index wins, greater
/// playtime breaks ties, slot A on a full tie.
pub fn select_current(save_a: SaveImage, save_b: SaveImage) -> SaveImage {
    log::debug!(
        "Save index A: {} ({}s), save index B: {} ({}s)",
        save_a.save_index,
        save_a.playtime_seconds,
        save_b.save_index,
        save_b.playtime_seconds
    );

    let current = if save_a.save_index != save_b.save_index {
        if save_a.save_index > save_b.save_index {
            save_a
        } else {
            save_b
        }
    } else if save_a.playtime_seconds >= save_b.playtime_seconds {
        save_a
    } else {
        save_b
    };

    log::debug!("The current save slot is {}", current.slot);
    current
}

pub struct SaveFile {
    current: SaveImage,
}

impl SaveFile {
    pub fn new(p: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(&p)?;
        let mut reader = std::io::BufReader::new(file);
        let mut full_contents = Vec::new();
        let read_len = reader.read_to_end(&mut full_contents)?;
        if read_len < GAME_SAVE_DATA_LENGTH {
            return Err(DecodeError::MalformedSave(format!(
                "invalid file length for a game save, found {read_len}, expected {GAME_SAVE_DATA_LENGTH}"
            )));
        }

        // A slot the game has never written to scans as garbage; fall back
        // to the other one.
        let save_a = SaveImage::scan(&full_contents[..SAVE_SLOT_LENGTH], SaveSlot::A);
        let save_b = SaveImage::scan(
            &full_contents[SAVE_B_OFFSET..SAVE_B_OFFSET + SAVE_SLOT_LENGTH],
            SaveSlot::B,
        );
        let current = match (save_a, save_b) {
            (Ok(save_a), Ok(save_b)) => select_current(save_a, save_b),
            (Ok(save_a), Err(err)) => {
                log::warn!("Save slot B is unreadable ({err}), using slot A");
                save_a
            }
            (Err(err), Ok(save_b)) => {
                log::warn!("Save slot A is unreadable ({err}), using slot B");
                save_b
            }
            (Err(err), Err(_)) => return Err(err),
        };

        Ok(SaveFile { current })
    }

    pub fn current(&self) -> &SaveImage {
        &self.current
    }
}
