//! Decoder for the single-byte character encoding used by Gen III games.
//! The games do not store ASCII; printable glyphs start at 0xA1 and follow
//! the table below. Anything outside the table decodes to a space.

const CHARSET: &[u8] =
    b"0123456789!?.-         ,  ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const CHARSET_BASE: u8 = 0xA1;

pub fn decode_text(text_data: &[u8]) -> String {
    let decoded = text_data
        .iter()
        .map(|byte| match byte.checked_sub(CHARSET_BASE) {
            Some(idx) if (idx as usize) < CHARSET.len() => CHARSET[idx as usize] as char,
            _ => ' ',
        })
        .collect::<String>();
    decoded.trim().to_string()
}
