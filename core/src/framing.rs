use crate::{
    DATA_BITS, FIRST_STOP_BIT_POSITION, FRAME_BITS, SECOND_STOP_BIT_POSITION, START_BIT_POSITION,
};

/// Check start/stop bits of an 11-bit frame and extract its 7-bit character
///
/// Positions 1..=7 are packed least significant bit first; position 8 is
/// ignored. Frames with a bad start or stop bit, or with no data bit set,
/// are line noise and yield `None`.
pub fn decode_frame(bits: &[bool; FRAME_BITS]) -> Option<u8> {
    if bits[START_BIT_POSITION] || !bits[FIRST_STOP_BIT_POSITION] || !bits[SECOND_STOP_BIT_POSITION] {
        return None;
    }

    let byte = DATA_BITS
        .enumerate()
        .filter(|&(_, pos)| bits[pos])
        .fold(0u8, |acc, (shift, _)| acc | (1 << shift));
    (byte != 0).then_some(byte)
}

/// Lay the low 7 bits of a byte out as an 11-bit frame; bit 8 stays clear
pub fn encode_frame(byte: u8) -> [bool; FRAME_BITS] {
    let mut bits = [false; FRAME_BITS];
    for (shift, pos) in DATA_BITS.enumerate() {
        bits[pos] = byte & (1 << shift) != 0;
    }
    bits[FIRST_STOP_BIT_POSITION] = true;
    bits[SECOND_STOP_BIT_POSITION] = true;
    bits
}
