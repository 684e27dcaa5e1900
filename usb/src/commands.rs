use byteorder::{ByteOrder, LittleEndian};

use crate::error::CommandError;

/// Size of a single GLM HID interrupt report.
pub const REPORT_SIZE: usize = 64;

/// GNet address targeting every monitor behind the adapter.
pub const ADDRESS_BROADCAST: u8 = 0xFF;

/// Volume is carried as attenuation below full scale, in tenths of a dB.
/// 0 is full scale (0 dB), 1300 is the -130 dB floor.
pub const ATTENUATION_MAX: u16 = 1300;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
    StayOnline,
    QueryState,
    SetVolume(f32),
    SetMute(bool),
    WakeAll,
    ShutdownAll,
}

impl Command {
    pub fn opcode(&self) -> u8 {
        match self {
            Command::StayOnline => 0x10,
            Command::QueryState => 0x11,
            Command::SetVolume(_) => 0x20,
            Command::SetMute(_) => 0x21,
            Command::WakeAll => 0x30,
            Command::ShutdownAll => 0x31,
        }
    }

    fn payload(&self) -> Vec<u8> {
        match self {
            Command::SetVolume(db) => {
                let mut word = [0; 2];
                LittleEndian::write_u16(&mut word, db_to_attenuation(*db));
                word.to_vec()
            }
            Command::SetMute(mute) => vec![u8::from(*mute)],
            _ => vec![],
        }
    }
}

/// Convert a dB value to the raw attenuation word, saturating at the
/// 0 dB ceiling and -130 dB floor.
pub fn db_to_attenuation(db: f32) -> u16 {
    let tenths = (-db * 10.0).round();
    tenths.clamp(0.0, ATTENUATION_MAX as f32) as u16
}

/// Inverse of [`db_to_attenuation`].
pub fn attenuation_to_db(raw: u16) -> f32 {
    -(raw.min(ATTENUATION_MAX) as f32) / 10.0
}

/// Build a full interrupt report for a command.
///
/// Frame layout: `[length, address, opcode, payload.., checksum]`, padded to
/// the report size. The length byte counts the framed bytes including the
/// checksum, and the checksum is an XOR over everything before it.
pub fn encode(command: Command) -> [u8; REPORT_SIZE] {
    let payload = command.payload();
    let length = 3 + payload.len() + 1;

    let mut report = [0; REPORT_SIZE];
    report[0] = length as u8;
    report[1] = ADDRESS_BROADCAST;
    report[2] = command.opcode();
    report[3..3 + payload.len()].copy_from_slice(&payload);
    report[length - 1] = checksum(&report[..length - 1]);
    report
}

/// Validate an incoming report against the opcode it should acknowledge,
/// returning the payload bytes.
pub fn decode(report: &[u8], opcode: u8) -> Result<Vec<u8>, CommandError> {
    if report.len() < 4 {
        return Err(CommandError::MalformedResponse);
    }

    let length = report[0] as usize;
    if length < 4 || length > report.len() {
        return Err(CommandError::MalformedResponse);
    }
    if report[2] != opcode {
        return Err(CommandError::MalformedResponse);
    }
    if report[length - 1] != checksum(&report[..length - 1]) {
        return Err(CommandError::MalformedResponse);
    }

    Ok(report[3..length - 1].to_vec())
}

/// Parse the payload of a state query: raw attenuation word and mute flag.
pub fn parse_state(payload: &[u8]) -> Result<(f32, bool), CommandError> {
    if payload.len() < 3 {
        return Err(CommandError::MalformedResponse);
    }

    let raw = LittleEndian::read_u16(&payload[..2]);
    Ok((attenuation_to_db(raw), payload[2] != 0))
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attenuation_word_saturates() {
        assert_eq!(db_to_attenuation(0.0), 0);
        assert_eq!(db_to_attenuation(-30.0), 300);
        assert_eq!(db_to_attenuation(-130.0), 1300);
        assert_eq!(db_to_attenuation(5.0), 0);
        assert_eq!(db_to_attenuation(-200.0), 1300);
        assert_eq!(attenuation_to_db(300), -30.0);
        assert_eq!(attenuation_to_db(u16::MAX), -130.0);
    }

    #[test]
    fn encoded_frame_layout() {
        let report = encode(Command::SetVolume(-30.0));
        assert_eq!(report[0], 6);
        assert_eq!(report[1], ADDRESS_BROADCAST);
        assert_eq!(report[2], 0x20);
        assert_eq!(LittleEndian::read_u16(&report[3..5]), 300);

        let expected = report[..5].iter().fold(0, |acc, b| acc ^ b);
        assert_eq!(report[5], expected);
        assert!(report[6..].iter().all(|b| *b == 0));
    }

    #[test]
    fn decode_round_trip() {
        let report = encode(Command::SetMute(true));
        let payload = decode(&report, 0x21).expect("valid frame");
        assert_eq!(payload, vec![1]);
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        let mut report = encode(Command::WakeAll);
        report[1] ^= 0xA5;
        assert!(decode(&report, 0x30).is_err());
    }

    #[test]
    fn decode_rejects_wrong_opcode() {
        let report = encode(Command::WakeAll);
        assert!(decode(&report, 0x31).is_err());
    }

    #[test]
    fn state_payload_parses() {
        let (db, muted) = parse_state(&[0x2C, 0x01, 0x01]).expect("valid payload");
        assert_eq!(db, -30.0);
        assert!(muted);

        assert!(parse_state(&[0x00]).is_err());
    }
}
