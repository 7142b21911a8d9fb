//! Tri-state RF codes for remote-controlled power sockets.
//!
//! A stored code is 12 tri-state digits. Each digit expands to two bits of the transmitted 24-bit word:
//!
//! | Digit | Nibble | Bits |
//! | ----- | ------ | ---- |
//! | LOW   | `0x0`  | `01` |
//! | HIGH  | `0x1`  | `10` |
//! | FLOAT | `0xF`  | `00` |

use byteorder::{BigEndian, ByteOrder};

use super::{errors::ActuationError, hal::PulseLine, station::{RFStationData, StationType}};

/// Number of tri-state digits per code
pub const CODE_DIGITS: usize = 12;

/// Number of bits transmitted per code
pub const CODE_BITS: usize = CODE_DIGITS * 2;

/// Number of times each code is sent
pub const RF_REPEAT_COUNT: usize = 15;

/// Longest accepted pulse length (microseconds)
pub const MAX_PULSE_LENGTH: u32 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriState {
    Low,
    High,
    Float,
}

impl TriState {
    fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0x0 => Some(TriState::Low),
            0x1 => Some(TriState::High),
            0xF => Some(TriState::Float),
            _ => None,
        }
    }

    fn nibble(&self) -> u8 {
        match self {
            TriState::Low => 0x0,
            TriState::High => 0x1,
            TriState::Float => 0xF,
        }
    }

    fn bits(&self) -> u32 {
        match self {
            TriState::Low => 0b01,
            TriState::High => 0b10,
            TriState::Float => 0b00,
        }
    }

    fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0b01 => Some(TriState::Low),
            0b10 => Some(TriState::High),
            0b00 => Some(TriState::Float),
            _ => None,
        }
    }
}

/// Parsed RF station code, ready for transmission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RfCode {
    /// 24-bit value
    pub on: u32,
    /// 24-bit value
    pub off: u32,
    /// Pulse length (microseconds)
    pub pulse_length: u32,
}

impl RfCode {
    pub fn code(&self, turn_on: bool) -> u32 {
        if turn_on {
            self.on
        } else {
            self.off
        }
    }
}

/// Split a packed code into its tri-state digits (high nibble first)
pub fn digits(packed: &[u8; 6]) -> Result<[TriState; CODE_DIGITS], ActuationError> {
    let mut digits = [TriState::Float; CODE_DIGITS];

    for (i, byte) in packed.iter().enumerate() {
        digits[2 * i] = TriState::from_nibble(byte >> 4).ok_or_else(invalid_digit)?;
        digits[2 * i + 1] = TriState::from_nibble(byte & 0x0F).ok_or_else(invalid_digit)?;
    }

    Ok(digits)
}

/// Expand a packed tri-state code into its 24-bit transmit word
pub fn decode_code(packed: &[u8; 6]) -> Result<u32, ActuationError> {
    Ok(digits(packed)?.iter().fold(0, |code, digit| (code << 2) | digit.bits()))
}

/// Pack a 24-bit transmit word back into tri-state digits
///
/// Fails if the word contains a `11` bit pair, which no digit produces.
pub fn encode_code(code: u32) -> Result<[u8; 6], ActuationError> {
    let mut packed = [0u8; 6];

    for i in 0..CODE_DIGITS {
        let shift = 2 * (CODE_DIGITS - 1 - i);
        let digit = TriState::from_bits((code >> shift) & 0b11).ok_or_else(invalid_digit)?;
        let nibble_shift = if i % 2 == 0 { 4 } else { 0 };
        packed[i / 2] |= digit.nibble() << nibble_shift;
    }

    Ok(packed)
}

/// Parse RF station data into on/off words and a pulse length
pub fn parse(data: &RFStationData) -> Result<RfCode, ActuationError> {
    let on = decode_code(&data.on)?;
    let off = decode_code(&data.off)?;
    let pulse_length = BigEndian::read_u32(&data.timing);

    if pulse_length == 0 || pulse_length > MAX_PULSE_LENGTH {
        return Err(ActuationError::InvalidTiming(pulse_length));
    }

    Ok(RfCode { on, off, pulse_length })
}

/// Transmit a code
///
/// Each bit is a high/low pair: `1` = 3T high + T low, `0` = T high + 3T low, followed by a sync of T high + 31T low.
/// Blocks for the full duration of every repetition.
pub fn transmit<L: PulseLine + ?Sized>(line: &mut L, code: u32, pulse_length: u32, repeat_count: usize) {
    let length = u64::from(pulse_length);
    let len3 = length * 3;
    let len31 = length * 31;

    for _ in 0..repeat_count {
        // send code
        for i in (0..CODE_BITS).rev() {
            if (code >> i) & 1 != 0 {
                line.pulse(len3, length);
            } else {
                line.pulse(length, len3);
            }
        }

        // send sync
        line.pulse(length, len31);
    }
}

fn invalid_digit() -> ActuationError {
    ActuationError::InvalidLayout {
        station_type: StationType::RadioFrequency.into(),
        reason: "Tri-state digit must be 0x0, 0x1 or 0xF",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingLine {
        pulses: Vec<(u64, u64)>,
    }

    impl PulseLine for RecordingLine {
        fn pulse(&mut self, high_us: u64, low_us: u64) {
            self.pulses.push((high_us, low_us));
        }
    }

    fn rf_data(on: [u8; 6], off: [u8; 6], timing: u32) -> RFStationData {
        let mut data = RFStationData { on, off, timing: [0; 4] };
        BigEndian::write_u32(&mut data.timing, timing);
        data
    }

    #[test]
    fn parse_code() {
        let data = rf_data([0x11, 0x01, 0x10, 0x01, 0x11, 0x10], [0x00; 6], 350);
        let code = parse(&data).unwrap();

        // HIGH HIGH LOW HIGH | HIGH LOW LOW HIGH | HIGH HIGH HIGH LOW
        assert_eq!(code.on, 0b10_10_01_10_10_01_01_10_10_10_10_01);
        assert_eq!(code.on, 0xA696A9);
        assert_eq!(code.off, 0x555555, "Testing all LOW digits");
        assert_eq!(code.pulse_length, 350);
    }

    #[test]
    fn float_digits() {
        assert_eq!(decode_code(&[0xFF; 6]).unwrap(), 0);
        assert_eq!(decode_code(&[0x1F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap(), 0b10 << 22);
    }

    #[test]
    fn invalid_digit_nibble() {
        assert!(matches!(decode_code(&[0x12, 0, 0, 0, 0, 0]), Err(ActuationError::InvalidLayout { .. })));
    }

    #[test]
    fn encode_round_trip() {
        let packed = [0x11, 0x01, 0x10, 0x01, 0x11, 0x10];
        assert_eq!(encode_code(decode_code(&packed).unwrap()).unwrap(), packed);

        let packed = [0xF0, 0x1F, 0x0F, 0xF1, 0x00, 0x11];
        assert_eq!(encode_code(decode_code(&packed).unwrap()).unwrap(), packed);

        assert!(encode_code(0b11).is_err(), "Testing 11 bit pair");
    }

    #[test]
    fn invalid_timing() {
        assert!(matches!(parse(&rf_data([0; 6], [0; 6], 0)), Err(ActuationError::InvalidTiming(0))));
        assert!(matches!(parse(&rf_data([0; 6], [0; 6], MAX_PULSE_LENGTH + 1)), Err(ActuationError::InvalidTiming(_))));
        assert!(parse(&rf_data([0; 6], [0; 6], MAX_PULSE_LENGTH)).is_ok());
    }

    #[test]
    fn transmit_pulses() {
        let mut line = RecordingLine::default();
        transmit(&mut line, 0xA696A9, 350, 2);

        // 24 bits + sync per repetition
        assert_eq!(line.pulses.len(), 2 * (CODE_BITS + 1));
        // MSB is 1
        assert_eq!(line.pulses[0], (1050, 350));
        // second bit is 0
        assert_eq!(line.pulses[1], (350, 1050));
        assert_eq!(line.pulses[CODE_BITS], (350, 350 * 31));
        assert_eq!(line.pulses[..CODE_BITS + 1], line.pulses[CODE_BITS + 1..]);
    }
}
