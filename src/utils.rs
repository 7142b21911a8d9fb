/// Parse a fixed-width field of ASCII hexadecimal digits (e.g. `b"0050"` = 80)
///
/// Returns [None] if the field is empty, wider than 32 bits, or contains a non-hex character.
pub fn hex_field(field: &[u8]) -> Option<u32> {
    if field.is_empty() || field.len() > 8 {
        return None;
    }

    field.iter().try_fold(0u32, |acc, &c| Some((acc << 4) | char::from(c).to_digit(16)?))
}

/// Parse a fixed-width field of ASCII decimal digits (e.g. `b"05"` = 5)
pub fn decimal_field(field: &[u8]) -> Option<u32> {
    if field.is_empty() {
        return None;
    }

    field.iter().try_fold(0u32, |acc, &c| acc.checked_mul(10)?.checked_add(char::from(c).to_digit(10)?))
}

/// Write `value` as upper-case ASCII hex, zero padded to the width of `field`
pub fn write_hex_field(field: &mut [u8], value: u32) {
    let width = field.len();
    for (i, c) in field.iter_mut().enumerate() {
        let shift = 4 * (width - 1 - i);
        let nibble = if shift < 32 { (value >> shift) & 0x0F } else { 0 };
        *c = char::from_digit(nibble, 16).map(|d| d.to_ascii_uppercase() as u8).unwrap_or(b'0');
    }
}

/// Write `value` as ASCII decimal, zero padded to the width of `field`
pub fn write_decimal_field(field: &mut [u8], value: u32) {
    let mut value = value;
    for c in field.iter_mut().rev() {
        *c = b'0' + (value % 10) as u8;
        value /= 10;
    }
}

/// Text stored in a fixed buffer, up to the first NUL byte
pub fn nul_terminated_str(buf: &[u8]) -> Result<&str, std::str::Utf8Error> {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    std::str::from_utf8(&buf[..end])
}

#[cfg(test)]
mod tests {
    #[test]
    fn hex_field() {
        assert_eq!(super::hex_field(b"0050"), Some(80), "Testing port 80");
        assert_eq!(super::hex_field(b"C0A80164"), Some(0xC0A80164), "Testing 192.168.1.100");
        assert_eq!(super::hex_field(b"c0a8"), Some(0xC0A8), "Testing lower case");
        assert_eq!(super::hex_field(b"00G0"), None, "Testing invalid digit");
        assert_eq!(super::hex_field(b""), None, "Testing empty field");
    }

    #[test]
    fn decimal_field() {
        assert_eq!(super::decimal_field(b"05"), Some(5));
        assert_eq!(super::decimal_field(b"27"), Some(27));
        assert_eq!(super::decimal_field(b"2a"), None);
    }

    #[test]
    fn write_fields() {
        let mut buf = [0u8; 4];
        super::write_hex_field(&mut buf, 8080);
        assert_eq!(&buf, b"1F90");

        let mut buf = [0u8; 2];
        super::write_decimal_field(&mut buf, 7);
        assert_eq!(&buf, b"07");
    }

    #[test]
    fn nul_terminated_str() {
        assert_eq!(super::nul_terminated_str(b"abc\0\0\0").unwrap(), "abc");
        assert_eq!(super::nul_terminated_str(b"abc").unwrap(), "abc");
        assert!(super::nul_terminated_str(&[0xFF, 0xFE, 0]).is_err());
    }
}
