//! Device serial derivation
//!
//! The responder reports its serial number as the hex encoding of the device
//! MAC address, most-significant octet first, twelve characters wide.

/// Parses a MAC address written as `AA:BB:CC:DD:EE:FF`, `AA-BB-...` or as
/// twelve bare hex digits.
pub fn parse_mac(text: &str) -> Option<[u8; 6]> {
    let digits: String = text
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .collect();
    if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let mut mac = [0u8; 6];
    for (i, byte) in mac.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(mac)
}

/// Formats a MAC address as a twelve-character uppercase hex serial number.
pub fn serial_from_mac(mac: &[u8; 6]) -> String {
    mac.iter().map(|b| format!("{:02X}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mac_formats() {
        let expected = [0xF8, 0x0D, 0xAC, 0x12, 0x34, 0x56];
        assert_eq!(parse_mac("F8:0D:AC:12:34:56"), Some(expected));
        assert_eq!(parse_mac("f8-0d-ac-12-34-56"), Some(expected));
        assert_eq!(parse_mac("F80DAC123456"), Some(expected));
        assert_eq!(parse_mac("F8:0D:AC"), None);
        assert_eq!(parse_mac("not a mac addr"), None);
    }

    #[test]
    fn test_serial_is_fixed_width_hex() {
        let mac = [0xF8, 0x0D, 0xAC, 0x12, 0x34, 0x56];
        assert_eq!(serial_from_mac(&mac), "F80DAC123456");
        assert_eq!(serial_from_mac(&[0; 6]), "000000000000");
    }
}
