//! UTF-8 / UTF-16LE conversion
//!
//! MTP datasets carry strings as UTF-16LE code units. These helpers convert
//! between Rust strings and bounded UTF-16 buffers, truncating at the given
//! capacity instead of failing.

/// Converts a UTF-8 string into UTF-16 code units, at most `capacity` of them.
///
/// Truncation never splits a surrogate pair.
pub fn utf8_to_utf16(input: &str, capacity: usize) -> Vec<u16> {
    let mut units = Vec::new();
    for ch in input.chars() {
        let mut buf = [0u16; 2];
        let encoded = ch.encode_utf16(&mut buf);
        if units.len() + encoded.len() > capacity {
            break;
        }
        units.extend_from_slice(encoded);
    }
    units
}

/// Converts UTF-16 code units into a UTF-8 string of at most `capacity` bytes.
///
/// Unpaired surrogates are replaced with U+FFFD rather than rejected.
pub fn utf16_to_utf8(units: &[u16], capacity: usize) -> String {
    let mut out = String::new();
    for decoded in char::decode_utf16(units.iter().copied()) {
        let ch = decoded.unwrap_or(char::REPLACEMENT_CHARACTER);
        if out.len() + ch.len_utf8() > capacity {
            break;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_round_trip() {
        let units = utf8_to_utf16("readme.txt", 63);
        assert_eq!(units.len(), 10);
        assert_eq!(utf16_to_utf8(&units, 63), "readme.txt");
    }

    #[test]
    fn test_truncation_respects_capacity() {
        let units = utf8_to_utf16("abcdef", 3);
        assert_eq!(units.len(), 3);
        assert_eq!(utf16_to_utf8(&units, 2), "ab");
    }

    #[test]
    fn test_surrogate_pair_not_split() {
        // U+1F4C1 needs two code units; capacity 1 cannot hold it
        let units = utf8_to_utf16("\u{1F4C1}", 1);
        assert!(units.is_empty());
        let units = utf8_to_utf16("\u{1F4C1}", 2);
        assert_eq!(units.len(), 2);
        assert_eq!(utf16_to_utf8(&units, 8), "\u{1F4C1}");
    }

    #[test]
    fn test_unpaired_surrogate_replaced() {
        assert_eq!(utf16_to_utf8(&[0xD800, 0x0041], 8), "\u{FFFD}A");
    }
}
