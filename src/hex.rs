//! PDUs travel over the text AT channel as ASCII hex pairs, two digits per
//! octet. Streaming reads validate and fold pairs one at a time; bulk decode
//! works in place.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FromHexError {
    /// An invalid character was found. Valid ones are: `0...9`, `a...f`
    /// or `A...F`.
    InvalidHexCharacter,

    /// A hex string's length needs to be even, as two digits correspond to
    /// one byte.
    OddLength,
}

fn val(c: u8) -> Result<u8, FromHexError> {
    match c {
        b'A'..=b'F' => Ok(c - b'A' + 10),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'0'..=b'9' => Ok(c - b'0'),
        _ => Err(FromHexError::InvalidHexCharacter),
    }
}

fn digit(v: u8) -> u8 {
    match v & 0x0F {
        n @ 0..=9 => n + b'0',
        n => n - 10 + b'A',
    }
}

/// Whether `c` is a valid ASCII hex digit.
pub fn is_hex_digit(c: u8) -> bool {
    val(c).is_ok()
}

/// Combine two hex digit characters into one byte, high digit first.
pub fn pair_to_byte(high: u8, low: u8) -> Result<u8, FromHexError> {
    Ok(val(high)? << 4 | val(low)?)
}

/// Expand one byte into its uppercase two-digit hex pair.
pub fn byte_to_pair(byte: u8) -> [u8; 2] {
    [digit(byte >> 4), digit(byte)]
}

pub fn from_hex(hex: &mut [u8]) -> Result<&[u8], FromHexError> {
    if hex.len() % 2 != 0 {
        return Err(FromHexError::OddLength);
    }

    let len = hex.len() / 2;
    for i in 0..len {
        hex[i] = val(hex[i * 2])? << 4 | val(hex[i * 2 + 1])?
    }
    Ok(&hex[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs() {
        assert_eq!(pair_to_byte(b'0', b'7'), Ok(0x07));
        assert_eq!(pair_to_byte(b'f', b'F'), Ok(0xFF));
        assert_eq!(
            pair_to_byte(b'G', b'0'),
            Err(FromHexError::InvalidHexCharacter)
        );
        assert_eq!(byte_to_pair(0x3A), [b'3', b'A']);
        assert_eq!(byte_to_pair(0x00), [b'0', b'0']);
    }

    #[test]
    fn digits() {
        for c in b"0123456789abcdefABCDEF" {
            assert!(is_hex_digit(*c));
        }
        assert!(!is_hex_digit(b'g'));
        assert!(!is_hex_digit(b' '));
    }

    #[test]
    fn decode_in_place() {
        let mut buf = *b"48656C6C6F";
        assert_eq!(from_hex(&mut buf), Ok(&b"Hello"[..]));

        let mut odd = *b"ABC";
        assert_eq!(from_hex(&mut odd), Err(FromHexError::OddLength));
    }
}
