//! Character set conversions for SMS user data.
//!
//! Covers what the PDU codec needs: the 7-bit septet packing used on the
//! air interface, translation between the GSM default alphabet and ASCII
//! for the printable subset, semi-octet (BCD) telephone numbers and a
//! narrow UCS-2 to ASCII mapping. Characters without a counterpart come
//! out as `?` instead of failing the whole message.

// The first arm is ordered before the pass-through range: 0x24 and 0x40
// are the currency sign and inverted exclamation mark on the GSM side,
// not `$` and `@`.
pub(crate) fn gsm_to_ascii(gsm: u8) -> u8 {
    match gsm {
        0x24 | 0x40 => b'?',
        0x20..=0x5A | 0x61..=0x7A | 0x0A | 0x0D => gsm,
        0x00 => b'@',
        0x02 => b'$',
        0x11 => b'_',
        _ => b'?',
    }
}

pub(crate) fn ascii_to_gsm(ascii: u8) -> u8 {
    match ascii {
        b'$' => 0x02,
        b'@' => 0x00,
        0x20..=0x5A | 0x61..=0x7A | 0x0A | 0x0D => ascii,
        b'_' => 0x11,
        _ => b'?',
    }
}

/// Translate GSM default alphabet bytes to ASCII. Unsupported characters
/// become `?`. `output` must be at least as long as `input`.
pub fn decode_gsm(input: &[u8], output: &mut [u8]) {
    for (i, &byte) in input.iter().enumerate() {
        output[i] = gsm_to_ascii(byte);
    }
}

/// Translate GSM default alphabet bytes to ASCII in place.
pub fn decode_gsm_in_place(data: &mut [u8]) {
    for byte in data.iter_mut() {
        *byte = gsm_to_ascii(*byte);
    }
}

/// Translate ASCII bytes to the GSM default alphabet. Unsupported
/// characters become `?`. `output` must be at least as long as `input`.
pub fn encode_gsm(input: &[u8], output: &mut [u8]) {
    for (i, &byte) in input.iter().enumerate() {
        output[i] = ascii_to_gsm(byte);
    }
}

/// Pack septets into octets, LSB first, with `fillbits` zero bits before
/// the first septet.
///
/// Returns the number of octets written; an empty input still yields one.
/// `output` must hold `(input.len() * 7 + fillbits + 7) / 8` octets and at
/// least one.
pub fn pack_7bit(input: &[u8], output: &mut [u8], fillbits: u8) -> usize {
    let mut bit_buffer: u32 = 0;
    let mut bits_in: u32 = u32::from(fillbits);
    let mut idx = 0;
    let mut packed = 0;

    loop {
        while bits_in < 8 && idx < input.len() {
            bit_buffer |= u32::from(input[idx] & 0x7F) << bits_in;
            bits_in += 7;
            idx += 1;
        }
        output[packed] = (bit_buffer & 0xFF) as u8;
        packed += 1;
        bit_buffer >>= 8;
        bits_in -= bits_in.min(8);

        if bits_in == 0 && idx == input.len() {
            break;
        }
    }
    packed
}

/// Unpack `count` septets from `input`, skipping `fillbits` bits before
/// the first one. `output` must hold `count` bytes.
pub fn unpack_7bit(input: &[u8], count: usize, output: &mut [u8], fillbits: u8) {
    let mut bit_buffer: u32 = 0;
    let mut bits_in: u32 = 0;
    let mut idx = 0;

    if fillbits > 0 {
        bit_buffer = u32::from(input[0]) >> fillbits;
        bits_in = 8 - u32::from(fillbits);
        idx = 1;
    }

    for slot in output.iter_mut().take(count) {
        if bits_in < 7 {
            bit_buffer |= u32::from(input[idx]) << bits_in;
            bits_in += 8;
            idx += 1;
        }
        *slot = (bit_buffer & 0x7F) as u8;
        bit_buffer >>= 7;
        bits_in -= 7;
    }
}

/// Expand semi-octet (BCD) digits into ASCII, low nibble of each octet
/// first. `output` must hold `count` bytes.
pub fn extract_bcd_digits(input: &[u8], count: usize, output: &mut [u8]) {
    for i in 0..count {
        output[i] = ((input[i >> 1] >> ((i & 1) << 2)) & 0x0F) + b'0';
    }
}

/// Pack ASCII digits into semi-octets, low nibble first, padding an odd
/// count with `0xF`. Returns the number of octets written.
pub fn store_bcd_digits(digits: &[u8], output: &mut [u8]) -> usize {
    for (i, pair) in digits.chunks(2).enumerate() {
        let low = pair[0] - b'0';
        output[i] = match pair.get(1) {
            Some(high) => low | ((high - b'0') << 4),
            None => low | 0xF0,
        };
    }
    (digits.len() + 1) / 2
}

/// Map big-endian UCS-2 characters to ASCII, one output byte per
/// character. Anything outside the ASCII range becomes `?`. `output` must
/// hold `input.len() / 2` bytes.
pub fn decode_ucs2(input: &[u8], output: &mut [u8]) {
    for (i, pair) in input.chunks_exact(2).enumerate() {
        let val = u16::from_be_bytes([pair[0], pair[1]]);
        output[i] = if val < 0x0080 { val as u8 } else { b'?' };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_7bit_known_vectors() {
        let mut out = [0u8; 8];
        assert_eq!(pack_7bit(b"AB", &mut out, 0), 2);
        assert_eq!(&out[..2], &[0x41, 0x21]);

        // one fill bit shifts the first septet up
        assert_eq!(pack_7bit(b"AB", &mut out, 1), 2);
        assert_eq!(&out[..2], &[0x82, 0x42]);

        assert_eq!(pack_7bit(b"Hello", &mut out, 0), 5);
        assert_eq!(&out[..5], &[0xC8, 0x32, 0x9B, 0xFD, 0x06]);
    }

    #[test]
    fn test_pack_7bit_empty_input_emits_one_octet() {
        let mut out = [0xFFu8; 2];
        assert_eq!(pack_7bit(b"", &mut out, 0), 1);
        assert_eq!(out[0], 0x00);
    }

    #[test]
    fn test_unpack_7bit_known_vectors() {
        let mut out = [0u8; 8];
        unpack_7bit(&[0xC8, 0x32, 0x9B, 0xFD, 0x06], 5, &mut out, 0);
        assert_eq!(&out[..5], b"Hello");

        unpack_7bit(&[0x82, 0x42], 2, &mut out, 1);
        assert_eq!(&out[..2], b"AB");
    }

    #[test]
    fn test_7bit_round_trip_all_lengths() {
        // every length a single message can carry, with and without a
        // fill bit
        for fillbits in [0u8, 1] {
            for len in 0..=160usize {
                let data: Vec<u8> = (0..len).map(|i| (i % 128) as u8).collect();
                let mut packed = [0u8; 160];
                let n = pack_7bit(&data, &mut packed, fillbits);
                assert_eq!(n, ((len * 7 + fillbits as usize + 7) / 8).max(1));

                let mut unpacked = vec![0u8; len];
                unpack_7bit(&packed[..n], len, &mut unpacked, fillbits);
                assert_eq!(unpacked, data, "len {} fillbits {}", len, fillbits);
            }
        }
    }

    #[test]
    fn test_gsm_round_trips_printable_subset() {
        let mut encoded = [0u8; 1];
        let mut decoded = [0u8; 1];
        let supported = (0x20u8..=0x5A)
            .chain(0x61..=0x7A)
            .chain([b'_', 0x0A, 0x0D]);
        for c in supported {
            encode_gsm(&[c], &mut encoded);
            decode_gsm(&encoded, &mut decoded);
            assert_eq!(decoded[0], c, "character {:#04x}", c);
        }
    }

    #[test]
    fn test_gsm_specials_and_substitution() {
        let mut out = [0u8; 4];
        encode_gsm(b"$@_{", &mut out);
        assert_eq!(out, [0x02, 0x00, 0x11, b'?']);

        // 0x24 is the GSM currency sign, not a dollar
        let mut text = [0x02, 0x00, 0x11, 0x24];
        decode_gsm_in_place(&mut text);
        assert_eq!(&text, b"$@_?");
    }

    #[test]
    fn test_bcd_store_and_extract() {
        let mut packed = [0u8; 8];
        assert_eq!(store_bcd_digits(b"447700900123", &mut packed), 6);
        assert_eq!(&packed[..6], &[0x44, 0x77, 0x00, 0x09, 0x10, 0x32]);

        let mut digits = [0u8; 12];
        extract_bcd_digits(&packed, 12, &mut digits);
        assert_eq!(&digits, b"447700900123");
    }

    #[test]
    fn test_bcd_odd_digit_count_padded() {
        let mut packed = [0u8; 2];
        assert_eq!(store_bcd_digits(b"123", &mut packed), 2);
        assert_eq!(&packed[..2], &[0x21, 0xF3]);

        let mut digits = [0u8; 3];
        extract_bcd_digits(&packed, 3, &mut digits);
        assert_eq!(&digits, b"123");
    }

    #[test]
    fn test_ucs2_ascii_and_substitution() {
        let mut out = [0u8; 3];
        decode_ucs2(&[0x00, b'H', 0x00, b'i', 0x04, 0x10], &mut out);
        assert_eq!(&out, b"Hi?");
    }
}
