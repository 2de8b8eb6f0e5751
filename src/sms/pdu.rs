//! SMS transport PDU encoding and decoding.
//!
//! In PDU mode the modem exchanges messages as hex encoded transport
//! PDUs. Outbound messages are built as SMS-SUBMIT without an SMSC entry,
//! so the modem fills in its configured service centre. Inbound decoding
//! handles SMS-DELIVER plus the SMS-SUBMIT loopback case of reading a
//! sent message back from storage.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use super::{coding, Sms, SENDER_LEN};
use crate::error::Error;
use crate::hex::FromHexError;

/// Longest user data a PDU can carry, in unpacked form.
pub const USER_DATA_LEN: usize = 160;

/// Buffer size for a complete hex-decoded PDU.
pub const PDU_LEN: usize = 200;

/// User data encoding, as carried in the TP-DCS octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SmsEncoding {
    /// GSM default alphabet, packed to septets on the wire.
    Gsm7,
    /// Untranslated 8-bit data.
    Data8Bit,
    /// Big-endian 16-bit characters.
    Ucs2,
}

/// One message payload in unpacked form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UserData {
    pub encoding: SmsEncoding,
    pub data: Vec<u8, USER_DATA_LEN>,
}

impl UserData {
    pub fn new(encoding: SmsEncoding) -> Self {
        Self {
            encoding,
            data: Vec::new(),
        }
    }
}

/// Concatenation bookkeeping stamped into each segment's user data header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MultipartInfo {
    /// Shared reference tying the segments of one message together.
    pub reference: u8,
    /// Total number of segments.
    pub total: u8,
    /// Position of this segment, starting at 1.
    pub sequence: u8,
}

/// Failures while interpreting a stored PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum DecodeError {
    /// A byte pair in the stream was not valid hex.
    Hex(FromHexError),
    /// Data coding scheme this driver does not handle.
    UnsupportedDcs(u8),
    /// Message type other than SMS-DELIVER or SMS-SUBMIT.
    UnsupportedMessageType(u8),
    /// The PDU ended early or a length field contradicts the payload.
    MalformedPdu,
}

impl From<FromHexError> for DecodeError {
    fn from(e: FromHexError) -> Self {
        DecodeError::Hex(e)
    }
}

/// Build an SMS-SUBMIT transport PDU around one message.
///
/// `multipart` adds the concatenation header tying a segment to its
/// siblings; the user data length and, for the GSM alphabet, the septet
/// alignment are adjusted for it.
pub fn encode_submit(
    destination: &str,
    message: &UserData,
    multipart: Option<MultipartInfo>,
) -> Result<Vec<u8, PDU_LEN>, Error> {
    let (number, toa) = match destination.strip_prefix('+') {
        Some(digits) => (digits, 0x91),
        None => (destination, 0x81),
    };
    // TP-DA carries at most 20 digits
    if number.len() > 20 {
        return Err(Error::Capacity);
    }
    if !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Protocol);
    }

    let mut pdu: Vec<u8, PDU_LEN> = Vec::new();
    let first_octet = if multipart.is_some() { 0x41 } else { 0x01 };

    // no SMSC, first octet, message reference left for the modem
    pdu.extend_from_slice(&[0x00, first_octet, 0x00])
        .map_err(|_| Error::Capacity)?;

    // destination address
    pdu.extend_from_slice(&[number.len() as u8, toa])
        .map_err(|_| Error::Capacity)?;
    let addr_start = pdu.len();
    pdu.resize(addr_start + (number.len() + 1) / 2, 0)
        .map_err(|_| Error::Capacity)?;
    coding::store_bcd_digits(number.as_bytes(), &mut pdu[addr_start..]);

    // protocol identifier and data coding scheme
    let dcs = match message.encoding {
        SmsEncoding::Gsm7 => 0x00,
        SmsEncoding::Data8Bit => 0x04,
        SmsEncoding::Ucs2 => 0x08,
    };
    pdu.extend_from_slice(&[0x00, dcs])
        .map_err(|_| Error::Capacity)?;

    // user data length counts septets for the GSM alphabet and octets
    // otherwise; the concatenation header inflates it accordingly
    let udl = message.data.len() as u8;
    let mut fillbits = 0u8;
    match multipart {
        Some(info) => {
            let udl_with_header = match message.encoding {
                SmsEncoding::Gsm7 => {
                    fillbits = 1;
                    udl + 7
                }
                _ => udl + 6,
            };
            pdu.extend_from_slice(&[
                udl_with_header,
                0x05,
                0x00,
                0x03,
                info.reference,
                info.total,
                info.sequence,
            ])
            .map_err(|_| Error::Capacity)?;
        }
        None => pdu.push(udl).map_err(|_| Error::Capacity)?,
    }

    match message.encoding {
        SmsEncoding::Gsm7 => {
            let start = pdu.len();
            let packed_len = ((message.data.len() * 7 + fillbits as usize + 7) / 8).max(1);
            pdu.resize(start + packed_len, 0)
                .map_err(|_| Error::Capacity)?;
            coding::pack_7bit(&message.data, &mut pdu[start..], fillbits);
        }
        _ => pdu
            .extend_from_slice(&message.data)
            .map_err(|_| Error::Capacity)?,
    }

    Ok(pdu)
}

/// Decode a transport PDU read back from modem storage into `msg`.
///
/// `msg.status` is left alone; storage state comes from the listing, not
/// the PDU. The raw payload and, where the encoding allows it, the ASCII
/// rendition are filled in along with the sender address.
pub fn decode(pdu: &[u8], msg: &mut Sms) -> Result<(), Error> {
    let mut r = Reader::new(pdu);

    let smsc_len = r.byte()? as usize;
    r.skip(smsc_len)?;

    let first_octet = r.byte()?;
    let has_udh = first_octet & 0x40 != 0;
    match first_octet & 0x03 {
        // SMS-DELIVER
        0x00 => {}
        // SMS-SUBMIT keeps its message reference here
        0x01 => r.skip(1)?,
        mti => return Err(DecodeError::UnsupportedMessageType(mti).into()),
    }

    let addr_len = r.byte()? as usize;
    let type_of_addr = r.byte()?;
    let addr = r.slice((addr_len + 1) / 2)?;

    msg.sender.clear();
    match type_of_addr & 0x70 {
        // alphanumeric, 7-bit packed GSM characters
        0x50 => {
            let char_len = addr_len * 4 / 7;
            if char_len > SENDER_LEN {
                return Err(Error::Capacity);
            }
            let mut chars = [0u8; SENDER_LEN];
            coding::unpack_7bit(addr, char_len, &mut chars, 0);
            coding::decode_gsm_in_place(&mut chars[..char_len]);
            push_ascii(&mut msg.sender, &chars[..char_len])?;
        }
        // international numbers get their leading plus back
        0x10 => {
            msg.sender.push('+').map_err(|_| Error::Capacity)?;
            push_number(&mut msg.sender, addr, addr_len)?;
        }
        _ => push_number(&mut msg.sender, addr, addr_len)?,
    }

    // protocol identifier
    r.skip(1)?;
    let dcs = r.byte()?;

    match first_octet & 0x03 {
        // service centre timestamp
        0x00 => r.skip(7)?,
        // validity period, sized by the VPF bits
        _ => match first_octet & 0x18 {
            0x00 => {}
            0x10 => r.skip(1)?,
            _ => r.skip(7)?,
        },
    }

    let udl = r.byte()? as usize;
    let header_len = if has_udh { r.peek()? as usize + 1 } else { 0 };
    r.skip(header_len)?;
    let payload = r.rest();

    msg.raw.data.clear();
    msg.text.clear();
    match dcs {
        0x00 => {
            let mut fillbits = 0u8;
            let mut septets = udl;
            if has_udh {
                // the header is padded to the next septet boundary
                fillbits = ((7 - (header_len % 7)) % 7) as u8;
                septets = septets
                    .checked_sub((8 * header_len + fillbits as usize) / 7)
                    .ok_or(DecodeError::MalformedPdu)?;
            }
            if septets > USER_DATA_LEN {
                return Err(Error::Capacity);
            }
            if payload.len() < (septets * 7 + fillbits as usize + 7) / 8 {
                return Err(DecodeError::MalformedPdu.into());
            }

            msg.raw.encoding = SmsEncoding::Gsm7;
            msg.raw
                .data
                .resize(septets, 0)
                .map_err(|_| Error::Capacity)?;
            coding::unpack_7bit(payload, septets, &mut msg.raw.data, fillbits);

            let mut text = [0u8; USER_DATA_LEN];
            coding::decode_gsm(&msg.raw.data, &mut text);
            push_ascii(&mut msg.text, &text[..septets])?;
        }
        0x04 | 0x08 => {
            let data_len = udl
                .checked_sub(header_len)
                .ok_or(DecodeError::MalformedPdu)?;
            if payload.len() < data_len {
                return Err(DecodeError::MalformedPdu.into());
            }
            msg.raw.encoding = if dcs == 0x04 {
                SmsEncoding::Data8Bit
            } else {
                SmsEncoding::Ucs2
            };
            msg.raw
                .data
                .extend_from_slice(&payload[..data_len])
                .map_err(|_| Error::Capacity)?;

            if dcs == 0x08 {
                let mut text = [0u8; USER_DATA_LEN];
                coding::decode_ucs2(&payload[..data_len], &mut text);
                push_ascii(&mut msg.text, &text[..data_len / 2])?;
            }
        }
        other => return Err(DecodeError::UnsupportedDcs(other).into()),
    }

    Ok(())
}

fn push_ascii<const N: usize>(out: &mut String<N>, bytes: &[u8]) -> Result<(), Error> {
    match core::str::from_utf8(bytes) {
        Ok(text) => out.push_str(text).map_err(|_| Error::Capacity),
        Err(_) => Err(DecodeError::MalformedPdu.into()),
    }
}

fn push_number<const N: usize>(
    out: &mut String<N>,
    addr: &[u8],
    digits: usize,
) -> Result<(), Error> {
    if digits > N {
        return Err(Error::Capacity);
    }
    let mut buf = [0u8; N];
    coding::extract_bcd_digits(addr, digits, &mut buf);
    push_ascii(out, &buf[..digits])
}

// Bounds-checked index walk over the raw PDU octets.
struct Reader<'a> {
    pdu: &'a [u8],
    idx: usize,
}

impl<'a> Reader<'a> {
    fn new(pdu: &'a [u8]) -> Self {
        Self { pdu, idx: 0 }
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.pdu.get(self.idx).ok_or(DecodeError::MalformedPdu)?;
        self.idx += 1;
        Ok(byte)
    }

    fn peek(&self) -> Result<u8, DecodeError> {
        self.pdu
            .get(self.idx)
            .copied()
            .ok_or(DecodeError::MalformedPdu)
    }

    fn slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.idx.checked_add(len).ok_or(DecodeError::MalformedPdu)?;
        let slice = self
            .pdu
            .get(self.idx..end)
            .ok_or(DecodeError::MalformedPdu)?;
        self.idx = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.slice(len).map(|_| ())
    }

    fn rest(&self) -> &'a [u8] {
        &self.pdu[self.idx..]
    }
}
