//! Splitting long messages into concatenated segments.
//!
//! Each segment spends part of its user data on the concatenation header,
//! so multipart chunks are smaller than what a single PDU carries. The
//! planner caps a message at three segments; anything longer is refused
//! up front so no partial message ever goes out.

use super::pdu::SmsEncoding;
use crate::error::Error;

/// Segment sizes after the concatenation header is paid for.
const GSM_SINGLE_LEN: usize = 160;
const GSM_CHUNK_LEN: usize = 153;
const UCS2_SINGLE_LEN: usize = 140;
const UCS2_CHUNK_LEN: usize = 134;

const MAX_PARTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SegmentPlan {
    pub(crate) total_parts: u8,
    pub(crate) max_chunk: usize,
}

/// Work out how many segments a payload of `total_len` units needs.
///
/// `total_len` counts septets for the GSM alphabet and octets for UCS-2.
/// 8-bit data has no defined concatenation here and is refused.
pub(crate) fn plan(encoding: SmsEncoding, total_len: usize) -> Result<SegmentPlan, Error> {
    let (single, chunk) = match encoding {
        SmsEncoding::Gsm7 => (GSM_SINGLE_LEN, GSM_CHUNK_LEN),
        SmsEncoding::Ucs2 => (UCS2_SINGLE_LEN, UCS2_CHUNK_LEN),
        SmsEncoding::Data8Bit => return Err(Error::Protocol),
    };

    if total_len <= single {
        return Ok(SegmentPlan {
            total_parts: 1,
            max_chunk: single,
        });
    }
    if total_len > MAX_PARTS * chunk {
        return Err(Error::Capacity);
    }
    Ok(SegmentPlan {
        total_parts: ((total_len + chunk - 1) / chunk) as u8,
        max_chunk: chunk,
    })
}
