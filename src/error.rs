use crate::hex::FromHexError;
use crate::sms::pdu::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    // Engine errors
    Timeout,
    Protocol,
    Capacity,

    // Transport and timer errors
    Serial(embedded_io::ErrorKind),
    Clock,

    // SMS codec errors
    Decode(DecodeError),
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}

impl From<FromHexError> for Error {
    fn from(e: FromHexError) -> Self {
        // Hex errors only occur while decoding a PDU stream
        Error::Decode(DecodeError::Hex(e))
    }
}
