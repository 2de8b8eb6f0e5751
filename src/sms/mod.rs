//! SMS service running the modem in PDU mode.
//!
//! [`SmsService`] wraps a [`ModemSerial`] borrow for the duration of the
//! message exchanges: storage selection, listing, PDU read and decode,
//! single and concatenated sends, and deletion. New message notifications
//! arrive through [`CmtiHandler`], which queues storage indexes for the
//! application to pick up outside the URC path.

use heapless::spsc::Producer;
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::Error;
use crate::hex;
use crate::serial::{ModemSerial, ResponseOutcome, SerialPort, DEFAULT_TIMEOUT_MS};
use crate::urc::{Cursor, UrcHandler};

pub mod coding;
pub(crate) mod multipart;
pub mod pdu;

pub use pdu::{DecodeError, MultipartInfo, SmsEncoding, UserData, PDU_LEN, USER_DATA_LEN};

/// Capacity of the sender address: a plus and up to 20 digits, or an
/// alphanumeric identifier.
pub const SENDER_LEN: usize = 21;

/// Capacity of the decoded message text.
pub const TEXT_LEN: usize = 160;

/// Timeout for the storage and bookkeeping commands.
const SMS_TIMEOUT_MS: u32 = 9_000;

/// Timeout for the network round trip of an actual send.
const SEND_TIMEOUT_MS: u32 = 40_000;

/// Message format selected with `AT+CMGF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageFormat {
    Pdu = 0,
    Text = 1,
}

/// Storage state of a message, also usable as a listing filter.
///
/// The values are the numeric `<stat>` codes the modem uses in PDU mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SmsStatus {
    RecUnread = 0,
    RecRead = 1,
    StoUnsent = 2,
    StoSent = 3,
    All = 4,
}

impl SmsStatus {
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(SmsStatus::RecUnread),
            1 => Some(SmsStatus::RecRead),
            2 => Some(SmsStatus::StoUnsent),
            3 => Some(SmsStatus::StoSent),
            4 => Some(SmsStatus::All),
            _ => None,
        }
    }
}

/// One listing entry: where a message sits and how long its PDU is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SmsSlot {
    pub index: u8,
    pub status: SmsStatus,
    pub length: u16,
}

/// A received message after PDU decoding.
///
/// `raw` holds the payload in its wire encoding, unpacked to one unit per
/// byte for the GSM alphabet. `text` is the ASCII rendition where the
/// encoding allows one; 8-bit data leaves it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sms {
    pub status: SmsStatus,
    pub sender: String<SENDER_LEN>,
    pub raw: UserData,
    pub text: String<TEXT_LEN>,
}

impl Default for Sms {
    fn default() -> Self {
        Self {
            status: SmsStatus::RecUnread,
            sender: String::new(),
            raw: UserData::new(SmsEncoding::Gsm7),
            text: String::new(),
        }
    }
}

// OK closes the exchange; any other terminal outcome is a protocol level
// failure.
fn check(rsp: ResponseOutcome) -> Result<(), Error> {
    match rsp {
        ResponseOutcome::Ok => Ok(()),
        ResponseOutcome::Timeout => Err(Error::Timeout),
        _ => Err(Error::Protocol),
    }
}

/// SMS client over a borrowed [`ModemSerial`].
pub struct SmsService<'s, 'a, S, CLK, const TIMER_HZ: u32, const BUF_LEN: usize> {
    serial: &'s mut ModemSerial<'a, S, CLK, TIMER_HZ, BUF_LEN>,
    message_reference: u8,
}

impl<'s, 'a, S, CLK, const TIMER_HZ: u32, const BUF_LEN: usize>
    SmsService<'s, 'a, S, CLK, TIMER_HZ, BUF_LEN>
where
    S: SerialPort,
    CLK: Clock<TIMER_HZ>,
{
    pub fn new(serial: &'s mut ModemSerial<'a, S, CLK, TIMER_HZ, BUF_LEN>) -> Self {
        Self {
            serial,
            message_reference: 123,
        }
    }

    /// Select the default storage and notification settings.
    pub fn init(&mut self) -> Result<(), Error> {
        self.set_storage()?;
        self.set_notification()
    }

    /// Reset the preferred message storage to the modem default.
    pub fn set_storage(&mut self) -> Result<(), Error> {
        self.serial.send_cmd(format_args!("AT+CPMS"))?;
        match self
            .serial
            .wait_response("+CPMS: ", SMS_TIMEOUT_MS, false, true)?
        {
            ResponseOutcome::Match1 => {}
            ResponseOutcome::Timeout => return Err(Error::Timeout),
            _ => return Err(Error::Protocol),
        }

        // skip the usage report, then take the terminator
        self.serial.find(b'\n')?;
        check(self.serial.wait_response((), DEFAULT_TIMEOUT_MS, true, true)?)
    }

    /// Switch between PDU and text mode.
    pub fn set_message_format(&mut self, format: MessageFormat) -> Result<(), Error> {
        self.serial
            .send_cmd(format_args!("AT+CMGF={}", format as u8))?;
        check(self.serial.wait_response((), SMS_TIMEOUT_MS, true, true)?)
    }

    /// Set the text mode parameters.
    ///
    /// The data coding scheme must be compatible with the selected
    /// character set. The modem defaults are `17, 167, 0, 0`.
    pub fn set_text_mode_params(
        &mut self,
        first_octet: u8,
        validity_period: u8,
        protocol_id: u8,
        dcs: u8,
    ) -> Result<(), Error> {
        self.serial.send_cmd(format_args!(
            "AT+CSMP={},{},{},{}",
            first_octet, validity_period, protocol_id, dcs
        ))?;
        check(
            self.serial
                .wait_response("+CMS ERROR: ", SMS_TIMEOUT_MS, true, true)?,
        )
    }

    /// Restore the default new-message notification settings.
    pub fn set_notification(&mut self) -> Result<(), Error> {
        self.serial.send_cmd(format_args!("AT+CNMI"))?;
        check(self.serial.wait_response((), SMS_TIMEOUT_MS, true, true)?)
    }

    /// List stored messages matching `filter` into `slots`.
    ///
    /// When `slots` fills up, the rest of the listing is discarded so the
    /// exchange still ends cleanly on the terminator.
    pub fn list<const N: usize>(
        &mut self,
        filter: SmsStatus,
        slots: &mut Vec<SmsSlot, N>,
    ) -> Result<(), Error> {
        self.set_message_format(MessageFormat::Pdu)?;
        self.serial
            .send_cmd(format_args!("AT+CMGL={}", filter as u8))?;

        loop {
            match self
                .serial
                .wait_response("+CMGL: ", SMS_TIMEOUT_MS, true, true)?
            {
                ResponseOutcome::Match1 => {}
                ResponseOutcome::Ok => return Ok(()),
                ResponseOutcome::Timeout => return Err(Error::Timeout),
                _ => return Err(Error::Protocol),
            }

            let index = self.serial.parse_int()?;
            self.serial.find(b',')?;
            let status = self.serial.parse_int()?;
            self.serial.find(b',')?;
            // skip the <alpha> field
            self.serial.find(b',')?;
            let length = self.serial.parse_int()?;
            self.serial.find(b'\n')?;
            // the PDU line itself is not needed for a listing
            self.serial.find(b'\n')?;

            let entry = SmsSlot {
                index: index as u8,
                status: SmsStatus::from_value(status as u8).ok_or(Error::Protocol)?,
                length: length as u16,
            };
            if slots.push(entry).is_err() {
                // out of space: discard the remaining entries
                return check(self.serial.wait_response((), SMS_TIMEOUT_MS, true, true)?);
            }
        }
    }

    /// Read and decode the message stored at `index`.
    pub fn read(&mut self, index: u8, msg: &mut Sms) -> Result<(), Error> {
        self.set_message_format(MessageFormat::Pdu)?;
        self.serial.send_cmd(format_args!("AT+CMGR={}", index))?;

        match self.serial.wait_response(
            ("+CMGR: ", "+CMS ERROR: "),
            SMS_TIMEOUT_MS,
            true,
            true,
        )? {
            ResponseOutcome::Match1 => {}
            ResponseOutcome::Timeout => return Err(Error::Timeout),
            _ => return Err(Error::Protocol),
        }

        let status = self.serial.parse_int()?;
        self.serial.find(b',')?;
        // skip the <alpha> field
        self.serial.find(b',')?;
        let pdu_len = self.serial.parse_int()?;
        self.serial.find(b'\n')?;

        // the reported length leaves out the SMSC entry, so the first
        // octet decides how much hex actually follows
        let mut pdu: Vec<u8, PDU_LEN> = Vec::new();
        let smsc_len = self.read_hex_byte()?;
        pdu.push(smsc_len).map_err(|_| Error::Capacity)?;

        let total = smsc_len as usize + 1 + pdu_len as usize;
        if total > PDU_LEN {
            return Err(Error::Capacity);
        }
        while pdu.len() < total {
            let byte = self.read_hex_byte()?;
            pdu.push(byte).map_err(|_| Error::Capacity)?;
        }

        check(self.serial.wait_response((), SMS_TIMEOUT_MS, true, true)?)?;

        msg.status = SmsStatus::from_value(status as u8).ok_or(Error::Protocol)?;
        pdu::decode(&pdu, msg)
    }

    /// Send `text` in the GSM alphabet, splitting it into a concatenated
    /// message when it exceeds one PDU.
    ///
    /// Every byte of `text` must map onto the GSM default alphabet;
    /// anything else goes out as `?`.
    pub fn send(&mut self, destination: &str, text: &str) -> Result<(), Error> {
        let plan = multipart::plan(SmsEncoding::Gsm7, text.len())?;

        if plan.total_parts == 1 {
            let mut part = UserData::new(SmsEncoding::Gsm7);
            part.data
                .resize(text.len(), 0)
                .map_err(|_| Error::Capacity)?;
            coding::encode_gsm(text.as_bytes(), &mut part.data);
            return self.send_single(destination, &part, None);
        }

        let reference = self.next_reference();
        for (part_idx, chunk) in text.as_bytes().chunks(plan.max_chunk).enumerate() {
            let mut part = UserData::new(SmsEncoding::Gsm7);
            part.data
                .resize(chunk.len(), 0)
                .map_err(|_| Error::Capacity)?;
            coding::encode_gsm(chunk, &mut part.data);

            let info = MultipartInfo {
                reference,
                total: plan.total_parts,
                sequence: part_idx as u8 + 1,
            };
            self.send_single(destination, &part, Some(info))?;
        }
        Ok(())
    }

    /// Prepend an ASCII `comment` to `message` and send the result,
    /// splitting it into a concatenated message when necessary.
    ///
    /// The comment is carried in the message encoding, so with a UCS-2
    /// payload each comment character costs two bytes.
    pub fn send_with_comment(
        &mut self,
        destination: &str,
        message: &UserData,
        comment: &str,
    ) -> Result<(), Error> {
        let comment_len = match message.encoding {
            SmsEncoding::Ucs2 => comment.len() * 2,
            _ => comment.len(),
        };
        let plan = multipart::plan(message.encoding, comment_len + message.data.len())?;
        let reference = (plan.total_parts > 1).then(|| self.next_reference());

        let comment = comment.as_bytes();
        let mut comment_idx = 0;
        let mut message_idx = 0;
        for part_idx in 0..plan.total_parts {
            let mut part = UserData::new(message.encoding);

            if comment_idx < comment_len {
                let send = (comment_len - comment_idx).min(plan.max_chunk);
                match message.encoding {
                    SmsEncoding::Ucs2 => {
                        for _ in 0..send / 2 {
                            part.data
                                .extend_from_slice(&[0x00, comment[comment_idx / 2]])
                                .map_err(|_| Error::Capacity)?;
                            comment_idx += 2;
                        }
                    }
                    _ => {
                        part.data.resize(send, 0).map_err(|_| Error::Capacity)?;
                        coding::encode_gsm(
                            &comment[comment_idx..comment_idx + send],
                            &mut part.data,
                        );
                        comment_idx += send;
                    }
                }
            }

            if message_idx < message.data.len() && part.data.len() < plan.max_chunk {
                let free = plan.max_chunk - part.data.len();
                let send = (message.data.len() - message_idx).min(free);
                part.data
                    .extend_from_slice(&message.data[message_idx..message_idx + send])
                    .map_err(|_| Error::Capacity)?;
                message_idx += send;
            }

            let info = reference.map(|reference| MultipartInfo {
                reference,
                total: plan.total_parts,
                sequence: part_idx + 1,
            });
            self.send_single(destination, &part, info)?;
        }
        Ok(())
    }

    /// Send one message as a single PDU, with an optional concatenation
    /// header.
    pub fn send_single(
        &mut self,
        destination: &str,
        message: &UserData,
        multipart: Option<MultipartInfo>,
    ) -> Result<(), Error> {
        let pdu = pdu::encode_submit(destination, message, multipart)?;
        self.send_pdu(&pdu)
    }

    /// Delete the message at `index`.
    pub fn delete(&mut self, index: u8) -> Result<(), Error> {
        self.delete_flagged(index, 0)
    }

    /// Delete every message in the selected storage, read or not.
    pub fn delete_all(&mut self) -> Result<(), Error> {
        self.delete_flagged(1, 4)
    }

    fn delete_flagged(&mut self, index: u8, flag: u8) -> Result<(), Error> {
        self.serial
            .send_cmd(format_args!("AT+CMGD={},{}", index, flag))?;
        check(
            self.serial
                .wait_response("+CMS ERROR: ", SMS_TIMEOUT_MS, true, true)?,
        )
    }

    // CMGS exchange: announce the length without the SMSC octet, wait for
    // the prompt, stream the hex dump, close with ctrl-Z.
    fn send_pdu(&mut self, pdu: &[u8]) -> Result<(), Error> {
        if pdu.is_empty() {
            return Err(Error::Protocol);
        }
        self.set_message_format(MessageFormat::Pdu)?;

        self.serial
            .send_cmd(format_args!("AT+CMGS={}", pdu.len() - 1))?;
        self.serial.find(b'>')?;

        for &byte in pdu {
            self.serial.write_bytes(&hex::byte_to_pair(byte))?;
        }
        self.serial.write_bytes(&[0x1A, b'\r', b'\n'])?;

        match self.serial.wait_response(
            ("+CMGS: ", "+CMS ERROR: "),
            SEND_TIMEOUT_MS,
            true,
            true,
        )? {
            ResponseOutcome::Match1 => {
                check(self.serial.wait_response((), SEND_TIMEOUT_MS, true, true)?)
            }
            ResponseOutcome::Timeout => Err(Error::Timeout),
            _ => Err(Error::Protocol),
        }
    }

    fn read_hex_byte(&mut self) -> Result<u8, Error> {
        let high = self.serial.read_byte()?;
        let low = self.serial.read_byte()?;
        Ok(hex::pair_to_byte(high, low)?)
    }

    fn next_reference(&mut self) -> u8 {
        let reference = self.message_reference;
        self.message_reference = self.message_reference.wrapping_add(1);
        reference
    }
}

/// Handler for the `+CMTI` new message notification.
///
/// Dispatch happens in the middle of other scans, so the handler only
/// queues the storage index; the application dequeues it and reads the
/// message at a convenient time.
pub struct CmtiHandler<'q, const N: usize> {
    producer: Producer<'q, u8, N>,
}

impl<'q, const N: usize> CmtiHandler<'q, N> {
    pub fn new(producer: Producer<'q, u8, N>) -> Self {
        Self { producer }
    }
}

impl<const N: usize> UrcHandler for CmtiHandler<'_, N> {
    fn prefix(&self) -> &str {
        "+CMTI: "
    }

    // +CMTI: <mem>,<index>, and the storage is always the selected one,
    // so only the index matters
    fn process(&mut self, stream: &mut dyn Cursor) -> Result<(), Error> {
        stream.find(b',')?;
        let index = stream.parse_int()?;
        stream.find(b'\n')?;

        // a full queue drops the notification
        self.producer.enqueue(index as u8).ok();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_helpers::{MockSerial, MockTimer};
    use heapless::spsc::Queue;

    fn modem(rx: &[u8]) -> ModemSerial<'static, MockSerial, MockTimer, 1000, 256> {
        ModemSerial::new(MockSerial::new(rx), MockTimer::new(), Config::new())
    }

    // Pull the hex dump sent after `cmgs` back out of the transcript and
    // decode it like the network would.
    fn sent_pdu(tx: &str, cmgs: &str) -> Sms {
        let start = tx.find(cmgs).unwrap() + cmgs.len();
        let end = tx[start..].find('\x1A').unwrap() + start;
        let hex_part = &tx[start..end];

        let mut buf = [0u8; 2 * PDU_LEN];
        buf[..hex_part.len()].copy_from_slice(hex_part.as_bytes());
        let bytes = hex::from_hex(&mut buf[..hex_part.len()]).unwrap();

        let mut msg = Sms::default();
        pdu::decode(bytes, &mut msg).unwrap();
        msg
    }

    #[test]
    fn test_init_flow() {
        let mut modem = modem(b"+CPMS: 3,50,3,50,3,50\r\nOK\r\nOK\r\n");
        let mut sms = SmsService::new(&mut modem);
        sms.init().unwrap();

        let (serial, _) = modem.release();
        assert_eq!(serial.written(), b"AT+CPMS\r\nAT+CNMI\r\n");
    }

    #[test]
    fn test_set_text_mode_params_flow() {
        let mut modem = modem(b"OK\r\n");
        let mut sms = SmsService::new(&mut modem);
        sms.set_text_mode_params(17, 167, 0, 0).unwrap();

        let (serial, _) = modem.release();
        assert_eq!(serial.written(), b"AT+CSMP=17,167,0,0\r\n");
    }

    #[test]
    fn test_send_single_transcript() {
        let mut modem = modem(b"OK\r\n> +CMGS: 5\r\nOK\r\n");
        let mut sms = SmsService::new(&mut modem);
        sms.send("+447700900123", "Hello").unwrap();

        let (serial, _) = modem.release();
        assert_eq!(
            serial.written(),
            b"AT+CMGF=0\r\nAT+CMGS=18\r\n0001000C91447700091032000005C8329BFD06\x1A\r\n"
                as &[u8]
        );
    }

    #[test]
    fn test_send_multipart_shares_reference() {
        let mut modem = modem(b"OK\r\n> +CMGS: 1\r\nOK\r\nOK\r\n> +CMGS: 2\r\nOK\r\n");
        let mut sms = SmsService::new(&mut modem);

        let text = "a".repeat(161);
        sms.send("+447700900123", &text).unwrap();
        assert_eq!(sms.message_reference, 124);

        let (serial, _) = modem.release();
        let tx = core::str::from_utf8(serial.written()).unwrap();
        assert_eq!(tx.matches("AT+CMGS=").count(), 2);
        // 153 septets plus header, then the 8 septet remainder
        assert!(tx.contains("AT+CMGS=153\r\n"));
        assert!(tx.contains("AT+CMGS=27\r\n"));
        assert!(tx.contains("0500037B0201"));
        assert!(tx.contains("0500037B0202"));
    }

    #[test]
    fn test_send_too_long_refused_before_any_traffic() {
        let mut modem = modem(b"");
        let mut sms = SmsService::new(&mut modem);

        let text = "a".repeat(460);
        assert!(matches!(
            sms.send("+447700900123", &text),
            Err(Error::Capacity)
        ));

        let (serial, _) = modem.release();
        assert!(serial.written().is_empty());
    }

    #[test]
    fn test_send_with_comment_spans_parts() {
        let mut modem = modem(b"OK\r\n> +CMGS: 1\r\nOK\r\nOK\r\n> +CMGS: 2\r\nOK\r\n");
        let mut sms = SmsService::new(&mut modem);

        let mut payload = UserData::new(SmsEncoding::Gsm7);
        payload.data.resize(160, 0x62).unwrap();
        sms.send_with_comment("+447700900123", &payload, "note: ")
            .unwrap();

        let (serial, _) = modem.release();
        let tx = core::str::from_utf8(serial.written()).unwrap();
        assert_eq!(tx.matches("AT+CMGS=").count(), 2);

        let first = sent_pdu(tx, "AT+CMGS=153\r\n");
        assert!(first.text.starts_with("note: "));
        assert_eq!(first.text.len(), 153);
        assert!(first.text.ends_with("bb"));

        let second = sent_pdu(tx, "AT+CMGS=31\r\n");
        assert_eq!(second.text.len(), 13);
    }

    #[test]
    fn test_send_with_comment_ucs2_widens_comment() {
        let mut modem = modem(b"OK\r\n> +CMGS: 9\r\nOK\r\n");
        let mut sms = SmsService::new(&mut modem);

        let mut payload = UserData::new(SmsEncoding::Ucs2);
        for &ch in b"WORLD" {
            payload.data.extend_from_slice(&[0x00, ch]).unwrap();
        }
        sms.send_with_comment("+447700900123", &payload, "hi! ")
            .unwrap();

        let (serial, _) = modem.release();
        let tx = core::str::from_utf8(serial.written()).unwrap();
        // 8 comment bytes and 10 payload bytes still fit one PDU
        assert!(!tx.contains("050003"));

        let msg = sent_pdu(tx, "AT+CMGS=31\r\n");
        assert_eq!(msg.raw.encoding, SmsEncoding::Ucs2);
        assert_eq!(msg.text.as_str(), "hi! WORLD");
    }

    #[test]
    fn test_read_flow() {
        let mut modem = modem(
            b"OK\r\n+CMGR: 1,,24\r\n00040C9144770009103200002280214152508005C8329BFD06\r\nOK\r\n",
        );
        let mut sms = SmsService::new(&mut modem);

        let mut msg = Sms::default();
        sms.read(5, &mut msg).unwrap();
        assert_eq!(msg.status, SmsStatus::RecRead);
        assert_eq!(msg.sender.as_str(), "+447700900123");
        assert_eq!(msg.text.as_str(), "Hello");

        let (serial, _) = modem.release();
        assert_eq!(serial.written(), b"AT+CMGF=0\r\nAT+CMGR=5\r\n");
    }

    #[test]
    fn test_read_reports_cms_error() {
        let mut modem = modem(b"OK\r\n+CMS ERROR: 321\r\n");
        let mut sms = SmsService::new(&mut modem);

        let mut msg = Sms::default();
        assert!(matches!(sms.read(9, &mut msg), Err(Error::Protocol)));
    }

    #[test]
    fn test_list_flow() {
        let mut modem = modem(
            b"OK\r\n+CMGL: 1,1,,24\r\nDEADBEEF\r\n+CMGL: 3,0,,30\r\nCAFE\r\nOK\r\n",
        );
        let mut sms = SmsService::new(&mut modem);

        let mut slots: Vec<SmsSlot, 8> = Vec::new();
        sms.list(SmsStatus::All, &mut slots).unwrap();

        assert_eq!(slots.len(), 2);
        assert_eq!(
            slots[0],
            SmsSlot {
                index: 1,
                status: SmsStatus::RecRead,
                length: 24
            }
        );
        assert_eq!(
            slots[1],
            SmsSlot {
                index: 3,
                status: SmsStatus::RecUnread,
                length: 30
            }
        );

        let (serial, _) = modem.release();
        assert_eq!(serial.written(), b"AT+CMGF=0\r\nAT+CMGL=4\r\n");
    }

    #[test]
    fn test_list_discards_overflowing_entries() {
        let mut modem = modem(
            b"OK\r\n+CMGL: 1,1,,24\r\nDEADBEEF\r\n+CMGL: 3,0,,30\r\nCAFE\r\nOK\r\n",
        );
        let mut sms = SmsService::new(&mut modem);

        let mut slots: Vec<SmsSlot, 1> = Vec::new();
        sms.list(SmsStatus::All, &mut slots).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].index, 1);
    }

    #[test]
    fn test_delete_flows() {
        let mut modem = modem(b"OK\r\nOK\r\n");
        let mut sms = SmsService::new(&mut modem);
        sms.delete(3).unwrap();
        sms.delete_all().unwrap();

        let (serial, _) = modem.release();
        assert_eq!(serial.written(), b"AT+CMGD=3,0\r\nAT+CMGD=1,4\r\n");
    }

    #[test]
    fn test_cmti_handler_queues_index() {
        let mut queue: Queue<u8, 4> = Queue::new();
        let (producer, mut consumer) = queue.split();
        let mut handler = CmtiHandler::new(producer);

        {
            let mut modem = ModemSerial::<_, _, 1000, 256>::new(
                MockSerial::new(b"+CMTI: \"SM\",4\r\n"),
                MockTimer::new(),
                Config::new(),
            );
            modem.register_event_handler(&mut handler).unwrap();
            modem.listen(100).unwrap();
        }

        assert_eq!(consumer.dequeue(), Some(4));
        assert_eq!(consumer.dequeue(), None);
    }
}
