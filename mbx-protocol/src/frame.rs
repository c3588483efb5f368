//! Frame encoding and decoding for the UART loop bus.
//!
//! Frame format:
//! - START (1 byte): `^` (0x5E)
//! - FIELDS: text fields separated by `|` (0x7C); field 0 is the message
//!   kind, field 1 the sender id
//! - END (1 byte): `~` (0x7E)
//!
//! There is no length prefix and no escaping. A field may not contain any
//! of the three token bytes; the encoder refuses such values instead of
//! emitting a frame that would corrupt the stream.

use heapless::Vec;

/// Frame start token
pub const FRAME_START: u8 = b'^';

/// Frame end token
pub const FRAME_END: u8 = b'~';

/// Field separator
pub const FIELD_DELIM: u8 = b'|';

/// Maximum number of bytes between START and END
pub const MAX_BODY_SIZE: usize = 250;

/// Maximum complete frame size (START + body + END)
pub const MAX_FRAME_SIZE: usize = 1 + MAX_BODY_SIZE + 1;

/// Maximum number of fields kept by [`decode`]
pub const MAX_FIELDS: usize = 8;

/// Bytes between START and END of one frame
pub type FrameBody = Vec<u8, MAX_BODY_SIZE>;

/// A complete frame ready to be written to the wire
pub type FrameBytes = Vec<u8, MAX_FRAME_SIZE>;

/// Decoded fields, borrowing from the frame body
pub type Fields<'a> = Vec<&'a str, MAX_FIELDS>;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// A field value contains `^`, `|` or `~`
    ReservedByte,
    /// Frame would exceed [`MAX_FRAME_SIZE`]
    FrameTooLong,
    /// Field does not fit its fixed-capacity string
    FieldTooLong,
    /// Frame body is not valid UTF-8
    InvalidUtf8,
    /// Not enough fields for the message kind
    TooFewFields,
    /// Field 0 names no known message kind
    UnknownKind,
}

/// Returns true if `byte` is one of the framing tokens
pub fn is_reserved(byte: u8) -> bool {
    matches!(byte, FRAME_START | FRAME_END | FIELD_DELIM)
}

/// Check that a field value can be carried without escaping
pub fn validate_field(value: &str) -> Result<(), FrameError> {
    if value.bytes().any(is_reserved) {
        return Err(FrameError::ReservedByte);
    }
    Ok(())
}

/// Encode a frame: `START kind | sender_id | fields... END`
pub fn encode(kind: &str, sender_id: &str, fields: &[&str]) -> Result<FrameBytes, FrameError> {
    let mut frame = FrameBytes::new();
    frame.push(FRAME_START).map_err(|_| FrameError::FrameTooLong)?;

    let all = [kind, sender_id].into_iter().chain(fields.iter().copied());
    for (i, value) in all.enumerate() {
        validate_field(value)?;
        if i > 0 {
            frame.push(FIELD_DELIM).map_err(|_| FrameError::FrameTooLong)?;
        }
        frame
            .extend_from_slice(value.as_bytes())
            .map_err(|_| FrameError::FrameTooLong)?;
    }

    frame.push(FRAME_END).map_err(|_| FrameError::FrameTooLong)?;
    Ok(frame)
}

/// Split a frame body into its fields
///
/// Field count is not validated; callers check the length before indexing.
/// An empty body yields no fields. Fields past [`MAX_FIELDS`] are ignored.
pub fn decode(body: &[u8]) -> Result<Fields<'_>, FrameError> {
    let text = core::str::from_utf8(body).map_err(|_| FrameError::InvalidUtf8)?;
    let mut fields = Fields::new();
    if text.is_empty() {
        return Ok(fields);
    }
    for field in text.split(FIELD_DELIM as char) {
        if fields.push(field).is_err() {
            break;
        }
    }
    Ok(fields)
}

/// Re-wrap a received body with START/END for forwarding, byte for byte
pub fn wrap(body: &[u8]) -> Result<FrameBytes, FrameError> {
    let mut frame = FrameBytes::new();
    frame.push(FRAME_START).map_err(|_| FrameError::FrameTooLong)?;
    frame
        .extend_from_slice(body)
        .map_err(|_| FrameError::FrameTooLong)?;
    frame.push(FRAME_END).map_err(|_| FrameError::FrameTooLong)?;
    Ok(frame)
}

/// State machine for extracting frames from a noisy byte stream
///
/// Bytes outside a frame are discarded. A START seen while accumulating
/// throws away the partial frame and starts over, which recovers from a
/// truncated frame without a length prefix.
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: FrameBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for START byte
    WaitingForStart,
    /// Got START, collecting body bytes until END
    Accumulating,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub const fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            buffer: Vec::new(),
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.buffer.clear();
    }

    /// True between a START and its END
    pub fn is_mid_frame(&self) -> bool {
        self.state == ParseState::Accumulating
    }

    /// Number of body bytes collected for the current frame
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(body))` when END closes a frame, `Ok(None)` when more
    /// bytes are needed, or `Err(FrameTooLong)` when a frame overran the
    /// buffer (the parser then waits for the next START).
    pub fn feed(&mut self, byte: u8) -> Result<Option<FrameBody>, FrameError> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == FRAME_START {
                    self.buffer.clear();
                    self.state = ParseState::Accumulating;
                }
                Ok(None)
            }
            ParseState::Accumulating => match byte {
                FRAME_START => {
                    // Resync: previous frame never ended
                    self.buffer.clear();
                    Ok(None)
                }
                FRAME_END => {
                    self.state = ParseState::WaitingForStart;
                    Ok(Some(core::mem::take(&mut self.buffer)))
                }
                _ => {
                    if self.buffer.push(byte).is_err() {
                        self.reset();
                        return Err(FrameError::FrameTooLong);
                    }
                    Ok(None)
                }
            },
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<FrameBody>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_status_frame() {
        let frame = encode("Status", "A", &["GatewayHeartbeat", "42"]).unwrap();
        assert_eq!(&frame[..], b"^Status|A|GatewayHeartbeat|42~");
    }

    #[test]
    fn test_encode_rejects_reserved_bytes() {
        assert_eq!(
            encode("Foo", "A", &["pipe|inside"]),
            Err(FrameError::ReservedByte)
        );
        assert_eq!(encode("Foo", "~A", &["x"]), Err(FrameError::ReservedByte));
        assert_eq!(encode("^Foo", "A", &["x"]), Err(FrameError::ReservedByte));
    }

    #[test]
    fn test_encode_too_long() {
        let long = [b'x'; MAX_BODY_SIZE];
        let long = core::str::from_utf8(&long).unwrap();
        assert_eq!(encode("Foo", "A", &[long]), Err(FrameError::FrameTooLong));
    }

    #[test]
    fn test_decode_splits_on_delimiter() {
        let fields = decode(b"Foo|some-sender|This is a foo message").unwrap();
        assert_eq!(&fields[..], &["Foo", "some-sender", "This is a foo message"]);
    }

    #[test]
    fn test_decode_empty_body() {
        assert!(decode(b"").unwrap().is_empty());
    }

    #[test]
    fn test_decode_keeps_empty_fields() {
        let fields = decode(b"Status|A||").unwrap();
        assert_eq!(&fields[..], &["Status", "A", "", ""]);
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert_eq!(decode(&[0xFF, b'|', 0xFE]), Err(FrameError::InvalidUtf8));
    }

    #[test]
    fn test_wrap_preserves_body() {
        let frame = wrap(b"Foo|B|hello").unwrap();
        assert_eq!(&frame[..], b"^Foo|B|hello~");
    }

    #[test]
    fn test_parser_skips_junk_between_frames() {
        let stream = b"this-is-junk^Foo|s|first~\n^Foo|s|second~more-junk";
        let mut parser = FrameParser::new();
        let mut rest = &stream[..];

        let mut bodies = std::vec::Vec::new();
        while !rest.is_empty() {
            let (byte, tail) = rest.split_first().unwrap();
            rest = tail;
            if let Some(body) = parser.feed(*byte).unwrap() {
                bodies.push(body);
            }
        }

        assert_eq!(bodies.len(), 2);
        assert_eq!(&bodies[0][..], b"Foo|s|first");
        assert_eq!(&bodies[1][..], b"Foo|s|second");
        assert!(!parser.is_mid_frame());
    }

    #[test]
    fn test_parser_resync_on_second_start() {
        let mut parser = FrameParser::new();
        let body = parser.feed_bytes(b"^Foo|x|trunc^Foo|y|whole~").unwrap().unwrap();
        assert_eq!(&body[..], b"Foo|y|whole");
    }

    #[test]
    fn test_parser_ignores_end_outside_frame() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(b"~~abc~"), Ok(None));
        assert!(!parser.is_mid_frame());
    }

    #[test]
    fn test_parser_partial_frame_resumes() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(b"^Status|A|Gate"), Ok(None));
        assert!(parser.is_mid_frame());
        assert_eq!(parser.pending_len(), 13);

        let body = parser.feed_bytes(b"wayHeartbeat|1~").unwrap().unwrap();
        assert_eq!(&body[..], b"Status|A|GatewayHeartbeat|1");
    }

    #[test]
    fn test_parser_overflow_resets() {
        let mut parser = FrameParser::new();
        parser.feed(FRAME_START).unwrap();
        for _ in 0..MAX_BODY_SIZE {
            assert_eq!(parser.feed(b'x'), Ok(None));
        }
        assert_eq!(parser.feed(b'x'), Err(FrameError::FrameTooLong));
        assert!(!parser.is_mid_frame());

        // Parser recovers on the next frame
        let body = parser.feed_bytes(b"xx~^Foo|a|b~").unwrap().unwrap();
        assert_eq!(&body[..], b"Foo|a|b");
    }

    fn field() -> impl Strategy<Value = std::string::String> {
        "[A-Za-z0-9 .:_-]{0,16}"
    }

    proptest! {
        #[test]
        fn prop_encode_decode_roundtrip(
            kind in "[A-Za-z]{1,8}",
            sender in field(),
            rest in proptest::collection::vec(field(), 0..6),
        ) {
            let refs: std::vec::Vec<&str> = rest.iter().map(|s| s.as_str()).collect();
            let frame = encode(&kind, &sender, &refs).unwrap();

            let mut parser = FrameParser::new();
            let body = parser.feed_bytes(&frame).unwrap().unwrap();
            let fields = decode(&body).unwrap();

            prop_assert_eq!(fields[0], kind.as_str());
            prop_assert_eq!(fields[1], sender.as_str());
            prop_assert_eq!(&fields[2..], &refs[..]);
        }
    }
}
