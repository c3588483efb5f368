//! Message types carried on the UART loop bus
//!
//! The kind tag in field 0 selects the variant; each variant validates the
//! shape of the remaining fields when it is built from a decoded frame.

use heapless::String;

use crate::frame::{self, FrameBytes, FrameError};

/// Maximum length of a single field value
pub const MAX_FIELD_LEN: usize = 64;

/// Fixed-capacity field value
pub type Field = String<MAX_FIELD_LEN>;

/// Sender id used by loopback test harnesses
///
/// Frames from this sender are dispatched locally but never forwarded, so a
/// board wired to itself does not echo forever.
pub const LOOPBACK_SENDER_ID: &str = "Loopback";

/// Fields every frame must carry before it can be acted on: kind, sender
/// and at least one payload field
pub const MIN_FIELDS: usize = 3;

/// Known message kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MsgKind {
    /// Free-form test/notification message
    Foo,
    /// Key/value status update
    Status,
}

const TAG_FOO: &str = "Foo";
const TAG_STATUS: &str = "Status";

impl MsgKind {
    /// Parse a kind from its wire tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            TAG_FOO => Some(MsgKind::Foo),
            TAG_STATUS => Some(MsgKind::Status),
            _ => None,
        }
    }

    /// Wire tag for this kind
    pub fn tag(self) -> &'static str {
        match self {
            MsgKind::Foo => TAG_FOO,
            MsgKind::Status => TAG_STATUS,
        }
    }
}

/// Copy a field into fixed-capacity storage, rejecting reserved bytes
pub fn field(value: &str) -> Result<Field, FrameError> {
    frame::validate_field(value)?;
    Field::try_from(value).map_err(|_| FrameError::FieldTooLong)
}

/// Free-form message: `[Foo, SenderID, Name]`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FooMsg {
    /// Originating node; blank means "stamp with the publisher's identity"
    pub sender_id: Field,
    pub name: Field,
}

impl FooMsg {
    pub fn new(name: &str) -> Result<Self, FrameError> {
        Ok(Self {
            sender_id: Field::new(),
            name: field(name)?,
        })
    }
}

/// Status update: `[Status, SenderID, Key, Value]`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusMsg {
    /// Originating node; blank means "stamp with the publisher's identity"
    pub sender_id: Field,
    pub key: Field,
    pub value: Field,
}

impl StatusMsg {
    pub fn new(key: &str, value: &str) -> Result<Self, FrameError> {
        Ok(Self {
            sender_id: Field::new(),
            key: field(key)?,
            value: field(value)?,
        })
    }
}

/// A typed loop bus message
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    Foo(FooMsg),
    Status(StatusMsg),
}

impl From<FooMsg> for Message {
    fn from(msg: FooMsg) -> Self {
        Message::Foo(msg)
    }
}

impl From<StatusMsg> for Message {
    fn from(msg: StatusMsg) -> Self {
        Message::Status(msg)
    }
}

impl Message {
    pub fn kind(&self) -> MsgKind {
        match self {
            Message::Foo(_) => MsgKind::Foo,
            Message::Status(_) => MsgKind::Status,
        }
    }

    pub fn sender_id(&self) -> &str {
        match self {
            Message::Foo(m) => m.sender_id.as_str(),
            Message::Status(m) => m.sender_id.as_str(),
        }
    }

    fn sender_id_mut(&mut self) -> &mut Field {
        match self {
            Message::Foo(m) => &mut m.sender_id,
            Message::Status(m) => &mut m.sender_id,
        }
    }

    /// Stamp the sender id if the message does not carry one yet
    pub fn stamp_sender(&mut self, sender_id: &str) -> Result<(), FrameError> {
        let slot = self.sender_id_mut();
        if slot.is_empty() {
            *slot = field(sender_id)?;
        }
        Ok(())
    }

    /// Encode this message into a complete frame
    pub fn encode(&self) -> Result<FrameBytes, FrameError> {
        let kind = self.kind().tag();
        match self {
            Message::Foo(m) => frame::encode(kind, &m.sender_id, &[m.name.as_str()]),
            Message::Status(m) => {
                frame::encode(kind, &m.sender_id, &[m.key.as_str(), m.value.as_str()])
            }
        }
    }

    /// Build a message from decoded frame fields
    ///
    /// Fields beyond what the kind defines are ignored; a missing Status
    /// value becomes an empty string.
    pub fn from_fields(fields: &[&str]) -> Result<Self, FrameError> {
        if fields.len() < MIN_FIELDS {
            return Err(FrameError::TooFewFields);
        }
        let kind = MsgKind::from_tag(fields[0]).ok_or(FrameError::UnknownKind)?;
        let sender_id = field(fields[1])?;
        let optional = |i: usize| field(fields.get(i).copied().unwrap_or(""));

        match kind {
            MsgKind::Foo => Ok(Message::Foo(FooMsg {
                sender_id,
                name: optional(2)?,
            })),
            MsgKind::Status => Ok(Message::Status(StatusMsg {
                sender_id,
                key: optional(2)?,
                value: optional(3)?,
            })),
        }
    }
}
