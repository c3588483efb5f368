//! mbx-iot wire formats
//!
//! This crate defines the two formats every node speaks:
//!
//! - the UART loop bus frame, a text frame between co-located boards
//! - the radio batch, one LoRa packet carrying several short messages
//!
//! # Loop bus frame
//!
//! ```text
//! ┌───────┬──────┬───┬──────────┬───┬──────────┬───┬─────┐
//! │ START │ KIND │ | │ SENDERID │ | │ FIELD... │ | │ END │
//! │ ^     │      │   │          │   │          │   │ ~   │
//! └───────┴──────┴───┴──────────┴───┴──────────┴───┴─────┘
//! ```
//!
//! There is no length byte and no checksum. Receivers resynchronize on the
//! next START, and boards forward every frame they did not originate, so a
//! frame travels the loop once and is dropped by its sender.
//!
//! # Radio batch
//!
//! ```text
//! MailboxDoorOpened|MailboxTemperature:71|RoadMainLoopHeartbeat
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod batch;
pub mod frame;
pub mod keys;
pub mod messages;

pub use batch::{Batch, BatchBuilder, BatchError, RadioMessage, MAX_BATCH_LEN, MAX_MESSAGE_LEN};
pub use frame::{FrameBody, FrameBytes, FrameError, FrameParser, FRAME_END, FRAME_START};
pub use messages::{FooMsg, Message, MsgKind, StatusMsg, LOOPBACK_SENDER_ID};
