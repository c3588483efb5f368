//! Radio message batching
//!
//! Every radio cycle sends at most one packet. All application messages
//! queued since the last cycle are joined into that packet with `|`:
//!
//! ```text
//! MailboxDoorOpened|MailboxTemperature:71|RoadMainLoopHeartbeat
//! ```
//!
//! Each message is usually a `Key:Value` pair, but the batch layer does not
//! look inside messages.

use core::fmt::Write;

use heapless::String;

/// Separator between messages in a batch
pub const BATCH_DELIM: char = '|';

/// Separator between key and value inside one message
pub const KV_DELIM: char = ':';

/// Largest batch that fits one radio packet
pub const MAX_BATCH_LEN: usize = 255;

/// Largest single application message
pub const MAX_MESSAGE_LEN: usize = 64;

/// One application message queued for the radio
pub type RadioMessage = String<MAX_MESSAGE_LEN>;

/// One radio packet worth of messages
pub type Batch = String<MAX_BATCH_LEN>;

/// Errors from building batches and messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatchError {
    /// Message contains the batch delimiter
    ReservedByte,
    /// Message is empty
    Empty,
    /// Message does not fit in the remaining batch space
    Full,
    /// Message is longer than [`MAX_MESSAGE_LEN`]
    TooLong,
}

/// Incrementally joins messages into one batch
#[derive(Debug, Clone, Default)]
pub struct BatchBuilder {
    batch: Batch,
    count: usize,
}

impl BatchBuilder {
    pub const fn new() -> Self {
        Self {
            batch: String::new(),
            count: 0,
        }
    }

    /// Returns true if `message` would fit after the messages already added
    pub fn fits(&self, message: &str) -> bool {
        let sep = if self.count > 0 { 1 } else { 0 };
        self.batch.len() + sep + message.len() <= MAX_BATCH_LEN
    }

    /// Append a message
    ///
    /// On `Err(Full)` the builder is unchanged and the message can be
    /// carried into the next batch.
    pub fn push(&mut self, message: &str) -> Result<(), BatchError> {
        if message.is_empty() {
            return Err(BatchError::Empty);
        }
        if message.contains(BATCH_DELIM) {
            return Err(BatchError::ReservedByte);
        }
        if !self.fits(message) {
            return Err(BatchError::Full);
        }
        if self.count > 0 {
            // Capacity checked by fits()
            let _ = self.batch.push(BATCH_DELIM);
        }
        let _ = self.batch.push_str(message);
        self.count += 1;
        Ok(())
    }

    /// Number of messages in the batch
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn as_str(&self) -> &str {
        &self.batch
    }

    pub fn finish(self) -> Batch {
        self.batch
    }
}

/// Join messages into one batch
pub fn join<'a, I>(messages: I) -> Result<Batch, BatchError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut builder = BatchBuilder::new();
    for message in messages {
        builder.push(message)?;
    }
    Ok(builder.finish())
}

/// Split a received batch into its messages
///
/// An empty batch yields no messages.
pub fn split(batch: &str) -> Messages<'_> {
    Messages {
        inner: if batch.is_empty() {
            None
        } else {
            Some(batch.split(BATCH_DELIM))
        },
    }
}

/// Iterator over the messages of a batch, see [`split`]
#[derive(Debug, Clone)]
pub struct Messages<'a> {
    inner: Option<core::str::Split<'a, char>>,
}

impl<'a> Iterator for Messages<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }
}

/// Build a `Key:Value` message
pub fn key_value(key: &str, value: &str) -> Result<RadioMessage, BatchError> {
    if key.contains(BATCH_DELIM) || value.contains(BATCH_DELIM) {
        return Err(BatchError::ReservedByte);
    }
    let mut message = RadioMessage::new();
    write!(message, "{}{}{}", key, KV_DELIM, value).map_err(|_| BatchError::TooLong)?;
    Ok(message)
}

/// Split a message into key and value
///
/// A message without `:` is a bare key with an empty value.
pub fn split_key_value(message: &str) -> (&str, &str) {
    message.split_once(KV_DELIM).unwrap_or((message, ""))
}

/// Copy a string into a queueable radio message
pub fn radio_message(text: &str) -> Result<RadioMessage, BatchError> {
    if text.contains(BATCH_DELIM) {
        return Err(BatchError::ReservedByte);
    }
    RadioMessage::try_from(text).map_err(|_| BatchError::TooLong)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_join_messages() {
        let batch = join(["MailboxDoorOpened", "MailboxTemperature:71"]).unwrap();
        assert_eq!(batch.as_str(), "MailboxDoorOpened|MailboxTemperature:71");
    }

    #[test]
    fn test_join_nothing_is_empty() {
        let batch = join(core::iter::empty()).unwrap();
        assert!(batch.is_empty());
        assert_eq!(split(&batch).count(), 0);
    }

    #[test]
    fn test_push_rejects_delimiter_and_empty() {
        let mut builder = BatchBuilder::new();
        assert_eq!(builder.push("a|b"), Err(BatchError::ReservedByte));
        assert_eq!(builder.push(""), Err(BatchError::Empty));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_push_full_leaves_builder_unchanged() {
        let mut builder = BatchBuilder::new();
        let chunk = [b'x'; 200];
        let chunk = core::str::from_utf8(&chunk).unwrap();
        builder.push(chunk).unwrap();

        let tail = [b'y'; 60];
        let tail = core::str::from_utf8(&tail).unwrap();
        assert!(!builder.fits(tail));
        assert_eq!(builder.push(tail), Err(BatchError::Full));
        assert_eq!(builder.count(), 1);
        assert_eq!(builder.as_str().len(), 200);

        // 200 + '|' + 54 = 255 fits exactly
        assert!(builder.push(&tail[..54]).is_ok());
        assert_eq!(builder.as_str().len(), MAX_BATCH_LEN);
    }

    #[test]
    fn test_split_single_message() {
        let messages: std::vec::Vec<&str> = split("GatewayHeartbeat:3").collect();
        assert_eq!(messages, ["GatewayHeartbeat:3"]);
    }

    #[test]
    fn test_key_value() {
        let msg = key_value("MailboxTemperature", "71").unwrap();
        assert_eq!(msg.as_str(), "MailboxTemperature:71");
        assert_eq!(split_key_value(&msg), ("MailboxTemperature", "71"));
        assert_eq!(split_key_value("MuleAlarm"), ("MuleAlarm", ""));
        assert_eq!(key_value("a|b", "1"), Err(BatchError::ReservedByte));
    }

    #[test]
    fn test_radio_message_limits() {
        assert!(radio_message("DspMainLoopHeartbeat").is_ok());
        assert_eq!(radio_message("a|b"), Err(BatchError::ReservedByte));
        let long = [b'z'; MAX_MESSAGE_LEN + 1];
        let long = core::str::from_utf8(&long).unwrap();
        assert_eq!(radio_message(long), Err(BatchError::TooLong));
    }

    proptest! {
        #[test]
        fn prop_join_split_inverse(
            messages in proptest::collection::vec("[A-Za-z0-9:. ]{1,12}", 0..12),
        ) {
            let batch = join(messages.iter().map(|m| m.as_str())).unwrap();
            let split_back: std::vec::Vec<&str> = split(&batch).collect();
            prop_assert_eq!(split_back, messages);
        }
    }
}
