//! Message-type acceptance filter
//!
//! The feed carries every AIS message type; only four are kept.
//! The first payload character encodes the message type in AIS six-bit
//! ASCII, so the filter is an exact match on that character.

use std::fmt;

use crate::constants::message_type::{TYPE_0, TYPE_1, TYPE_2, TYPE_18};

/// Message types accepted into the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcceptedType {
    /// Message type 0
    Type0,
    /// Message type 1, class A position report
    Type1,
    /// Message type 2, class A position report (assigned schedule)
    Type2,
    /// Message type 18, class B position report
    Type18,
}

impl AcceptedType {
    /// Classify a sentence by its leading character
    ///
    /// Returns `None` for empty sentences and every other message type.
    #[must_use]
    pub fn classify(sentence: &str) -> Option<Self> {
        match sentence.chars().next()? {
            TYPE_0 => Some(Self::Type0),
            TYPE_1 => Some(Self::Type1),
            TYPE_2 => Some(Self::Type2),
            TYPE_18 => Some(Self::Type18),
            _ => None,
        }
    }

    /// Numeric AIS message id
    #[must_use]
    pub const fn message_id(&self) -> u8 {
        match self {
            Self::Type0 => 0,
            Self::Type1 => 1,
            Self::Type2 => 2,
            Self::Type18 => 18,
        }
    }
}

impl fmt::Display for AcceptedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message type {}", self.message_id())
    }
}

/// Whether a completed sentence should reach the buffer
#[must_use]
#[inline]
pub fn accepts(sentence: &str) -> bool {
    AcceptedType::classify(sentence).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_leading_characters() {
        assert_eq!(AcceptedType::classify("0ABC"), Some(AcceptedType::Type0));
        assert_eq!(AcceptedType::classify("13aEOK"), Some(AcceptedType::Type1));
        assert_eq!(AcceptedType::classify("2xyz"), Some(AcceptedType::Type2));
        assert_eq!(AcceptedType::classify("B52K"), Some(AcceptedType::Type18));
    }

    #[test]
    fn test_rejected_leading_characters() {
        // Type 3 and type 5 (static data) sit right next to accepted types
        assert!(!accepts("3abc"));
        assert!(!accepts("55P5TL"));
        assert!(!accepts("Cabc"));
        assert!(!accepts("b52"));
        assert!(!accepts(" 1abc"));
    }

    #[test]
    fn test_empty_sentence_rejected() {
        assert!(!accepts(""));
        assert_eq!(AcceptedType::classify(""), None);
    }

    #[test]
    fn test_message_ids() {
        assert_eq!(AcceptedType::Type0.message_id(), 0);
        assert_eq!(AcceptedType::Type18.message_id(), 18);
        assert_eq!(AcceptedType::Type18.to_string(), "message type 18");
    }
}
