//! Line framing and multi-part reassembly
//!
//! Each inbound line is classified into an explicit [`Frame`] result instead
//! of relying on error propagation, so a malformed record can never end the
//! read loop. Only the fragment-total value `2` triggers accumulation; lines
//! announcing any other total are treated as complete single-part messages.

use std::fmt;

use crate::constants::framing::{
    FIELD_SEPARATOR, FRAGMENT_NUMBER_FIELD, FRAGMENT_TOTAL_FIELD, IGNORED_TALKER, MIN_FIELDS,
    MULTIPART_FRAGMENT_TOTAL, PAYLOAD_FIELD,
};

/// Why a line did not produce a sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than the minimum number of comma-separated fields
    TooFewFields,
    /// Line carries the ignored `$ABVSI` tag
    IgnoredTalker,
    /// Fragment total is not an integer
    InvalidFragmentTotal,
    /// Fragment number is not an integer
    InvalidFragmentNumber,
    /// No payload field present
    MissingPayload,
    /// Line exceeded the length limit before its terminator
    LineTooLong,
}

impl SkipReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TooFewFields => "too few fields",
            Self::IgnoredTalker => "ignored talker",
            Self::InvalidFragmentTotal => "invalid fragment total",
            Self::InvalidFragmentNumber => "invalid fragment number",
            Self::MissingPayload => "missing payload",
            Self::LineTooLong => "line too long",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of feeding one line to the assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete sentence payload
    Complete(String),
    /// Fragment stored, more parts expected
    Pending,
    /// Line dropped
    Skipped(SkipReason),
}

impl Frame {
    /// Consume the frame, returning the completed sentence if any
    #[must_use]
    pub fn into_sentence(self) -> Option<String> {
        match self {
            Self::Complete(sentence) => Some(sentence),
            Self::Pending | Self::Skipped(_) => None,
        }
    }
}

/// Reassembles fragmented sentences line by line
///
/// Holds the payload accumulated so far for the multi-part message in
/// progress. One assembler belongs to exactly one session.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    pending: String,
}

impl FrameAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload accumulated for the multi-part message in progress
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Classify one raw line
    pub fn push_line(&mut self, line: &str) -> Frame {
        let mut fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        // The relay's own splitter discards trailing empty fields
        while fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }

        if fields.len() < MIN_FIELDS {
            return Frame::Skipped(SkipReason::TooFewFields);
        }
        if fields[0] == IGNORED_TALKER {
            return Frame::Skipped(SkipReason::IgnoredTalker);
        }

        let Ok(fragment_total) = fields[FRAGMENT_TOTAL_FIELD].parse::<i32>() else {
            return Frame::Skipped(SkipReason::InvalidFragmentTotal);
        };
        let Some(payload) = fields.get(PAYLOAD_FIELD) else {
            return Frame::Skipped(SkipReason::MissingPayload);
        };

        if fragment_total != MULTIPART_FRAGMENT_TOTAL {
            return Frame::Complete((*payload).to_string());
        }

        // The chunk is kept even if the fragment number turns out malformed
        self.pending.push_str(payload);
        let Ok(fragment_number) = fields[FRAGMENT_NUMBER_FIELD].parse::<i32>() else {
            return Frame::Skipped(SkipReason::InvalidFragmentNumber);
        };

        if fragment_number == fragment_total {
            Frame::Complete(std::mem::take(&mut self.pending))
        } else {
            Frame::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_part_sentence() {
        let mut assembler = FrameAssembler::new();
        let frame = assembler.push_line("!AIVDM,1,1,,A,13aEOK?P00PD2wVMdLDRhgvL289?,0*26");
        assert_eq!(
            frame,
            Frame::Complete("13aEOK?P00PD2wVMdLDRhgvL289?".to_string())
        );
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn test_two_part_sentence() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(
            assembler.push_line("!AIVDM,2,1,3,B,55P5TL01VIaAL@7WKO@mBplU@<PDhh,0*3E"),
            Frame::Pending
        );
        assert_eq!(assembler.pending(), "55P5TL01VIaAL@7WKO@mBplU@<PDhh");

        assert_eq!(
            assembler.push_line("!AIVDM,2,2,3,B,00000000000,2*23"),
            Frame::Complete("55P5TL01VIaAL@7WKO@mBplU@<PDhh00000000000".to_string())
        );
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn test_three_part_totals_are_single_part() {
        // Only a fragment total of exactly 2 accumulates
        let mut assembler = FrameAssembler::new();
        assert_eq!(
            assembler.push_line("!AIVDM,3,1,4,A,first,0"),
            Frame::Complete("first".to_string())
        );
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn test_too_few_fields() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(
            assembler.push_line("garbage"),
            Frame::Skipped(SkipReason::TooFewFields)
        );
        assert_eq!(
            assembler.push_line("a,b,c,d"),
            Frame::Skipped(SkipReason::TooFewFields)
        );
    }

    #[test]
    fn test_trailing_empty_fields_do_not_count() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(
            assembler.push_line("X,1,1,,,"),
            Frame::Skipped(SkipReason::TooFewFields)
        );
    }

    #[test]
    fn test_five_fields_without_payload() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(
            assembler.push_line("X,1,1,Y,Z"),
            Frame::Skipped(SkipReason::MissingPayload)
        );
        assert_eq!(
            assembler.push_line("X,2,1,Y,Z"),
            Frame::Skipped(SkipReason::MissingPayload)
        );
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn test_ignored_talker() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(
            assembler.push_line("$ABVSI,1,1,Y,Z,0ABC"),
            Frame::Skipped(SkipReason::IgnoredTalker)
        );
    }

    #[test]
    fn test_invalid_fragment_total() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(
            assembler.push_line("X,one,1,Y,Z,0ABC"),
            Frame::Skipped(SkipReason::InvalidFragmentTotal)
        );
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn test_invalid_fragment_number_keeps_chunk() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(
            assembler.push_line("X,2,?,Y,Z,abc"),
            Frame::Skipped(SkipReason::InvalidFragmentNumber)
        );
        assert_eq!(assembler.pending(), "abc");

        assert_eq!(
            assembler.push_line("X,2,2,Y,Z,def"),
            Frame::Complete("abcdef".to_string())
        );
    }

    #[test]
    fn test_malformed_line_between_fragments() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.push_line("X,2,1,Y,Z,15"), Frame::Pending);
        assert_eq!(
            assembler.push_line("noise"),
            Frame::Skipped(SkipReason::TooFewFields)
        );
        assert_eq!(
            assembler.push_line("X,2,2,Y,Z,Mv"),
            Frame::Complete("15Mv".to_string())
        );
    }

    #[test]
    fn test_into_sentence() {
        assert_eq!(
            Frame::Complete("1abc".to_string()).into_sentence(),
            Some("1abc".to_string())
        );
        assert_eq!(Frame::Pending.into_sentence(), None);
        assert_eq!(
            Frame::Skipped(SkipReason::MissingPayload).into_sentence(),
            None
        );
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::IgnoredTalker.to_string(), "ignored talker");
        assert_eq!(SkipReason::TooFewFields.to_string(), "too few fields");
    }
}
