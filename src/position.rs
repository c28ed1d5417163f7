use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Number of a segment file within a queue's log.
///
/// Segment numbers start at 1 and only ever increase.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentNumber(u64);

impl Default for SegmentNumber {
    fn default() -> Self {
        SegmentNumber::FIRST
    }
}

impl From<u64> for SegmentNumber {
    fn from(val: u64) -> Self {
        SegmentNumber(val)
    }
}

impl From<SegmentNumber> for u64 {
    fn from(segment_number: SegmentNumber) -> u64 {
        segment_number.0
    }
}

impl SegmentNumber {
    pub const FIRST: SegmentNumber = SegmentNumber(1);

    pub fn next(self) -> SegmentNumber {
        SegmentNumber(self.0 + 1)
    }

    /// Iterates over all segment numbers from `self` to `last`, both included.
    pub fn up_to(self, last: SegmentNumber) -> impl Iterator<Item = SegmentNumber> {
        (self.0..=last.0).map(SegmentNumber)
    }
}

impl Display for SegmentNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_number_next() {
        assert_eq!(SegmentNumber::FIRST.next(), SegmentNumber::from(2));
        assert_eq!(SegmentNumber::default(), SegmentNumber::FIRST);
    }

    #[test]
    fn test_segment_number_up_to() {
        let segments: Vec<u64> = SegmentNumber::from(2)
            .up_to(SegmentNumber::from(4))
            .map(u64::from)
            .collect();
        assert_eq!(segments, vec![2, 3, 4]);
        assert_eq!(
            SegmentNumber::from(3).up_to(SegmentNumber::from(2)).count(),
            0
        );
    }

    #[test]
    fn test_segment_number_serializes_as_plain_number() {
        let json = serde_json::to_string(&SegmentNumber::from(7)).unwrap();
        assert_eq!(json, "7");
    }
}
