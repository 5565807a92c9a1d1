// Masked comparison and structural diff.

use std::collections::BTreeSet;
use std::ops::Range;

use super::decode::{Field, parse_packet};

/// Fields (and raw byte ranges) excluded from packet comparison.
///
/// Named fields use the paths produced by [`ParsedPacket::fields`], e.g.
/// `ipv4.id`, `ipv4.checksum`, `udp.checksum`, `dot1q.pcp`. They are
/// resolved against the expected frame's own layout, so the same mask
/// works for tagged and untagged frames.
///
/// [`ParsedPacket::fields`]: super::ParsedPacket::fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreMask {
    fields: BTreeSet<String>,
    ranges: Vec<Range<usize>>,
}

impl IgnoreMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, path: impl Into<String>) -> Self {
        self.fields.insert(path.into());
        self
    }

    pub fn fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn range(mut self, range: Range<usize>) -> Self {
        self.ranges.push(range);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.ranges.is_empty()
    }

    /// IPv4 id and header checksum, the fields routers and relays rewrite
    /// without affecting what the test asserts.
    pub fn ipv4_id_and_checksum() -> Self {
        Self::new().fields(["ipv4.id", "ipv4.checksum"])
    }

    fn ignores(&self, path: &str) -> bool {
        self.fields.contains(path)
    }

    /// Per-byte comparison mask for a frame of `len` bytes laid out like
    /// `expected`. Bits set in the mask are compared.
    fn byte_mask(&self, expected: &[u8], len: usize) -> Vec<u8> {
        let mut mask = vec![0xff; len];

        if !self.fields.is_empty() {
            if let Ok(parsed) = parse_packet(expected) {
                for field in parsed.fields().iter().filter(|f| self.ignores(&f.path)) {
                    clear_field(&mut mask, field);
                }
            }
        }
        for range in &self.ranges {
            let end = range.end.min(len);
            if range.start < end {
                mask[range.start..end].fill(0);
            }
        }
        mask
    }
}

fn clear_field(mask: &mut [u8], field: &Field) {
    match field.bits {
        Some(bits) => {
            let [hi, lo] = bits.to_be_bytes();
            if let Some(b) = mask.get_mut(field.offset) {
                *b &= !hi;
            }
            if let Some(b) = mask.get_mut(field.offset + 1) {
                *b &= !lo;
            }
        }
        None => {
            let end = (field.offset + field.len).min(mask.len());
            if field.offset < end {
                mask[field.offset..end].fill(0);
            }
        }
    }
}

/// `true` if `actual` equals `expected` outside the ignored fields.
/// Frames of different length never match.
pub fn frames_match(expected: &[u8], actual: &[u8], mask: &IgnoreMask) -> bool {
    if expected.len() != actual.len() {
        return false;
    }
    if mask.is_empty() {
        return expected == actual;
    }
    let bytes = mask.byte_mask(expected, expected.len());
    expected
        .iter()
        .zip(actual)
        .zip(&bytes)
        .all(|((e, a), m)| e & m == a & m)
}

/// One differing field between two frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    pub field: String,
    pub expected: String,
    pub actual: String,
}

const ABSENT: &str = "<absent>";

/// Structural diff of two frames, skipping fields in `mask`.
///
/// Frames that do not decode are compared as a single `frame.bytes` field.
pub fn diff(expected: &[u8], actual: &[u8], mask: &IgnoreMask) -> Vec<FieldDiff> {
    let (Ok(exp), Ok(act)) = (parse_packet(expected), parse_packet(actual)) else {
        if expected == actual {
            return Vec::new();
        }
        return vec![FieldDiff {
            field: "frame.bytes".into(),
            expected: hex::encode(expected),
            actual: hex::encode(actual),
        }];
    };

    let exp_fields = exp.fields();
    let act_fields = act.fields();
    let mut diffs = Vec::new();

    for ef in exp_fields.iter().filter(|f| !mask.ignores(&f.path)) {
        match act_fields.iter().find(|af| af.path == ef.path) {
            Some(af) => {
                let differs = if ef.value.is_empty() {
                    // Derived length fields: compare the raw bytes.
                    expected.get(ef.offset..ef.offset + ef.len)
                        != actual.get(af.offset..af.offset + af.len)
                } else {
                    ef.value != af.value
                };
                if differs {
                    diffs.push(FieldDiff {
                        field: ef.path.clone(),
                        expected: display_value(ef, expected),
                        actual: display_value(af, actual),
                    });
                }
            }
            None => diffs.push(FieldDiff {
                field: ef.path.clone(),
                expected: display_value(ef, expected),
                actual: ABSENT.into(),
            }),
        }
    }

    for af in act_fields
        .iter()
        .filter(|af| !mask.ignores(&af.path) && !exp_fields.iter().any(|ef| ef.path == af.path))
    {
        diffs.push(FieldDiff {
            field: af.path.clone(),
            expected: ABSENT.into(),
            actual: display_value(af, actual),
        });
    }

    if diffs.is_empty() && expected.len() != actual.len() {
        diffs.push(FieldDiff {
            field: "frame.len".into(),
            expected: expected.len().to_string(),
            actual: actual.len().to_string(),
        });
    }
    diffs
}

fn display_value(field: &Field, frame: &[u8]) -> String {
    if field.value.is_empty() {
        frame
            .get(field.offset..field.offset + field.len)
            .map(hex::encode)
            .unwrap_or_default()
    } else {
        field.value.clone()
    }
}
