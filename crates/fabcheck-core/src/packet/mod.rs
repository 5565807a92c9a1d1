// ── Packet model ──
//
// Test frames are described as an ordered list of typed layers, assembled
// into immutable `Bytes`, and compared against captures either exactly or
// through an `IgnoreMask`.

mod decode;
pub mod dhcp;
mod encode;
mod hexdump;
pub mod layers;
mod mask;
pub mod simple;

use std::fmt;

use bytes::Bytes;
use thiserror::Error;

pub use decode::{DecodedLayer, Field, ParsedPacket, parse_packet};
pub use encode::{PAD_BYTE, build_packet, build_packet_padded};
pub use hexdump::hex_dump;
pub use layers::Layer;
pub use mask::{FieldDiff, IgnoreMask, diff, frames_match};
pub use simple::PacketSpec;

/// Errors raised while assembling or decoding frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// A field value cannot be encoded, or was set without the option
    /// that enables it (e.g. a VLAN id without `dl_vlan_enable`).
    #[error("invalid {field}: {reason}")]
    Field { field: &'static str, reason: String },

    /// Layers are in an order the encoder cannot serialize.
    #[error("cannot encode {layer}: {reason}")]
    Layout { layer: &'static str, reason: String },

    #[error("invalid hex at offset {offset}: {reason}")]
    Hex { offset: usize, reason: String },

    #[error("truncated {layer} header: need {needed} bytes, {available} available")]
    Truncated {
        layer: &'static str,
        needed: usize,
        available: usize,
    },
}

/// An assembled frame.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Packet(Bytes);

impl Packet {
    pub fn build(layers: &[Layer]) -> Result<Self, PacketError> {
        build_packet(layers).map(Self)
    }

    /// Raw frame from a hex string. Whitespace (including newlines) is
    /// ignored, so pasted dumps work as-is. Used for IPv6 and other
    /// frames the layer model does not cover.
    pub fn from_hex(input: &str) -> Result<Self, PacketError> {
        let (digits, positions): (String, Vec<usize>) = input
            .char_indices()
            .filter(|(_, c)| !c.is_whitespace())
            .map(|(i, c)| (c, i))
            .unzip();

        match hex::decode(&digits) {
            Ok(raw) => Ok(Self(Bytes::from(raw))),
            Err(hex::FromHexError::InvalidHexCharacter { c, index }) => Err(PacketError::Hex {
                offset: positions.get(index).copied().unwrap_or(index),
                reason: format!("{c:?} is not a hex digit"),
            }),
            Err(hex::FromHexError::OddLength) => Err(PacketError::Hex {
                offset: input.len(),
                reason: "odd number of hex digits".into(),
            }),
            Err(e) => Err(PacketError::Hex {
                offset: 0,
                reason: e.to_string(),
            }),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Cheap clone of the underlying buffer.
    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn parse(&self) -> Result<ParsedPacket, PacketError> {
        parse_packet(&self.0)
    }
}

impl From<Bytes> for Packet {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for Packet {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packet({} bytes: {})", self.0.len(), self.to_hex())
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_tolerates_whitespace() {
        let pkt = Packet::from_hex("3333 0000 0001\n  0001 0203 0405\t86dd").unwrap();
        assert_eq!(pkt.len(), 14);
        assert_eq!(&pkt.as_bytes()[12..], &[0x86, 0xdd]);
    }

    #[test]
    fn from_hex_reports_offset_in_input() {
        let err = Packet::from_hex("00 11 2g").unwrap_err();
        assert_eq!(
            err,
            PacketError::Hex {
                offset: 7,
                reason: "'g' is not a hex digit".into()
            }
        );
    }

    #[test]
    fn from_hex_rejects_odd_length() {
        assert!(matches!(
            Packet::from_hex("abc"),
            Err(PacketError::Hex { .. })
        ));
    }
}
