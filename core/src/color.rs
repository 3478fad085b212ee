use serde::{Deserialize, Serialize};

/// Color parcels whose coordinate has no row in the parcel table.
pub const UNLISTED: Rgb = Rgb::new(0x80, 0x80, 0x80);
/// Color for parcels referencing a group the registry doesn't know.
pub const UNMAPPED: Rgb = Rgb::new(0x00, 0xFF, 0xFF);
/// Glow color for account-match highlights, combined additively over base.
pub const HIGHLIGHT: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#ABCDEF`, `ABCDEF`, or `0xABCDEF`. Whitespace-tolerant.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let hex = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if hex.len() != 6 {
            return None;
        }
        let v = u32::from_str_radix(hex, 16).ok()?;
        Some(Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8))
    }

    /// Saturating per-channel add, the CPU equivalent of additive blending.
    pub fn saturating_add(self, other: Rgb) -> Rgb {
        Rgb::new(
            self.r.saturating_add(other.r),
            self.g.saturating_add(other.g),
            self.b.saturating_add(other.b),
        )
    }
}

/// Deterministic fallback color via CRC32 hash of the group key.
/// Used when a registry row's color cell doesn't parse.
pub fn group_fallback_color(key: &str) -> Rgb {
    let hash = crc32fast::hash(key.as_bytes());
    let bytes = hash.to_be_bytes();
    Rgb::new(bytes[0], bytes[1], bytes[2])
}

#[cfg(test)]
mod tests {
    use super::{Rgb, group_fallback_color};

    #[test]
    fn parse_hex_accepts_common_prefixes() {
        let expected = Rgb::new(0xAB, 0xCD, 0xEF);
        assert_eq!(Rgb::parse_hex("#ABCDEF"), Some(expected));
        assert_eq!(Rgb::parse_hex("ABCDEF"), Some(expected));
        assert_eq!(Rgb::parse_hex("0xabcdef"), Some(expected));
        assert_eq!(Rgb::parse_hex("  #abcdef "), Some(expected));
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        assert_eq!(Rgb::parse_hex(""), None);
        assert_eq!(Rgb::parse_hex("#ABC"), None);
        assert_eq!(Rgb::parse_hex("#GGGGGG"), None);
        assert_eq!(Rgb::parse_hex("#ABCDEF00"), None);
    }

    #[test]
    fn saturating_add_clamps_channels() {
        let base = Rgb::new(200, 10, 255);
        let glow = Rgb::new(100, 5, 1);
        assert_eq!(base.saturating_add(glow), Rgb::new(255, 15, 255));
    }

    #[test]
    fn fallback_color_is_deterministic() {
        assert_eq!(group_fallback_color("R1"), group_fallback_color("R1"));
        assert_ne!(group_fallback_color("R1"), group_fallback_color("R2"));
    }
}
