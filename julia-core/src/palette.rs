use std::fs;
use std::path::Path;

use crate::format::Color;

/// Bytes per entry in a raw palette table: one little-endian u32 per
/// color, packed 0x00RRGGBB.
pub const RAW_ENTRY_SIZE: usize = 4;

/// The default table: grayscale fading through red, yellow, green, cyan
/// and blue bands, ending in black for points that never escape.
const BANDS: [u32; 51] = [
    0xFFFFFF, 0xEEEEEE, 0xDDDDDD, 0xCCCCCC, 0xBBBBBB, 0xAAAAAA,
    0x999999, 0x888888, 0x777777, 0x666666, 0x555555, 0x444444,
    0x333333, 0x222222, 0x111111, 0x220000, 0x550000, 0x880000,
    0xAA0000, 0xDD0000, 0xFF0000, 0x222200, 0x555500, 0x888800,
    0xAAAA00, 0xDDDD00, 0xFFFF00, 0x002200, 0x005500, 0x008800,
    0x00AA00, 0x00DD00, 0x00FF00, 0x002222, 0x005555, 0x008888,
    0x00AAAA, 0x00DDDD, 0x00FFFF, 0x000022, 0x000055, 0x000088,
    0x0000AA, 0x0000DD, 0x0000FF, 0x444444, 0x444444, 0x222222,
    0x222222, 0x000000, 0x000000,
];

/// Ordered color table indexed by escape count. Slot n colors points
/// that escaped at iteration n; the final slot colors points that never
/// escaped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// A built-in palette sized to `slots` entries (max iterations + 1).
    ///
    ///   0: grayscale-to-color bands (the default)
    ///   1: grayscale
    ///   2: fire
    ///   3: ocean
    ///
    /// Unknown ids are an error; callers that want a fallback use
    /// [`Palette::default_bands`].
    pub fn builtin(id: usize, slots: usize) -> anyhow::Result<Palette> {
        if slots < 2 {
            anyhow::bail!("palette needs at least 2 slots, got {slots}");
        }
        let colors = match id {
            0 => banded(slots),
            1 => faded(&[(255, 255, 255), (16, 16, 16)], slots),
            2 => faded(&[(0, 0, 0), (255, 0, 0), (255, 255, 0), (255, 255, 255)], slots),
            3 => faded(&[(0, 0, 0), (0, 0, 255), (0, 255, 255), (255, 255, 255)], slots),
            _ => anyhow::bail!("unknown palette id {id} (have 0-3)"),
        };
        Ok(Palette { colors })
    }

    /// The default band table sized to `slots`.
    pub fn default_bands(slots: usize) -> Palette {
        Palette {
            colors: banded(slots.max(2)),
        }
    }

    /// Parse a raw table: `slots` little-endian u32 entries. Extra bytes
    /// are ignored; too few are an error.
    pub fn from_raw_bytes(bytes: &[u8], slots: usize) -> anyhow::Result<Palette> {
        if slots < 2 {
            anyhow::bail!("palette needs at least 2 slots, got {slots}");
        }
        let need = slots * RAW_ENTRY_SIZE;
        if bytes.len() < need {
            anyhow::bail!("palette table too short: {} bytes, need {need}", bytes.len());
        }
        let colors = bytes[..need]
            .chunks_exact(RAW_ENTRY_SIZE)
            .map(|c| Color::from_rgb_u32(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect();
        Ok(Palette { colors })
    }

    /// Load a raw table from disk, falling back to the default bands if
    /// the file is missing, unreadable or too short. The fallback is
    /// logged, never fatal.
    pub fn from_file_or_default(path: &Path, slots: usize) -> Palette {
        let loaded = fs::read(path)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| Self::from_raw_bytes(&bytes, slots));
        match loaded {
            Ok(palette) => palette,
            Err(err) => {
                log::warn!(
                    "palette table {}: {err}; using the default bands",
                    path.display()
                );
                Self::default_bands(slots)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color for an escape count. Counts past the end of the table take
    /// the final (in-set) slot.
    pub fn color(&self, count: u32) -> Color {
        self.colors[(count as usize).min(self.colors.len() - 1)]
    }

    /// The color of points that never escape.
    pub fn in_set_color(&self) -> Color {
        self.color(u32::MAX)
    }
}

/// The band table sized to `slots`: truncated or padded with its final
/// (in-set) color so lookups can never run off the end.
fn banded(slots: usize) -> Vec<Color> {
    let in_set = Color::from_rgb_u32(BANDS[BANDS.len() - 1]);
    let mut colors: Vec<Color> = BANDS
        .iter()
        .take((slots - 1).min(BANDS.len() - 1))
        .map(|&rgb| Color::from_rgb_u32(rgb))
        .collect();
    colors.resize(slots - 1, in_set);
    colors.push(in_set);
    colors
}

/// Linear fade through `stops`, sampled into `slots - 1` escape colors,
/// with a black in-set slot at the end.
fn faded(stops: &[(u8, u8, u8)], slots: usize) -> Vec<Color> {
    let n = slots - 1;
    let segments = stops.len() - 1;
    let mut colors = Vec::with_capacity(slots);
    for i in 0..n {
        let t = if n > 1 {
            i as f32 / (n - 1) as f32
        } else {
            0.0
        };
        let pos = t * segments as f32;
        let seg = (pos as usize).min(segments - 1);
        let frac = pos - seg as f32;
        let (r0, g0, b0) = stops[seg];
        let (r1, g1, b1) = stops[seg + 1];
        colors.push(Color {
            r: (r0 as f32 + frac * (r1 as f32 - r0 as f32)) as u8,
            g: (g0 as f32 + frac * (g1 as f32 - g0 as f32)) as u8,
            b: (b0 as f32 + frac * (b1 as f32 - b0 as f32)) as u8,
        });
    }
    colors.push(Color::BLACK);
    colors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bands_cover_fifty_iterations() {
        let palette = Palette::default_bands(51);
        assert_eq!(palette.len(), 51);
        assert_eq!(palette.color(0), Color { r: 0xFF, g: 0xFF, b: 0xFF });
        assert_eq!(palette.color(49), Color::BLACK);
        assert_eq!(palette.color(50), Color::BLACK);
        assert_eq!(palette.in_set_color(), Color::BLACK);
    }

    #[test]
    fn bands_pad_and_truncate_to_the_slot_count() {
        let short = Palette::default_bands(10);
        assert_eq!(short.len(), 10);
        assert_eq!(short.color(0), Color { r: 0xFF, g: 0xFF, b: 0xFF });
        assert_eq!(short.in_set_color(), Color::BLACK);

        let long = Palette::default_bands(80);
        assert_eq!(long.len(), 80);
        // slots past the reference table pad with the in-set color
        assert_eq!(long.color(60), Color::BLACK);
    }

    #[test]
    fn every_builtin_has_the_requested_slots() {
        for id in 0..4 {
            let palette = Palette::builtin(id, 51).unwrap();
            assert_eq!(palette.len(), 51);
            assert_eq!(palette.in_set_color(), Color::BLACK);
        }
        assert!(Palette::builtin(99, 51).is_err());
    }

    #[test]
    fn raw_table_parses_little_endian_rgb() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x00112233u32.to_le_bytes());
        bytes.extend_from_slice(&0x00FF0000u32.to_le_bytes());
        let palette = Palette::from_raw_bytes(&bytes, 2).unwrap();
        assert_eq!(palette.color(0), Color { r: 0x11, g: 0x22, b: 0x33 });
        assert_eq!(palette.color(1), Color { r: 0xFF, g: 0x00, b: 0x00 });
    }

    #[test]
    fn short_raw_table_is_rejected() {
        let bytes = vec![0u8; 3 * RAW_ENTRY_SIZE];
        assert!(Palette::from_raw_bytes(&bytes, 4).is_err());
    }

    #[test]
    fn missing_table_file_falls_back_to_bands() {
        let palette =
            Palette::from_file_or_default(Path::new("/no/such/palette.map"), 51);
        assert_eq!(palette, Palette::default_bands(51));
    }
}
