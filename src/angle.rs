//! Pure angle arithmetic: normalization, octant and quadrant
//! classification, and the heading-to-semitone mapping used by both
//! guidance modes. Everything here is stateless.

/// A compass bearing or angular difference, in degrees.
pub type Degrees = f32;

/// Number of semitone buckets on each side of a quadrant's midpoint.
pub const HALF_RANGE: i32 = 12;

/// The eight named 45-degree compass sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    #[allow(missing_docs)]
    North,
    #[allow(missing_docs)]
    NorthEast,
    #[allow(missing_docs)]
    East,
    #[allow(missing_docs)]
    SouthEast,
    #[allow(missing_docs)]
    South,
    #[allow(missing_docs)]
    SouthWest,
    #[allow(missing_docs)]
    West,
    #[allow(missing_docs)]
    NorthWest,
}

const REGIONS: [Region; 8] = [
    Region::North,
    Region::NorthEast,
    Region::East,
    Region::SouthEast,
    Region::South,
    Region::SouthWest,
    Region::West,
    Region::NorthWest,
];

impl Region {
    /// The region containing `heading`, which must already be normalized
    /// into [0, 360).
    pub fn from_heading(heading: Degrees) -> Self {
        REGIONS[region_index(heading)]
    }

    /// The spoken name of the region.
    pub fn name(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::NorthEast => "NorthEast",
            Region::East => "East",
            Region::SouthEast => "SouthEast",
            Region::South => "South",
            Region::SouthWest => "SouthWest",
            Region::West => "West",
            Region::NorthWest => "NorthWest",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Reduces any angle into [0, 360).
pub fn normalize_360(angle: Degrees) -> Degrees {
    ((angle % 360.0) + 360.0) % 360.0
}

/// Reduces an angular difference into (-180, 180]. Exactly -180 maps to
/// +180, so the two halves of the circle never produce the same output.
pub fn normalize_signed_180(mut angle: Degrees) -> Degrees {
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Index of the 45-degree octant containing `heading`, with North
/// centered on 0. The `% 8` wraps headings just under 360 back to North.
pub fn region_index(heading: Degrees) -> usize {
    (((heading + 22.5) / 45.0).floor() as usize) % 8
}

/// Index of the 90-degree quadrant containing `heading`, 0..=3 for
/// headings in [0, 360).
pub fn quadrant_index(heading: Degrees) -> usize {
    (heading / 90.0).floor() as usize
}

/// Maps a bucket in [0, 2 * half_range) to a signed semitone offset.
/// Buckets at or above the midpoint skip the value 0, so the offsets on
/// the ascending side start at +1. This keeps the harmonic audibly apart
/// from the drone right at the quadrant midpoint.
pub fn note_for_bucket(bucket: usize, half_range: i32) -> i32 {
    let mut note = bucket as i32 - half_range;
    if note >= 0 {
        note += 1;
    }
    note
}

/// Frequency `offset` equal-tempered semitones away from `base`. The
/// offset may be fractional, which the locked-mode pitch bend relies on.
pub fn frequency_for_semitone_offset(base: f32, offset: f32) -> f32 {
    base * 2.0_f32.powf(offset / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_360_is_idempotent_and_in_range() {
        for x in [-725.0, -360.0, -0.1, 0.0, 45.0, 359.9, 360.0, 1234.5] {
            let n = normalize_360(x);
            assert!((0.0..360.0).contains(&n), "{} -> {}", x, n);
            assert_eq!(normalize_360(n), n);
        }
    }

    #[test]
    fn normalize_signed_180_range_and_boundaries() {
        for x in [-540.0, -180.0, -90.0, 0.0, 90.0, 180.0, 270.0, 540.0] {
            let n = normalize_signed_180(x);
            assert!(n > -180.0 && n <= 180.0, "{} -> {}", x, n);
        }
        assert_eq!(normalize_signed_180(180.0), 180.0);
        assert_eq!(normalize_signed_180(-180.0), 180.0);
        assert_eq!(normalize_signed_180(270.0), -90.0);
    }

    #[test]
    fn signed_difference_is_minimal_angular_distance() {
        let pairs = [(350.0, 10.0), (10.0, 350.0), (90.0, 270.0), (0.0, 0.0)];
        let expected = [20.0, 20.0, 180.0, 0.0];
        for ((a, b), want) in pairs.iter().zip(expected) {
            assert_eq!(normalize_signed_180(a - b).abs(), want);
        }
    }

    #[test]
    fn region_wraps_at_north() {
        assert_eq!(region_index(0.0), 0);
        assert_eq!(region_index(359.9), 0);
        assert_eq!(region_index(337.5), 7);
        assert_eq!(Region::from_heading(359.9), Region::North);
        assert_eq!(Region::from_heading(90.0), Region::East);
        assert_eq!(Region::from_heading(225.0), Region::SouthWest);
    }

    #[test]
    fn quadrants_partition_the_circle() {
        assert_eq!(quadrant_index(0.0), 0);
        assert_eq!(quadrant_index(89.9), 0);
        assert_eq!(quadrant_index(90.0), 1);
        assert_eq!(quadrant_index(359.9), 3);
    }

    #[test]
    fn note_for_bucket_skips_zero() {
        let notes: Vec<i32> = (0..24).map(|b| note_for_bucket(b, HALF_RANGE)).collect();
        assert!(!notes.contains(&0));
        assert_eq!(notes[0], -12);
        assert_eq!(notes[11], -1);
        assert_eq!(notes[12], 1);
        assert_eq!(notes[23], 12);
    }

    #[test]
    fn semitone_offsets_produce_the_tempered_scale() {
        assert_eq!(frequency_for_semitone_offset(440.0, 0.0), 440.0);
        assert!((frequency_for_semitone_offset(440.0, 12.0) - 880.0).abs() < 0.01);
        assert!((frequency_for_semitone_offset(440.0, -12.0) - 220.0).abs() < 0.01);
        // A fractional offset lands between the neighboring semitones.
        let bent = frequency_for_semitone_offset(440.0, 0.5);
        assert!(bent > 440.0 && bent < frequency_for_semitone_offset(440.0, 1.0));
    }
}
