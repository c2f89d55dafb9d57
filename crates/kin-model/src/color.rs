//! Deterministic family colours
//!
//! A family id always maps to the same palette entry, across runs and across
//! the stored trees that were coloured before.

/// Palette used for family nodes and edges
pub const FAMILY_COLORS: [&str; 19] = [
    "#E57373", "#81C784", "#64B5F6", "#FFB74D", "#BA68C8", "#4DB6AC", "#F06292", "#90A4AE",
    "#A1887F", "#FF8A65", "#9575CD", "#4FC3F7", "#AED581", "#FFCC02", "#26A69A", "#EF5350",
    "#66BB6A", "#42A5F5", "#FF7043",
];

/// Colour for a family id
///
/// The hash runs over UTF-16 code units as `h = c + ((h << 5) - h)`, where the
/// shift truncates `h` to 32 bits but the sum does not. Stored colours depend
/// on that exact arithmetic, so it is kept bit-for-bit.
#[must_use]
pub fn family_color(family_id: &str) -> &'static str {
    let hash = family_id.encode_utf16().fold(0_i64, |h, c| {
        #[allow(clippy::cast_possible_truncation)]
        let shifted = i64::from((h as i32).wrapping_shl(5));
        i64::from(c) + (shifted - h)
    });
    #[allow(clippy::cast_possible_truncation)]
    let index = (hash.unsigned_abs() % FAMILY_COLORS.len() as u64) as usize;
    FAMILY_COLORS[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids_map_to_fixed_colors() {
        assert_eq!(family_color("family_I1_I2"), "#26A69A");
        assert_eq!(family_color("family_I1"), "#FFCC02");
        assert_eq!(family_color("a"), "#64B5F6");
    }

    #[test]
    fn empty_id_takes_first_color() {
        assert_eq!(family_color(""), FAMILY_COLORS[0]);
    }

    #[test]
    fn color_is_stable() {
        let id = "family_I17_I42";
        assert_eq!(family_color(id), family_color(id));
        assert!(FAMILY_COLORS.contains(&family_color(id)));
    }
}
