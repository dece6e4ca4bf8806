//! Bone naming conventions: side suffixes and base names.
//!
//! Bilateral bones carry a two-character suffix made of a delimiter and a
//! letter, e.g. `foot.L`, `hand_R`, `eye-L`.

/// Delimiters recognized in front of a side letter.
pub const SUFFIX_DELIMITERS: [char; 4] = ['_', '.', '-', ' '];

/// Prefix given to mechanical (non-animatable) bones.
pub const MECHANICAL_PREFIX: &str = "MCH-";

/// Splits a name into `(presuffix, suffix)`; the suffix is empty when absent.
///
/// ```
/// use autorig_meta::naming::split_suffix;
/// assert_eq!(split_suffix("foot.L"), ("foot", ".L"));
/// assert_eq!(split_suffix("hips"), ("hips", ""));
/// ```
pub fn split_suffix(name: &str) -> (&str, &str) {
    let mut chars = name.char_indices().rev();
    let (Some((_, letter)), Some((delim_idx, delim))) = (chars.next(), chars.next()) else {
        return (name, "");
    };
    if SUFFIX_DELIMITERS.contains(&delim) && letter.is_ascii_alphabetic() {
        return (&name[..delim_idx], &name[delim_idx..]);
    }
    (name, "")
}

/// Returns the side letter of a suffixed name, if any.
pub fn suffix_letter(name: &str) -> Option<char> {
    split_suffix(name).1.chars().nth(1)
}

/// Appends `.letter` to a name, or returns it unchanged when there is no letter.
pub fn suffixed(name: &str, letter: Option<char>) -> String {
    match letter {
        Some(letter) => format!("{}.{}", name, letter),
        None => name.to_string(),
    }
}

/// The part of a name before the first `.`.
pub fn basename(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Prefixes a name with [`MECHANICAL_PREFIX`] unless it already carries it.
pub fn mechanical_name(name: &str) -> String {
    if name.starts_with(MECHANICAL_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", MECHANICAL_PREFIX, name)
    }
}

/// Name of segment `segment` of digit `digit`, e.g. `finger2-3.L`.
pub fn digit_segment_name(kind: &str, digit: usize, segment: usize, side: char) -> String {
    format!("{}{}-{}.{}", kind, digit, segment, side)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_suffix() {
        assert_eq!(split_suffix("foot.L"), ("foot", ".L"));
        assert_eq!(split_suffix("hand_R"), ("hand", "_R"));
        assert_eq!(split_suffix("eye-l"), ("eye", "-l"));
        assert_eq!(split_suffix("toe1-1.L"), ("toe1-1", ".L"));
        assert_eq!(split_suffix("toe1-1"), ("toe1-1", ""));
        assert_eq!(split_suffix("x"), ("x", ""));
        assert_eq!(split_suffix(""), ("", ""));
    }

    #[test]
    fn test_suffix_letter() {
        assert_eq!(suffix_letter("ribs.R"), Some('R'));
        assert_eq!(suffix_letter("jaw"), None);
        assert_eq!(suffix_letter("finger1-2"), None);
    }

    #[test]
    fn test_suffixed() {
        assert_eq!(suffixed("loarm", Some('L')), "loarm.L");
        assert_eq!(suffixed("hips", None), "hips");
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("hand-target.L"), "hand-target");
        assert_eq!(basename("root"), "root");
    }

    #[test]
    fn test_mechanical_name() {
        assert_eq!(mechanical_name("finger1-1.L"), "MCH-finger1-1.L");
        assert_eq!(mechanical_name("MCH-legcone.L"), "MCH-legcone.L");
    }

    #[test]
    fn test_digit_segment_name() {
        assert_eq!(digit_segment_name("toe", 1, 2, 'R'), "toe1-2.R");
    }
}
