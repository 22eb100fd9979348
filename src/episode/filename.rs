//! Filesystem-legal episode file names.
//!
//! The platform convention puts the host before the title, so the
//! composed stem is always `"{host} - {title}"`.

/// Maximum length of a generated file name, in characters
pub const MAX_FILENAME_LENGTH: usize = 200;

/// Characters that are illegal in file names on Windows and macOS
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Compose and sanitize an episode file-name stem.
///
/// Concatenates as `"{host} - {title}"`, removes every illegal character,
/// collapses whitespace runs to single spaces, trims, and truncates to at
/// most `MAX_FILENAME_LENGTH` characters (counted as characters, not
/// bytes, so multi-byte characters are never split). Pure and idempotent.
pub fn sanitize(host: &str, title: &str) -> String {
    sanitize_name(&format!("{host} - {title}"))
}

/// Compose a complete file name with the given extension.
///
/// The stem is truncated so `"{stem}.{extension}"` stays within
/// `MAX_FILENAME_LENGTH` characters; the extension is always preserved
/// intact.
pub fn file_name(host: &str, title: &str, extension: &str) -> String {
    let budget = MAX_FILENAME_LENGTH.saturating_sub(extension.chars().count() + 1);
    let stem = truncate_chars(&sanitize(host, title), budget);
    format!("{}.{}", stem.trim_end(), extension)
}

fn sanitize_name(raw: &str) -> String {
    let legal: String = raw.chars().filter(|c| !ILLEGAL_CHARS.contains(c)).collect();
    let collapsed = collapse_whitespace(&legal);
    truncate_chars(collapsed.trim(), MAX_FILENAME_LENGTH)
}

/// Collapse every run of whitespace (including tabs and newlines) into a
/// single space
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut last_was_space = false;

    for c in s.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(c);
            last_was_space = false;
        }
    }

    result
}

/// Truncate to at most `max_chars` characters without splitting a scalar
fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_host_before_title() {
        assert_eq!(sanitize("Jane Doe", "My Show"), "Jane Doe - My Show");
    }

    #[test]
    fn removes_every_illegal_character() {
        let result = sanitize("A<B>C:D", "E\"F/G\\H|I?J*K");
        for c in ILLEGAL_CHARS {
            assert!(!result.contains(*c), "found illegal char {c:?} in {result:?}");
        }
        assert_eq!(result, "ABCD - EFGHIJK");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(
            sanitize("Jane   Doe", "My\t\tShow\nNotes"),
            "Jane Doe - My Show Notes"
        );
    }

    #[test]
    fn trims_leading_and_trailing_whitespace() {
        assert_eq!(sanitize("  Jane Doe", "My Show  "), "Jane Doe - My Show");
    }

    #[test]
    fn is_idempotent() {
        let once = sanitize("J<a>ne: Doe", "My/Show|Ep\"1?");
        let twice = sanitize_name(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn truncates_to_exactly_200_chars() {
        let long_title = "标".repeat(300);
        let result = sanitize("Host", &long_title);

        assert_eq!(result.chars().count(), MAX_FILENAME_LENGTH);
    }

    #[test]
    fn truncated_result_is_a_prefix_of_the_unbounded_composition() {
        let long_title = "a".repeat(300);
        let unbounded = format!("Host - {long_title}");
        let result = sanitize("Host", &long_title);

        assert_eq!(result.chars().count(), MAX_FILENAME_LENGTH);
        assert!(unbounded.starts_with(&result));
    }

    #[test]
    fn preserves_unicode_characters() {
        assert_eq!(sanitize("主播名", "节目名"), "主播名 - 节目名");
    }

    #[test]
    fn file_name_appends_extension() {
        assert_eq!(
            file_name("Jane Doe", "My Show", "mp3"),
            "Jane Doe - My Show.mp3"
        );
    }

    #[test]
    fn file_name_preserves_extension_under_truncation() {
        let long_title = "a".repeat(300);
        let result = file_name("Host", &long_title, "mp3");

        assert!(result.ends_with(".mp3"));
        assert!(result.chars().count() <= MAX_FILENAME_LENGTH);
    }

    #[test]
    fn file_name_never_ends_stem_with_space_before_extension() {
        // "Host - " plus 188 fill chars puts the truncation point on the space
        let title = format!("{} {}", "a".repeat(188), "b".repeat(20));
        let result = file_name("Host", &title, "mp3");

        assert!(!result.contains(" .mp3"), "got {result:?}");
    }

    #[test]
    fn empty_inputs_still_produce_the_separator() {
        assert_eq!(sanitize("", ""), "-");
    }
}
