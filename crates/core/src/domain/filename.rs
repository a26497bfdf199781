// Destination file name sanitization

/// Linux NAME_MAX
const NAME_MAX: usize = 255;

/// Reduce a sender-supplied file name to something safe to join onto the
/// download directory.
///
/// Only the last path component survives, separators/control characters
/// become `_`, leading/trailing dots and spaces are trimmed and the result
/// is capped at 255 bytes. Returns `None` when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let last = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = last
        .chars()
        .map(|c| if c == '\0' || c.is_control() { '_' } else { c })
        .collect();

    let trimmed = cleaned.trim_matches(|c: char| c == ' ' || c == '.');
    if trimmed.is_empty() {
        return None;
    }

    let mut take = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    Some(trimmed[..take].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_untouched() {
        assert_eq!(sanitize_file_name("movie.mkv").as_deref(), Some("movie.mkv"));
        assert_eq!(
            sanitize_file_name("My Holiday 2023.mp4").as_deref(),
            Some("My Holiday 2023.mp4")
        );
    }

    #[test]
    fn test_path_components_stripped() {
        assert_eq!(
            sanitize_file_name("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_file_name("C:\\Users\\x\\file.txt").as_deref(),
            Some("file.txt")
        );
    }

    #[test]
    fn test_control_chars_replaced() {
        assert_eq!(sanitize_file_name("a\nb\0c").as_deref(), Some("a_b_c"));
    }

    #[test]
    fn test_nothing_left() {
        assert_eq!(sanitize_file_name(""), None);
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("dir/"), None);
        assert_eq!(sanitize_file_name(" . "), None);
    }

    #[test]
    fn test_length_capped_on_char_boundary() {
        let long = "é".repeat(200);
        let out = sanitize_file_name(&long).unwrap();
        assert!(out.len() <= NAME_MAX);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
