//! Dotted field paths.
//!
//! Paths join object keys with `.`. Keys that themselves contain `.` or `\`
//! are escaped with a backslash, so encoding and decoding are inverse.
//! Every path names at least one segment: `""` is the single empty key, and
//! the root of a mapping has no dotted path at all.

/// Join path segments into a dotted path.
pub fn encode_path<S: AsRef<str>>(segments: &[S]) -> String {
    let mut path = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            path.push('.');
        }
        for c in segment.as_ref().chars() {
            if c == '.' || c == '\\' {
                path.push('\\');
            }
            path.push(c);
        }
    }
    path
}

/// Split a dotted path into its segments.
pub fn decode_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '.' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths() {
        assert_eq!(encode_path(&["a", "b", "c"]), "a.b.c");
        assert_eq!(decode_path("a.b.c"), vec!["a", "b", "c"]);
        assert_eq!(decode_path(""), vec![""]);
    }

    #[test]
    fn test_empty_segments_round_trip() {
        for segments in [vec![""], vec!["", "a"], vec!["a", ""], vec!["", ""]] {
            let encoded = encode_path(&segments);
            assert_eq!(decode_path(&encoded), segments, "path {encoded:?}");
        }
        assert_eq!(encode_path(&["", "a"]), ".a");
    }

    #[test]
    fn test_escaped_segments_round_trip() {
        let segments = vec!["host.name".to_string(), "c:\\dir".to_string(), "x".to_string()];
        let encoded = encode_path(&segments);
        assert_eq!(encoded, "host\\.name.c:\\\\dir.x");
        assert_eq!(decode_path(&encoded), segments);
    }
}
