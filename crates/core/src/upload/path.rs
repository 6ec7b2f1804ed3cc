//! Path ids: the storage locators of uploaded files.

use parley_shared::types::RealmId;
use rand::Rng;
use rand::distr::Alphanumeric;

const RANDOM_SEGMENT_LENGTH: usize = 24;

const FALLBACK_NAME: &str = "uploaded-file";

/// Reduces a client file name to `[A-Za-z0-9_.-]`.
///
/// Whitespace and hyphen runs collapse to a single `-`; other characters are
/// dropped. Names left empty, or consisting only of dots, become
/// `uploaded-file`.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let mut out = String::with_capacity(base.len());
    let mut pending_hyphen = false;

    for c in base.chars() {
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
            continue;
        }
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        }
    }

    if out.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_string()
    } else {
        out
    }
}

/// New path id `{realm_id}/{random}/{sanitized name}`.
#[must_use]
pub fn generate_path_id(realm_id: RealmId, file_name: &str) -> String {
    let random: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(RANDOM_SEGMENT_LENGTH)
        .map(char::from)
        .collect();
    format!("{realm_id}/{random}/{}", sanitize_name(file_name))
}

/// Whether a path id stays inside the upload tree.
#[must_use]
pub fn is_safe_path_id(path_id: &str) -> bool {
    !path_id.is_empty()
        && !path_id.contains(['\\', '\0'])
        && path_id
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// The file name part of a path id.
#[must_use]
pub fn file_name(path_id: &str) -> &str {
    path_id.rsplit('/').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("report.pdf", "report.pdf")]
    #[case("my  holiday -- photo.jpg", "my-holiday-photo.jpg")]
    #[case("café.pdf", "caf.pdf")]
    #[case("../../etc/passwd", "passwd")]
    #[case("C:\\Users\\me\\notes.txt", "notes.txt")]
    #[case("???", "uploaded-file")]
    #[case("..", "uploaded-file")]
    #[case("", "uploaded-file")]
    #[case(" leading.txt", "leading.txt")]
    fn test_sanitize_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_name(input), expected);
    }

    #[test]
    fn test_generate_path_id_shape() {
        let realm = RealmId::new();
        let path_id = generate_path_id(realm, "Quarterly report.pdf");
        let segments: Vec<_> = path_id.split('/').collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], realm.to_string());
        assert_eq!(segments[1].len(), RANDOM_SEGMENT_LENGTH);
        assert!(segments[1].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(segments[2], "Quarterly-report.pdf");
        assert!(is_safe_path_id(&path_id));
        assert_ne!(path_id, generate_path_id(realm, "Quarterly report.pdf"));
    }

    #[rstest]
    #[case("5/abc/doc.pdf", true)]
    #[case("5/../../etc/passwd", false)]
    #[case("/etc/passwd", false)]
    #[case("5/./doc.pdf", false)]
    #[case("5//doc.pdf", false)]
    #[case("5/abc\\doc.pdf", false)]
    #[case("", false)]
    fn test_is_safe_path_id(#[case] path_id: &str, #[case] safe: bool) {
        assert_eq!(is_safe_path_id(path_id), safe);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("5/abc/doc.pdf"), "doc.pdf");
        assert_eq!(file_name("doc.pdf"), "doc.pdf");
    }
}
