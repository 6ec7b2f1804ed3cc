//! `Content-Disposition` reconstruction (RFC 6266, RFC 8187).

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left untouched when percent-encoding paths and file names.
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Prefix of the reverse proxy's internal upload location.
pub const INTERNAL_UPLOADS_PREFIX: &str = "/internal/uploads/";

/// Percent-encodes everything except unreserved characters and `/`.
#[must_use]
pub fn quote(s: &str) -> String {
    utf8_percent_encode(s, PATH_SAFE).to_string()
}

/// Builds a `Content-Disposition` value for the last path segment of `url`.
///
/// Pure ASCII names use `filename="..."` with `\` and `"` escaped; any other
/// name is sent as `filename*=utf-8''<percent-encoded>`.
#[must_use]
pub fn content_disposition(url: &str, is_attachment: bool) -> String {
    let disposition = if is_attachment { "attachment" } else { "inline" };
    let filename = basename(url);

    let file_expr = if filename.is_ascii() {
        format!(
            "filename=\"{}\"",
            filename.replace('\\', "\\\\").replace('"', "\\\"")
        )
    } else {
        format!("filename*=utf-8''{}", quote(filename))
    };

    format!("{disposition}; {file_expr}")
}

/// `X-Accel-Redirect` target for a stored file.
#[must_use]
pub fn internal_redirect_path(path_id: &str) -> String {
    quote(&format!("{INTERNAL_UPLOADS_PREFIX}{path_id}"))
}

fn basename(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/srv/uploads/files/2/ab/report.pdf", false, "inline; filename=\"report.pdf\"")]
    #[case("/srv/uploads/files/2/ab/report.pdf", true, "attachment; filename=\"report.pdf\"")]
    #[case("café.pdf", true, "attachment; filename*=utf-8''caf%C3%A9.pdf")]
    #[case("a\"b.txt", false, "inline; filename=\"a\\\"b.txt\"")]
    #[case("a\\b.txt", false, "inline; filename=\"a\\\\b.txt\"")]
    #[case("https://cdn.example.com/x/y/photo.png?sig=abc#frag", false, "inline; filename=\"photo.png\"")]
    #[case("日本 語.txt", true, "attachment; filename*=utf-8''%E6%97%A5%E6%9C%AC%20%E8%AA%9E.txt")]
    fn test_content_disposition(
        #[case] url: &str,
        #[case] is_attachment: bool,
        #[case] expected: &str,
    ) {
        assert_eq!(content_disposition(url, is_attachment), expected);
    }

    #[test]
    fn test_internal_redirect_path_is_quoted() {
        assert_eq!(
            internal_redirect_path("5/abc/my file~v1.pdf"),
            "/internal/uploads/5/abc/my%20file~v1.pdf"
        );
        assert_eq!(
            internal_redirect_path("5/abc/ñ.txt"),
            "/internal/uploads/5/abc/%C3%B1.txt"
        );
    }
}
