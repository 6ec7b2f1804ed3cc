//! Markdown rendering for text profile fields.

use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html};

static SANITIZER: LazyLock<ammonia::Builder<'static>> = LazyLock::new(|| {
    let mut cleaner = ammonia::Builder::default();
    cleaner
        .strip_comments(true)
        .link_rel(Some("noopener noreferrer"))
        .rm_tags(&["img"]);
    cleaner
});

/// Renders a profile value to sanitized HTML.
#[must_use]
pub fn render_markdown(value: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut html_output = String::new();
    html::push_html(&mut html_output, Parser::new_ext(value, options));

    SANITIZER.clean(&html_output).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_emphasis() {
        assert_eq!(render_markdown("**hi**"), "<p><strong>hi</strong></p>\n");
    }

    #[test]
    fn test_strips_script() {
        let html = render_markdown("hello <script>alert(1)</script>");
        assert!(!html.contains("script"));
        assert!(html.contains("hello"));
    }

    #[test]
    fn test_links_get_rel() {
        let html = render_markdown("[site](https://example.com)");
        assert!(html.contains("href=\"https://example.com\""));
        assert!(html.contains("rel=\"noopener noreferrer\""));
    }
}
