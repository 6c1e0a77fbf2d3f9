use htmd::options::{CodeBlockStyle, HeadingStyle, LinkStyle, Options};
use htmd::HtmlToMarkdown;

use crate::domain::ports::MarkdownConvert;
use crate::utils::error::{PagemarkError, Result};

/// htmd-backed converter: ATX headings, fenced code blocks, inlined links,
/// script and style elements dropped.
pub struct HtmdConvert {
    converter: HtmlToMarkdown,
}

impl HtmdConvert {
    pub fn new() -> Self {
        let options = Options {
            heading_style: HeadingStyle::Atx,
            code_block_style: CodeBlockStyle::Fenced,
            link_style: LinkStyle::Inlined,
            ..Default::default()
        };
        Self {
            converter: HtmlToMarkdown::builder()
                .options(options)
                .skip_tags(vec!["script", "style"])
                .build(),
        }
    }
}

impl Default for HtmdConvert {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConvert for HtmdConvert {
    fn convert(&self, html: &str) -> Result<String> {
        self.converter
            .convert(html)
            .map_err(|e| PagemarkError::Convert {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_headings_and_paragraphs() {
        let converter = HtmdConvert::new();
        let markdown = converter
            .convert("<article><h1>Title</h1><p>World</p></article>")
            .unwrap();

        assert!(markdown.contains("# Title"));
        assert!(markdown.contains("World"));
    }

    #[test]
    fn test_convert_inlines_links() {
        let converter = HtmdConvert::new();
        let markdown = converter
            .convert("<p><a href=\"https://example.com\">link</a></p>")
            .unwrap();

        assert!(markdown.contains("[link](https://example.com)"));
    }

    #[test]
    fn test_convert_drops_scripts() {
        let converter = HtmdConvert::new();
        let markdown = converter
            .convert("<body><script>alert(1)</script><p>kept</p></body>")
            .unwrap();

        assert!(markdown.contains("kept"));
        assert!(!markdown.contains("alert"));
    }
}
