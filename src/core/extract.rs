use scraper::{Html, Selector};

use crate::domain::model::ExtractedArticle;
use crate::utils::error::{PagemarkError, Result};

/// Pulls the title and primary readable region out of a raw HTML document.
/// The first `<article>` element wins; without one the whole `<body>` is
/// the content. Pure function of its input, no network, no script
/// execution.
pub fn extract(html: &str) -> Result<ExtractedArticle> {
    extract_from_document(&Html::parse_document(html))
}

fn extract_from_document(document: &Html) -> Result<ExtractedArticle> {
    let title_selector = Selector::parse("title").unwrap();
    let article_selector = Selector::parse("article").unwrap();
    let body_selector = Selector::parse("body").unwrap();

    let title = document
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let content_html = match document.select(&article_selector).next() {
        Some(article) => article.html(),
        // Document parsing recovers a body for nearly any input; a tree
        // without one is not HTML.
        None => document
            .select(&body_selector)
            .next()
            .map(|body| body.html())
            .ok_or_else(|| PagemarkError::Parse {
                message: "document has no body element".to_string(),
            })?,
    };

    Ok(ExtractedArticle {
        title,
        content_html,
    })
}
