use std::sync::Arc;

use url::Url;

use crate::core::convert::HtmdConvert;
use crate::core::extract;
use crate::core::fetch::ContentFetcher;
use crate::core::proxy::ReverseProxy;
use crate::core::registry::PortRegistry;
use crate::domain::model::{RemoteDocument, RetrievalResult};
use crate::domain::ports::MarkdownConvert;
use crate::utils::error::Result;

/// Drives one retrieval: fetch, extract, convert. The two public entry
/// points never fail — internal errors are logged and degraded to an empty
/// result at this boundary, so a caller writing a note is never blocked by
/// a page that would not come down.
pub struct Retriever<C: MarkdownConvert = HtmdConvert> {
    fetcher: ContentFetcher,
    converter: C,
    proxy: ReverseProxy,
}

impl Retriever<HtmdConvert> {
    pub fn new(registry: Arc<PortRegistry>) -> Result<Self> {
        Ok(Self::with_converter(
            ContentFetcher::new()?,
            HtmdConvert::new(),
            ReverseProxy::new(registry),
        ))
    }
}

impl<C: MarkdownConvert> Retriever<C> {
    pub fn with_converter(fetcher: ContentFetcher, converter: C, proxy: ReverseProxy) -> Self {
        Self {
            fetcher,
            converter,
            proxy,
        }
    }

    /// Direct strategy: fetch the page with browser-like headers.
    pub async fn download_as_markdown(&self, url: &str) -> RetrievalResult {
        degrade(self.try_download_direct(url).await, url)
    }

    /// Proxied strategy: spin up a reverse proxy for the URL's origin and
    /// fetch through it. The proxy is closed and its port released before
    /// this returns, on success and on every error path.
    pub async fn download_as_markdown_using_proxy(&mut self, url: &str) -> RetrievalResult {
        let outcome = self.try_download_proxied(url).await;
        degrade(outcome, url)
    }

    async fn try_download_direct(&self, url: &str) -> Result<RetrievalResult> {
        let url = Url::parse(url)?;
        let raw_html = self.fetcher.fetch_direct(&url).await?;
        self.reduce(RemoteDocument {
            source_url: url,
            raw_html,
        })
    }

    async fn try_download_proxied(&mut self, url: &str) -> Result<RetrievalResult> {
        let url = Url::parse(url)?;
        let origin = origin_of(&url)?;

        let port = self.proxy.open(&origin).await?;
        let outcome = self.fetcher.fetch_proxied(port, &url).await;
        // Close before looking at the outcome so the port is released even
        // when the fetch failed.
        self.proxy.close().await;

        self.reduce(RemoteDocument {
            source_url: url,
            raw_html: outcome?,
        })
    }

    fn reduce(&self, document: RemoteDocument) -> Result<RetrievalResult> {
        let article = extract::extract(&document.raw_html)?;
        let markdown = self.converter.convert(&article.content_html)?;
        Ok(RetrievalResult {
            title: article.title,
            markdown,
        })
    }
}

fn degrade(outcome: Result<RetrievalResult>, url: &str) -> RetrievalResult {
    match outcome {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("retrieval of {} failed: {}", url, e);
            RetrievalResult::default()
        }
    }
}

/// scheme + host + port of `url`, as a URL of its own.
fn origin_of(url: &Url) -> Result<Url> {
    Ok(Url::parse(&url.origin().ascii_serialization())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::PagemarkError;
    use httpmock::prelude::*;

    struct FailingConvert;

    impl MarkdownConvert for FailingConvert {
        fn convert(&self, _html: &str) -> Result<String> {
            Err(PagemarkError::Convert {
                message: "refused".to_string(),
            })
        }
    }

    fn retriever_with<C: MarkdownConvert>(converter: C, base_port: u16) -> Retriever<C> {
        let registry = Arc::new(PortRegistry::new());
        Retriever::with_converter(
            ContentFetcher::new().unwrap(),
            converter,
            ReverseProxy::with_base_port(registry, base_port),
        )
    }

    #[tokio::test]
    async fn test_invalid_url_degrades_to_empty_result() {
        let registry = Arc::new(PortRegistry::new());
        let retriever = Retriever::new(registry).unwrap();

        let result = retriever.download_as_markdown("not a url").await;
        assert_eq!(result, RetrievalResult::default());
    }

    #[tokio::test]
    async fn test_conversion_failure_degrades_to_empty_result() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/page");
            then.status(200)
                .body("<html><head><title>T</title></head><body>x</body></html>");
        });

        let retriever = retriever_with(FailingConvert, 57410);
        let result = retriever.download_as_markdown(&server.url("/page")).await;

        assert_eq!(result, RetrievalResult::default());
    }

    #[tokio::test]
    async fn test_origin_of_keeps_scheme_host_port() {
        let url = Url::parse("https://example.com:8443/a/b?q=1").unwrap();
        assert_eq!(
            origin_of(&url).unwrap().as_str(),
            "https://example.com:8443/"
        );
    }
}
