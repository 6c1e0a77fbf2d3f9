use std::time::Duration;

use reqwest::header;
use reqwest::Client;
use url::Url;

use crate::utils::error::Result;

/// Desktop browser signature for direct fetches. Sites vary their markup by
/// user agent, so this exact string matters for retrieval success rates.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/105.0.0.0 Safari/537.36 Edg/105.0.1343.50";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,\
     image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9";

/// Performs the HTTP GET for a retrieval, either directly against the
/// target URL or against a local reverse proxy. Errors are the caller's to
/// handle; nothing is swallowed here.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
    user_agent: String,
}

impl ContentFetcher {
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// `timeout` bounds the whole request when set; the default keeps the
    /// client's no-timeout behavior. `user_agent` overrides the desktop
    /// browser signature.
    pub fn with_options(timeout: Option<Duration>, user_agent: Option<String>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            user_agent: user_agent.unwrap_or_else(|| DESKTOP_USER_AGENT.to_string()),
        })
    }

    /// Direct strategy: GET the page with browser-like headers. The cookie
    /// header is sent empty so no locally stored cookie ever leaks.
    pub async fn fetch_direct(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .header(header::USER_AGENT, &self.user_agent)
            .header(header::ACCEPT, ACCEPT_HTML)
            .header(header::COOKIE, "")
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }

    /// Proxied strategy: GET the target's path and query through the local
    /// reverse proxy bound on `port`. The proxy performs the real
    /// cross-origin request.
    pub async fn fetch_proxied(&self, port: u16, url: &Url) -> Result<String> {
        let query = url
            .query()
            .map(|q| format!("?{}", q))
            .unwrap_or_default();
        let local_url = format!("http://localhost:{}{}{}", port, url.path(), query);

        let response = self
            .client
            .get(&local_url)
            .header(header::CONTENT_TYPE, "text/html")
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}
