use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use sn_core::{Error, Result};
use tracing::{debug, warn};
use url::Url;

use super::utils::{parse_timestamp, resolve_link};
use super::{HeadlineCandidate, HeadlineFetcher, ListingPage};

lazy_static! {
    static ref CONTAINER: Selector = Selector::parse(".headlineSec").unwrap();
    static ref TITLE: Selector = Selector::parse(".headline").unwrap();
    static ref ANCHOR: Selector = Selector::parse("a").unwrap();
    static ref UPDATED_TIME: Selector = Selector::parse("span[data-updatedtime]").unwrap();
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: LivemintFetcher::BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
            user_agent: concat!("sn/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Fetches the livemint "companies" listing, newest first.
#[derive(Debug, Clone)]
pub struct LivemintFetcher {
    client: reqwest::Client,
    base: Url,
}

impl LivemintFetcher {
    pub const BASE_URL: &'static str = "https://www.livemint.com";

    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;
        let base = Url::parse(&config.base_url)?;
        Ok(Self { client, base })
    }

    /// Page 1 is the bare listing, later pages are `/companies/page-N`.
    pub fn page_url(&self, page: u32) -> Result<Url> {
        let root = self.base.as_str().trim_end_matches('/');
        let url = if page <= 1 {
            format!("{}/companies", root)
        } else {
            format!("{}/companies/page-{}", root, page)
        };
        Ok(Url::parse(&url)?)
    }
}

#[async_trait]
impl HeadlineFetcher for LivemintFetcher {
    fn source(&self) -> &str {
        "livemint"
    }

    async fn fetch_page(&self, page: u32) -> Result<ListingPage> {
        let url = self.page_url(page)?;
        debug!(%url, page, "Fetching listing page");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        Ok(parse_listing(&html, &self.base))
    }
}

/// Parses every headline container on a listing page, in document order.
/// Containers that fail to parse are logged and counted, not returned.
pub fn parse_listing(html: &str, base: &Url) -> ListingPage {
    let document = Html::parse_document(html);
    let mut page = ListingPage::default();

    for (index, container) in document.select(&CONTAINER).enumerate() {
        match parse_container(container, base) {
            Ok(candidate) => page.candidates.push(candidate),
            Err(e) => {
                warn!(index, error = %e, "Skipping headline container");
                page.skipped += 1;
            }
        }
    }

    page
}

fn parse_container(container: ElementRef<'_>, base: &Url) -> Result<HeadlineCandidate> {
    let href = container
        .select(&ANCHOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| Error::Scraping("Headline container has no link".to_string()))?;

    let title = container
        .select(&TITLE)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string();
    if title.is_empty() {
        return Err(Error::Scraping(format!("Empty headline for {}", href)));
    }

    let raw_date = container
        .select(&UPDATED_TIME)
        .next()
        .and_then(|span| span.value().attr("data-updatedtime"))
        .ok_or_else(|| Error::Scraping(format!("No timestamp for {:?}", title)))?;

    Ok(HeadlineCandidate {
        link: resolve_link(base, href)?,
        published_at: parse_timestamp(raw_date)?,
        title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::Html as HtmlBody, routing::get, Router};

    const LISTING: &str = r#"
        <html><body>
          <div class="headlineSec">
            <h2 class="headline"><a href="/companies/news/acme-wins-contract-111.html">
              Acme wins big contract
            </a></h2>
            <span data-updatedtime="2024-06-20T10:00:00+05:30">2 min read</span>
          </div>
          <div class="headlineSec">
            <h2 class="headline"><a href="/companies/news/no-date-222.html">Missing date</a></h2>
          </div>
          <div class="headlineSec">
            <h2 class="headline"><a href="https://www.livemint.com/market/globex-333.html">Globex shares slip</a></h2>
            <span data-updatedtime="2024-06-19 08:15:00">5 min read</span>
          </div>
          <div class="headlineSec">
            <h2 class="headline"><a href="/companies/news/bad-444.html">Bad date</a></h2>
            <span data-updatedtime="not a date"></span>
          </div>
          <div class="headlineSec">
            <span data-updatedtime="2024-06-19 08:15:00"></span>
          </div>
        </body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://www.livemint.com").unwrap()
    }

    #[test]
    fn test_parse_listing_document_order() {
        let page = parse_listing(LISTING, &base());
        assert_eq!(page.candidates.len(), 2);
        assert_eq!(page.skipped, 3);
        assert_eq!(page.containers(), 5);

        let first = &page.candidates[0];
        assert_eq!(first.title, "Acme wins big contract");
        assert_eq!(
            first.link,
            "https://www.livemint.com/companies/news/acme-wins-contract-111.html"
        );
        assert_eq!(first.published_at.to_rfc3339(), "2024-06-20T04:30:00+00:00");

        let second = &page.candidates[1];
        assert_eq!(second.title, "Globex shares slip");
        assert_eq!(second.link, "https://www.livemint.com/market/globex-333.html");
    }

    #[test]
    fn test_parse_listing_without_containers() {
        let page = parse_listing("<html><body><p>Nothing here</p></body></html>", &base());
        assert!(page.is_empty());
    }

    #[test]
    fn test_page_urls() {
        let fetcher = LivemintFetcher::new().unwrap();
        assert_eq!(
            fetcher.page_url(1).unwrap().as_str(),
            "https://www.livemint.com/companies"
        );
        assert_eq!(
            fetcher.page_url(7).unwrap().as_str(),
            "https://www.livemint.com/companies/page-7"
        );
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_pages_from_server() {
        let app = Router::new()
            .route("/companies", get(|| async { HtmlBody(LISTING) }))
            .route(
                "/companies/page-2",
                get(|| async { HtmlBody("<html><body></body></html>") }),
            )
            .route(
                "/companies/page-3",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
            );
        let base_url = serve(app).await;

        let fetcher = LivemintFetcher::with_config(FetcherConfig {
            base_url: base_url.clone(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .unwrap();

        let first = fetcher.fetch_page(1).await.unwrap();
        assert_eq!(first.candidates.len(), 2);
        assert_eq!(
            first.candidates[0].link,
            format!("{}/companies/news/acme-wins-contract-111.html", base_url)
        );

        let second = fetcher.fetch_page(2).await.unwrap();
        assert!(second.is_empty());

        match fetcher.fetch_page(3).await {
            Err(Error::HttpStatus { status, .. }) => assert_eq!(status, 503),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host() {
        let fetcher = LivemintFetcher::with_config(FetcherConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();
        let err = fetcher.fetch_page(1).await.unwrap_err();
        assert!(err.is_fetch_error());
    }
}
