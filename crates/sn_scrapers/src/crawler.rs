//! Page-by-page crawl of a headline listing with a recency cutoff.
//!
//! The listing is assumed to be ordered newest first, so once a page past
//! the first holds nothing newer than the cutoff the crawl stops. Pages are
//! fetched strictly one after another; every call owns its accumulator, so
//! a single crawler can be shared between concurrent requests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sn_core::Headline;
use tokio::time::Instant;
use tracing::info;

use crate::logging::Logger;
use crate::scrapers::HeadlineFetcher;

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Upper bound on fetch calls per crawl
    pub max_pages: u32,
    /// Headlines older than this many days count as stale
    pub recency_window_days: u32,
    /// Checked between pages; `None` never expires
    pub deadline: Option<Duration>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            recency_window_days: 2,
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A page had no headline containers
    NoMoreData,
    /// Every headline on this page (after the first) was older than the cutoff
    StalePage { page: u32 },
    MaxPages,
    FetchFailed { page: u32, message: String },
    DeadlineExceeded { page: u32 },
}

#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub headlines: Vec<Headline>,
    /// Number of `fetch_page` calls issued, failed ones included
    pub pages_requested: u32,
    pub stop: StopReason,
}

impl CrawlOutcome {
    /// True when the crawl was cut short by a failure or the deadline.
    pub fn is_partial(&self) -> bool {
        matches!(
            self.stop,
            StopReason::FetchFailed { .. } | StopReason::DeadlineExceeded { .. }
        )
    }
}

pub struct RecencyWindowCrawler {
    fetcher: Arc<dyn HeadlineFetcher>,
    config: CrawlerConfig,
}

impl RecencyWindowCrawler {
    pub fn new(fetcher: Arc<dyn HeadlineFetcher>, config: CrawlerConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Headlines mentioning `company_name`. Never fails; a failed fetch yields what was
    /// gathered before it.
    pub async fn news(&self, company_name: &str) -> Vec<Headline> {
        self.crawl(company_name).await.headlines
    }

    pub async fn crawl(&self, company_name: &str) -> CrawlOutcome {
        self.crawl_at(company_name, Utc::now()).await
    }

    /// Crawls with the recency cutoff measured from `now`.
    pub async fn crawl_at(&self, company_name: &str, now: DateTime<Utc>) -> CrawlOutcome {
        let cutoff = now
            .checked_sub_signed(chrono::Duration::days(i64::from(self.config.recency_window_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let needle = company_name.to_lowercase();
        let logger = Logger::new().with_prefix(format!("[{}]", self.fetcher.source()));
        let started = Instant::now();

        let mut headlines = Vec::new();
        let mut pages_requested = 0;
        let mut stop = StopReason::MaxPages;

        for page in 1..=self.config.max_pages {
            let page_logger = logger.clone().with_prefix(format!("[page {}]", page));

            if let Some(deadline) = self.config.deadline {
                if started.elapsed() >= deadline {
                    page_logger.warn("Deadline reached before fetch. Stopping.");
                    stop = StopReason::DeadlineExceeded { page };
                    break;
                }
            }

            pages_requested += 1;
            let listing = match self.fetcher.fetch_page(page).await {
                Ok(listing) => listing,
                Err(e) => {
                    page_logger.error(&format!("Fetch failed: {}", e));
                    stop = StopReason::FetchFailed {
                        page,
                        message: e.to_string(),
                    };
                    break;
                }
            };

            if listing.is_empty() {
                page_logger.info("No headlines found. Stopping.");
                stop = StopReason::NoMoreData;
                break;
            }

            let scanned = listing.containers();
            let mut all_stale = true;
            for candidate in listing.candidates {
                if candidate.published_at >= cutoff {
                    all_stale = false;
                }
                if candidate.title.to_lowercase().contains(&needle) {
                    headlines.push(candidate.into_headline());
                }
            }
            page_logger.debug(&format!(
                "Scanned {} headlines, {} matches so far",
                scanned,
                headlines.len()
            ));

            if all_stale && page > 1 {
                page_logger.info(&format!(
                    "All news is older than {} days. Stopping.",
                    self.config.recency_window_days
                ));
                stop = StopReason::StalePage { page };
                break;
            }
        }

        info!(
            company = company_name,
            count = headlines.len(),
            pages = pages_requested,
            stop = ?stop,
            "Found {} recent headlines related to {}",
            headlines.len(),
            company_name
        );

        CrawlOutcome {
            headlines,
            pages_requested,
            stop,
        }
    }
}
