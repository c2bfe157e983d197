use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sn_core::{Error, Result};

use super::{HeadlineCandidate, HeadlineFetcher, ListingPage};

/// A canned response for one page of a [`MockFetcher`].
#[derive(Debug, Clone)]
pub enum MockPage {
    Listing(ListingPage),
    /// The fetch fails with the given message
    Fail(String),
}

impl MockPage {
    /// A page whose headlines were published `age` ago, in the given order.
    pub fn aged(headlines: &[(&str, Duration)]) -> Self {
        let now = Utc::now();
        MockPage::Listing(ListingPage {
            candidates: headlines
                .iter()
                .enumerate()
                .map(|(i, (title, age))| HeadlineCandidate {
                    title: title.to_string(),
                    link: format!("https://news.example/companies/{}", i),
                    published_at: now - *age,
                })
                .collect(),
            skipped: 0,
        })
    }
}

/// Serves canned listing pages. Pages past the end are empty.
pub struct MockFetcher {
    pages: Vec<MockPage>,
    calls: AtomicU32,
}

impl fmt::Debug for MockFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockFetcher")
            .field("pages", &self.pages.len())
            .field("calls", &self.calls())
            .finish()
    }
}

impl MockFetcher {
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self {
            pages,
            calls: AtomicU32::new(0),
        }
    }

    /// Number of `fetch_page` calls made so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HeadlineFetcher for MockFetcher {
    fn source(&self) -> &str {
        "mock"
    }

    async fn fetch_page(&self, page: u32) -> Result<ListingPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let index = page.saturating_sub(1) as usize;
        match self.pages.get(index) {
            Some(MockPage::Listing(listing)) => Ok(listing.clone()),
            Some(MockPage::Fail(message)) => Err(Error::External(anyhow::anyhow!(message.clone()))),
            None => Ok(ListingPage::default()),
        }
    }
}
