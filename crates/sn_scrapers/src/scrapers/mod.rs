use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sn_core::{Error, Headline, Result};
use url::Url;

pub mod livemint;
pub mod mock;

pub use livemint::{FetcherConfig, LivemintFetcher};
pub use mock::{MockFetcher, MockPage};

/// One headline container as found on a listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlineCandidate {
    pub title: String,
    /// Absolute URL
    pub link: String,
    pub published_at: DateTime<Utc>,
}

impl HeadlineCandidate {
    pub fn into_headline(self) -> Headline {
        Headline {
            text: self.title,
            link: self.link,
            date: self.published_at.date_naive(),
        }
    }
}

/// Parsed contents of a single listing page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub candidates: Vec<HeadlineCandidate>,
    /// Containers that were present but could not be parsed
    pub skipped: usize,
}

impl ListingPage {
    /// True when the page had no headline containers at all.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.skipped == 0
    }

    pub fn containers(&self) -> usize {
        self.candidates.len() + self.skipped
    }
}

#[async_trait]
pub trait HeadlineFetcher: Send + Sync {
    /// Returns the name of the news source
    fn source(&self) -> &str;

    /// Fetches and parses listing page `page` (1-based). A single attempt, no retries.
    async fn fetch_page(&self, page: u32) -> Result<ListingPage>;
}

/// Common utilities for fetchers
pub(crate) mod utils {
    use super::*;

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ];

    /// Parses a page-embedded timestamp. Zoneless forms are read as UTC.
    pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        for format in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(dt.and_utc());
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Ok(date.and_time(NaiveTime::MIN).and_utc());
        }
        Err(Error::Scraping(format!("Unparsable timestamp: {:?}", raw)))
    }

    /// Joins an href found on a page against the source's base URL.
    pub fn resolve_link(base: &Url, href: &str) -> Result<String> {
        base.join(href.trim())
            .map(|url| url.to_string())
            .map_err(|e| Error::Scraping(format!("Failed to resolve link {:?}: {}", href, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let dt = utils::parse_timestamp("2024-06-20T23:30:00+05:30").unwrap();
        assert_eq!(dt.hour(), 18);
        assert_eq!(dt.day(), 20);
    }

    #[test]
    fn test_parse_timestamp_offset_crosses_midnight() {
        let dt = utils::parse_timestamp("2024-06-21T02:00:00+05:30").unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2024, 6, 20).unwrap());
    }

    #[test]
    fn test_parse_timestamp_naive_forms() {
        let a = utils::parse_timestamp("2024-06-20 10:23:45").unwrap();
        let b = utils::parse_timestamp("2024-06-20T10:23:45").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hour(), 10);

        let day = utils::parse_timestamp("2024-06-20").unwrap();
        assert_eq!(day.hour(), 0);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(matches!(utils::parse_timestamp("yesterday"), Err(Error::Scraping(_))));
        assert!(utils::parse_timestamp("").is_err());
    }

    #[test]
    fn test_resolve_link() {
        let base = Url::parse("https://www.livemint.com").unwrap();
        assert_eq!(
            utils::resolve_link(&base, "/companies/news/acme-1.html").unwrap(),
            "https://www.livemint.com/companies/news/acme-1.html"
        );
        assert_eq!(
            utils::resolve_link(&base, "https://other.example/x").unwrap(),
            "https://other.example/x"
        );
    }

    #[test]
    fn test_candidate_into_headline_truncates_to_day() {
        let candidate = HeadlineCandidate {
            title: "Acme".to_string(),
            link: "https://www.livemint.com/a".to_string(),
            published_at: utils::parse_timestamp("2024-06-20T18:45:00Z").unwrap(),
        };
        let headline = candidate.into_headline();
        assert_eq!(headline.date, NaiveDate::from_ymd_opt(2024, 6, 20).unwrap());
    }

    #[test]
    fn test_listing_page_emptiness() {
        assert!(ListingPage::default().is_empty());
        let page = ListingPage { candidates: vec![], skipped: 2 };
        assert!(!page.is_empty());
        assert_eq!(page.containers(), 2);
    }
}
