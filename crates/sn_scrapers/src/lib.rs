pub mod crawler;
pub mod logging;
pub mod scrapers;

pub use crawler::{CrawlOutcome, CrawlerConfig, RecencyWindowCrawler, StopReason};
pub use logging::{init_logging, Logger};
pub use scrapers::{
    FetcherConfig, HeadlineCandidate, HeadlineFetcher, ListingPage, LivemintFetcher, MockFetcher,
    MockPage,
};
