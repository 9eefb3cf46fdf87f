use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use scraper::Html;
use serde::Serialize;

use crate::enrich::Enricher;
use crate::error::ScrapeError;
use crate::locator::Locator;
use crate::merge::merge;
use crate::models::FinalRecord;
use crate::pipeline::ProfileExtractor;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A page whose markup can be read, possibly still loading.
pub trait PageSource: Send + Sync {
    fn url(&self) -> &str;

    /// Current markup. Called repeatedly while waiting for the page to render.
    fn snapshot(&self) -> Result<String>;
}

pub struct StaticPage {
    url: String,
    html: String,
}

impl StaticPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// Loads a saved profile page from disk.
    pub fn from_file(path: &Path, url: impl Into<String>) -> Result<Self> {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page {}", path.display()))?;
        Ok(Self::new(url, html))
    }
}

impl PageSource for StaticPage {
    fn url(&self) -> &str {
        &self.url
    }

    fn snapshot(&self) -> Result<String> {
        Ok(self.html.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionState {
    Idle,
    ExtractingLocal,
    Enriching,
    Merged,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub anchor_selector: String,
    pub anchor_timeout: Duration,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub enrichment_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            anchor_selector: "h1".to_string(),
            anchor_timeout: Duration::from_millis(3000),
            poll_interval: Duration::from_millis(250),
            settle_delay: Duration::from_millis(2000),
            enrichment_timeout: Duration::from_millis(20_000),
        }
    }
}

/// Released on drop, so every exit path from a scrape frees the session.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ScrapeSession {
    extractor: ProfileExtractor,
    enricher: Option<Enricher>,
    clock: Arc<dyn Clock>,
    options: SessionOptions,
    in_flight: AtomicBool,
    state: Mutex<ExtractionState>,
    cache: Mutex<HashMap<String, FinalRecord>>,
}

impl ScrapeSession {
    pub fn new(
        extractor: ProfileExtractor,
        enricher: Option<Enricher>,
        clock: Arc<dyn Clock>,
        options: SessionOptions,
    ) -> Self {
        Self {
            extractor,
            enricher,
            clock,
            options,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(ExtractionState::Idle),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn state(&self) -> ExtractionState {
        *lock(&self.state)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn cached(&self, url: &str) -> Option<FinalRecord> {
        lock(&self.cache).get(url).cloned()
    }

    fn transition(&self, next: ExtractionState) {
        let mut state = lock(&self.state);
        tracing::debug!(from = ?*state, to = ?next, "extraction state");
        *state = next;
    }

    /// Scrapes `page`, or returns the record cached for its URL. A second call
    /// while one is running fails with [`ScrapeError::InProgress`] and leaves
    /// the running one untouched.
    pub async fn scrape(&self, page: &dyn PageSource) -> Result<FinalRecord, ScrapeError> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or(ScrapeError::InProgress)?;
        let url = page.url().to_string();

        if let Some(record) = self.cached(&url) {
            tracing::debug!(%url, "returning cached profile");
            return Ok(record);
        }

        self.transition(ExtractionState::ExtractingLocal);
        let html = match self.wait_for_page(page).await {
            Ok(html) => html,
            Err(e) => {
                self.transition(ExtractionState::Idle);
                return Err(e);
            }
        };

        let extraction = self
            .extractor
            .extract(Arc::from(html), &url, self.clock.now())
            .await;
        let degraded = extraction.degraded().count();

        let enriched = match &self.enricher {
            Some(enricher) => {
                self.transition(ExtractionState::Enriching);
                match enricher
                    .enrich_with_timeout(&extraction.record, self.options.enrichment_timeout)
                    .await
                {
                    Ok(fields) => Some(fields),
                    Err(e) => {
                        tracing::warn!(
                            kind = e.kind(),
                            model = enricher.model_name(),
                            error = %e,
                            "enrichment unavailable, keeping local fields"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let record = merge(extraction.record, enriched);
        self.transition(ExtractionState::Merged);
        tracing::info!(%url, enhanced = record.enhanced, degraded, "profile scraped");

        lock(&self.cache).insert(url, record.clone());
        Ok(record)
    }

    /// Polls the page until the anchor renders, then lets it settle and takes
    /// the snapshot that gets extracted.
    async fn wait_for_page(&self, page: &dyn PageSource) -> Result<String, ScrapeError> {
        let selector = &self.options.anchor_selector;
        let anchor =
            Locator::parse(selector).ok_or_else(|| ScrapeError::InvalidAnchor(selector.clone()))?;
        let started = Instant::now();

        loop {
            let html = page.snapshot().map_err(ScrapeError::Page)?;
            let rendered = {
                let doc = Html::parse_document(&html);
                anchor.first(doc.root_element()).is_some()
            };
            if rendered {
                break;
            }

            let waited = started.elapsed();
            if waited >= self.options.anchor_timeout {
                return Err(ScrapeError::AnchorNotFound {
                    selector: selector.clone(),
                    waited_ms: waited.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }

        if !self.options.settle_delay.is_zero() {
            tokio::time::sleep(self.options.settle_delay).await;
        }
        page.snapshot().map_err(ScrapeError::Page)
    }
}
