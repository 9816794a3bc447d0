//! Downloading the schedule PDF and reading its text.

use async_trait::async_trait;
use hearth_config::FlightsConfig;
use reqwest::Url;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{FlightError, Result};
use crate::schedule::{parse_flights, Flight};

/// Where the current schedule comes from.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Fetch and parse the schedule as currently published.
    async fn latest(&self) -> Result<Vec<Flight>>;
}

/// First link on `html` whose target contains `marker` and ends in `.pdf`,
/// resolved against `base`.
pub fn find_schedule_link(html: &str, base: &Url, marker: &str) -> Option<Url> {
    let document = Html::parse_document(html);
    let links = Selector::parse("a[href]").ok()?;
    document
        .select(&links)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains(marker) && href.to_ascii_lowercase().ends_with(".pdf"))
        .and_then(|href| base.join(href).ok())
}

/// [`ScheduleSource`] that scrapes the terminal page.
pub struct FlightFetcher {
    client: reqwest::Client,
    page_url: Url,
    marker: String,
}

impl FlightFetcher {
    /// Build a fetcher from the `flights` config section.
    pub fn new(config: &FlightsConfig) -> Result<Self> {
        let page_url = Url::parse(&config.page_url).map_err(|e| FlightError::InvalidUrl {
            url: config.page_url.clone(),
            reason: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|source| FlightError::Request {
                action: "build HTTP client",
                source,
            })?;
        Ok(Self {
            client,
            page_url,
            marker: config.link_marker.clone(),
        })
    }

    async fn get(&self, url: Url, action: &'static str) -> Result<reqwest::Response> {
        self.client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|source| FlightError::Request { action, source })
    }

    async fn pdf_url(&self) -> Result<Url> {
        let page = self
            .get(self.page_url.clone(), "fetch terminal page")
            .await?
            .text()
            .await
            .map_err(|source| FlightError::Request {
                action: "read terminal page",
                source,
            })?;
        find_schedule_link(&page, &self.page_url, &self.marker)
            .ok_or_else(|| FlightError::LinkNotFound(self.marker.clone()))
    }
}

#[async_trait]
impl ScheduleSource for FlightFetcher {
    async fn latest(&self) -> Result<Vec<Flight>> {
        let pdf_url = self.pdf_url().await?;
        debug!(url = %pdf_url, "Downloading flight schedule");
        let bytes = self
            .get(pdf_url, "download schedule PDF")
            .await?
            .bytes()
            .await
            .map_err(|source| FlightError::Request {
                action: "read schedule PDF",
                source,
            })?;

        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| FlightError::Pdf(e.to_string()))?
            .map_err(|e| FlightError::Pdf(e.to_string()))?;

        let flights = parse_flights(&text);
        info!(count = flights.len(), "Parsed flight schedule");
        Ok(flights)
    }
}
