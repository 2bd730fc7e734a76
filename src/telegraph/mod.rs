//! All publishing-platform-specific functionality: the page client, the
//! node wire format, the paginator and the page-series publisher.

pub mod client;
pub mod nodes;
pub mod paginator;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::core::models::PageSeries;
use crate::errors::RecapError;

// Re-export main types for convenience
pub use client::{PageApi, TelegraphClient};
pub use paginator::{PAGE_SIZE_LIMIT, SAFETY_BUFFER};

/// Publishes recap documents as a single page or a cross-linked series,
/// depending on the byte budget.
pub struct TelegraphPublisher<P> {
    api: Arc<P>,
    byte_budget: usize,
}

impl<P: PageApi> TelegraphPublisher<P> {
    #[must_use]
    pub fn new(api: Arc<P>) -> Self {
        Self {
            api,
            byte_budget: PAGE_SIZE_LIMIT,
        }
    }

    /// Override the per-page byte budget (useful for tests).
    #[must_use]
    pub fn with_byte_budget(mut self, byte_budget: usize) -> Self {
        self.byte_budget = byte_budget;
        self
    }

    /// Publish a document: one page when it fits the budget, a page series
    /// otherwise.
    pub async fn publish_document(
        &self,
        title: &str,
        html: &str,
    ) -> Result<PageSeries, RecapError> {
        if paginator::fits_single_page(html, self.byte_budget) {
            let url = self.api.create_page(title, html).await?;
            return PageSeries::new(vec![url])
                .ok_or_else(|| RecapError::Publish("page created without a URL".to_string()));
        }

        self.create_page_series(title, html).await
    }

    /// Split the document, create one page per part, then edit every page
    /// to prepend a cross-reference index of the whole series.
    ///
    /// A failed creation aborts the series (pages need their siblings to be
    /// navigable). Failed index edits are tolerated: the pages exist and
    /// only the cross-linking is degraded.
    pub async fn create_page_series(
        &self,
        title: &str,
        html: &str,
    ) -> Result<PageSeries, RecapError> {
        let parts = paginator::paginate(html, title, self.byte_budget);

        let mut urls: Vec<String> = Vec::with_capacity(parts.len());
        let mut titles: Vec<String> = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let part_title = if i == 0 {
                title.to_string()
            } else {
                format!("{title} (part {})", i + 1)
            };

            match self.api.create_page(&part_title, part).await {
                Ok(url) => {
                    urls.push(url);
                    titles.push(part_title);
                }
                Err(e) => {
                    error!(
                        part = i + 1,
                        total_parts = parts.len(),
                        created_so_far = urls.len(),
                        "failed to create page of the series: {e}"
                    );
                    return Err(e);
                }
            }
        }

        let series = PageSeries::new(urls.clone())
            .ok_or_else(|| RecapError::Publish("no pages created for the series".to_string()))?;

        if urls.len() > 1 {
            let index = series_index(&urls);
            for (i, url) in urls.iter().enumerate() {
                let linked = format!("{index}{}", parts[i]);
                if let Err(e) = self.api.edit_page(url, &titles[i], &linked).await {
                    warn!(
                        page = i + 1,
                        %url,
                        "failed to inject the series index, leaving page unlinked: {e}"
                    );
                }
            }
        }

        info!(
            total_pages = series.urls().len(),
            title, "published page series"
        );

        Ok(series)
    }
}

/// Cross-reference header listing every page of a series.
fn series_index(urls: &[String]) -> String {
    let mut index = String::from("<p><strong>Pages in this series:</strong></p><ul>");
    for (i, url) in urls.iter().enumerate() {
        index.push_str(&format!(
            "<li><a href=\"{url}\">Part {}</a></li>",
            i + 1
        ));
    }
    index.push_str("</ul><hr>");
    index
}
