//! Listing-page link dump

use crate::config::Config;
use crate::extract;
use crate::fetch::PageFetcher;
use crate::pipeline::PipelineError;
use std::sync::Arc;
use tracing::info;

/// Fetch the listing page and print every link with its resolved
/// absolute URL. Returns the number of links found.
pub async fn run(config: &Config, fetcher: Arc<dyn PageFetcher>) -> Result<usize, PipelineError> {
    let listing_url = config.site.listing_url()?;
    info!(url = %listing_url, "fetching listing page");

    let html = fetcher.fetch_text(listing_url.as_str()).await?;
    let links = extract::extract_links(&html, &listing_url, None)?;

    for (index, link) in links.iter().enumerate() {
        let text = if link.text.is_empty() {
            "(no text)"
        } else {
            &link.text
        };
        println!("{}. {}\n   {}\n", index + 1, text, link.href);
    }
    println!("Total: {} links", links.len());

    Ok(links.len())
}
