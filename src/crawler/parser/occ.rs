//! OCC job board markup
//!
//! - Job cards are `div[id^="jobcard-"]`; the card id names the listing
//! - Detail URLs are built from the configured `{id}` template
//! - A page without cards signals that the keyword has no more results

use super::{
    collapse_whitespace, or_missing, page_fallback, ExtractionError, Extractor, ListingPage,
    SelectorChain, NOT_AVAILABLE,
};
use crate::storage::ItemRecord;
use crate::url::SiteUrls;
use scraper::{ElementRef, Html, Selector};

/// Extractor for OCC job board markup
#[derive(Debug, Clone)]
pub struct OccExtractor {
    urls: SiteUrls,
    source_tag: String,
    card: Selector,
    paragraph: Selector,
    title: SelectorChain,
    company_location_row: SelectorChain,
    company: SelectorChain,
    location: SelectorChain,
    compensation: SelectorChain,
    summary: SelectorChain,
    detail_container: SelectorChain,
    detail_fallback: SelectorChain,
}

impl OccExtractor {
    pub fn new(urls: SiteUrls, source_tag: impl Into<String>) -> Result<Self, ExtractionError> {
        Ok(Self {
            urls,
            source_tag: source_tag.into(),
            card: selector("div[id^=\"jobcard-\"]")?,
            paragraph: selector("p")?,
            title: SelectorChain::new(&["h2", "h3", "h4", "a.job-title", "a.title", "a[href]"])?,
            company_location_row: SelectorChain::new(&[
                "div.flex.flex-row.justify-between.items-center",
            ])?,
            company: SelectorChain::new(&[
                "span.company",
                "div.company-name",
                "a.company-link",
                "span.employer",
                "span.company-name",
                "div.employer",
                "p.company",
            ])?,
            location: SelectorChain::new(&[
                "span.location",
                "div.job-location",
                "span.city",
                "p.location",
                "span.job-location",
                "div.location",
                "span.place",
            ])?,
            compensation: SelectorChain::new(&[
                "span.mr-2.text-grey-900.font-base.font-light.mb-4",
                "span.salary",
                "div.job-salary",
                "span.compensation",
                "span.pay",
                "div.salary",
                "p.salary",
            ])?,
            summary: SelectorChain::new(&[
                "p.description",
                "div.job-summary",
                "div.job-description",
                "p.summary",
                "div.description",
                "p.job-description",
                "span.description",
            ])?,
            detail_container: SelectorChain::new(&[
                "div.break-words.mb-8",
                "div.job-description",
                "div.description",
                "div.job-details",
                "div[data-testid=\"job-description\"]",
                "div.job-content",
                "section.job-description",
                "article.job-description",
            ])?,
            detail_fallback: SelectorChain::new(&["main", "article", "div.main"])?,
        })
    }

    fn parse_card(&self, card: ElementRef<'_>) -> ItemRecord {
        let id = card
            .value()
            .attr("id")
            .map(|id| id.trim_start_matches("jobcard-").trim())
            .unwrap_or_default();

        let link = if id.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            self.urls
                .detail_url(id)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| NOT_AVAILABLE.to_string())
        };

        let (organization, locality) = match self.company_location_row.first_text(card) {
            Some(row) => split_company_location(&row),
            None => (self.company.first_text(card), self.location.first_text(card)),
        };

        ItemRecord {
            identity_key: link,
            title: or_missing(self.title.first_text(card)),
            organization: or_missing(organization),
            locality: or_missing(locality),
            compensation: or_missing(self.compensation.first_text(card)),
            work_mode: NOT_AVAILABLE.to_string(),
            description: or_missing(self.summary.first_text(card)),
            source: self.source_tag.clone(),
            keyword: String::new(),
        }
    }

    /// Text of the first `div` following a `p` heading that contains `heading`
    fn text_after_heading(&self, document: &Html, heading: &str) -> Option<String> {
        document
            .select(&self.paragraph)
            .filter(|p| p.text().any(|t| t.contains(heading)))
            .find_map(|p| {
                p.next_siblings()
                    .filter_map(ElementRef::wrap)
                    .find(|sibling| sibling.value().name() == "div")
            })
            .map(collapse_whitespace)
            .filter(|text| !text.is_empty())
    }
}

impl Extractor for OccExtractor {
    fn parse_listing(&self, raw: &str) -> Result<ListingPage, ExtractionError> {
        if raw.trim().is_empty() {
            return Err(ExtractionError::EmptyContent);
        }

        let document = Html::parse_document(raw);
        let items: Vec<ItemRecord> = document
            .select(&self.card)
            .map(|card| self.parse_card(card))
            .collect();

        tracing::debug!("Found {} job cards on page", items.len());

        Ok(ListingPage {
            has_more: !items.is_empty(),
            items,
        })
    }

    fn parse_detail(&self, raw: &str) -> Option<String> {
        if raw.trim().is_empty() {
            return None;
        }

        let document = Html::parse_document(raw);
        self.detail_container
            .first_text(document.root_element())
            .or_else(|| self.text_after_heading(&document, "Descripción"))
            .or_else(|| page_fallback(&self.detail_fallback, &document))
    }
}

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|_| ExtractionError::Selector(css.to_string()))
}

/// Splits "Company, City, State" at the first comma
fn split_company_location(row: &str) -> (Option<String>, Option<String>) {
    match row.split_once(',') {
        Some((company, location)) => (
            Some(company.trim().to_string()).filter(|s| !s.is_empty()),
            Some(location.trim().to_string()).filter(|s| !s.is_empty()),
        ),
        None => (Some(row.to_string()), Some(row.to_string())),
    }
}
