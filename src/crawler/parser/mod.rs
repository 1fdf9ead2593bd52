//! Listing and detail page extraction
//!
//! The orchestrator sees one `Extractor` capability and never branches on
//! site markup. Each supported job board has its own implementation:
//! - `OccExtractor`: id-named job cards, detail URLs from a template
//! - `ComputrabajoExtractor`: `article.box_offer` cards linking to details
//!
//! Selector lists are compiled once, when the extractor is built.

mod computrabajo;
mod occ;

pub use computrabajo::ComputrabajoExtractor;
pub use occ::OccExtractor;

use crate::config::{SiteConfig, SiteKind};
use crate::storage::ItemRecord;
use crate::url::SiteUrls;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use thiserror::Error;

/// Placeholder stored for fields a card does not show
pub const NOT_AVAILABLE: &str = "N/A";

/// Detail text shorter than this is not taken from the page-wide fallback
const MIN_FALLBACK_DESCRIPTION: usize = 100;

/// Errors raised while extracting listings
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Page content is empty")]
    EmptyContent,

    #[error("Invalid selector '{0}'")]
    Selector(String),
}

/// Listings extracted from one listing page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub items: Vec<ItemRecord>,
    /// False when the site has no further pages for this keyword
    pub has_more: bool,
}

/// Turns raw page content into listing records
pub trait Extractor: Send + Sync {
    /// Extracts the listings of one results page
    fn parse_listing(&self, raw: &str) -> Result<ListingPage, ExtractionError>;

    /// Extracts the description text of a detail page
    fn parse_detail(&self, raw: &str) -> Option<String>;
}

/// Builds the extractor configured for the site
pub fn build_extractor(site: &SiteConfig) -> Result<Arc<dyn Extractor>, ExtractionError> {
    let urls = SiteUrls::new(site);
    let extractor: Arc<dyn Extractor> = match site.extractor {
        SiteKind::Occ => Arc::new(OccExtractor::new(urls, site.source_tag.clone())?),
        SiteKind::Computrabajo => {
            Arc::new(ComputrabajoExtractor::new(urls, site.source_tag.clone())?)
        }
    };
    Ok(extractor)
}

/// Selectors tried in order; the first element with text wins
#[derive(Debug, Clone)]
pub(crate) struct SelectorChain {
    selectors: Vec<Selector>,
}

impl SelectorChain {
    pub(crate) fn new(css: &[&str]) -> Result<Self, ExtractionError> {
        let selectors = css
            .iter()
            .map(|css| Selector::parse(css).map_err(|_| ExtractionError::Selector(css.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors })
    }

    /// Collapsed text of the first matching element with any text
    pub(crate) fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            scope
                .select(selector)
                .next()
                .map(collapse_whitespace)
                .filter(|text| !text.is_empty())
        })
    }

    /// First matching element that `skip` does not reject
    pub(crate) fn first_element<'a, F>(&self, scope: ElementRef<'a>, skip: F) -> Option<ElementRef<'a>>
    where
        F: Fn(&ElementRef<'a>) -> bool,
    {
        self.selectors
            .iter()
            .find_map(|selector| scope.select(selector).find(|element| !skip(element)))
    }
}

/// Substantial text of a page-wide container, used when nothing better exists
pub(crate) fn page_fallback(chain: &SelectorChain, document: &Html) -> Option<String> {
    chain
        .first_text(document.root_element())
        .filter(|text| text.chars().count() > MIN_FALLBACK_DESCRIPTION)
}

pub(crate) fn collapse_whitespace(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn or_missing(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_selector_is_reported() {
        assert!(matches!(
            SelectorChain::new(&["div", "p[["]),
            Err(ExtractionError::Selector(css)) if css == "p[["
        ));
    }

    #[test]
    fn test_chain_skips_empty_matches() {
        let document = Html::parse_fragment("<div><span class='a'> </span><p>Acme  Corp</p></div>");
        let chain = SelectorChain::new(&["span.a", "p"]).unwrap();
        assert_eq!(
            chain.first_text(document.root_element()),
            Some("Acme Corp".to_string())
        );
    }

    #[test]
    fn test_build_extractor_per_site() {
        let mut site = SiteConfig {
            extractor: SiteKind::Occ,
            listing_url: "https://www.occ.com.mx/empleos/de-{keyword}/".to_string(),
            page_param: "page".to_string(),
            detail_url: "https://www.occ.com.mx/empleos/empleo-{id}/".to_string(),
            source_tag: "OCC".to_string(),
        };
        let occ = build_extractor(&site).unwrap();
        let page = occ
            .parse_listing(r#"<div id="jobcard-9"><h2>Analista</h2></div>"#)
            .unwrap();
        assert_eq!(page.items.len(), 1);

        site.extractor = SiteKind::Computrabajo;
        let computrabajo = build_extractor(&site).unwrap();
        let page = computrabajo
            .parse_listing(r#"<div id="jobcard-9"><h2>Analista</h2></div>"#)
            .unwrap();
        assert!(page.items.is_empty());
    }
}
