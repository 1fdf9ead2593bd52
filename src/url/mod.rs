//! URL handling module for Listing-Harvest
//!
//! This module provides identity-key derivation for listings and the URL
//! templates that address listing and detail pages on the target site.

mod normalize;

use crate::config::SiteConfig;
use crate::UrlError;
use url::Url;

// Re-export main functions
pub use normalize::identity_key;

/// Builds listing and detail page URLs from the configured templates
#[derive(Debug, Clone)]
pub struct SiteUrls {
    listing_template: String,
    detail_template: String,
    page_param: String,
}

impl SiteUrls {
    /// Creates URL builders from the site configuration
    pub fn new(site: &SiteConfig) -> Self {
        Self {
            listing_template: site.listing_url.clone(),
            detail_template: site.detail_url.clone(),
            page_param: site.page_param.clone(),
        }
    }

    /// Returns the listing page URL for a keyword and 1-based page number
    ///
    /// Page 1 is the bare search URL; later pages carry the page parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use listing_harvest::config::{SiteConfig, SiteKind};
    /// use listing_harvest::url::SiteUrls;
    ///
    /// let urls = SiteUrls::new(&SiteConfig {
    ///     extractor: SiteKind::Occ,
    ///     listing_url: "https://www.occ.com.mx/empleos/de-{keyword}/".to_string(),
    ///     page_param: "page".to_string(),
    ///     detail_url: "https://www.occ.com.mx/empleos/empleo-{id}/".to_string(),
    ///     source_tag: "OCC".to_string(),
    /// });
    ///
    /// assert_eq!(
    ///     urls.listing_url("rrhh", 3).unwrap().as_str(),
    ///     "https://www.occ.com.mx/empleos/de-rrhh/?page=3"
    /// );
    /// ```
    pub fn listing_url(&self, keyword: &str, page: u32) -> Result<Url, UrlError> {
        let raw = self.listing_template.replace("{keyword}", keyword);
        let mut url = Url::parse(&raw).map_err(|e| UrlError::Parse(e.to_string()))?;

        if page > 1 {
            url.query_pairs_mut()
                .append_pair(&self.page_param, &page.to_string());
        }

        Ok(url)
    }

    /// Returns the detail page URL for a listing card id
    pub fn detail_url(&self, id: &str) -> Result<Url, UrlError> {
        let raw = self.detail_template.replace("{id}", id);
        Url::parse(&raw).map_err(|e| UrlError::Parse(e.to_string()))
    }

    /// Resolves a card link against the site, so relative hrefs become absolute
    pub fn resolve(&self, href: &str) -> Result<Url, UrlError> {
        let base = self.listing_template.replace("{keyword}", "");
        let base = Url::parse(&base).map_err(|e| UrlError::Parse(e.to_string()))?;
        base.join(href.trim())
            .map_err(|e| UrlError::Parse(e.to_string()))
    }
}
