//! Computrabajo job board markup
//!
//! Cards are `article.box_offer` elements whose title anchor links to the
//! detail page. Salary and work mode are bare text following an icon span.

use super::{
    collapse_whitespace, or_missing, page_fallback, ExtractionError, Extractor, ListingPage,
    SelectorChain, NOT_AVAILABLE,
};
use crate::storage::ItemRecord;
use crate::url::SiteUrls;
use scraper::{ElementRef, Html, Selector};

/// Extractor for Computrabajo job board markup
#[derive(Debug, Clone)]
pub struct ComputrabajoExtractor {
    urls: SiteUrls,
    source_tag: String,
    card: Selector,
    title: Selector,
    company: SelectorChain,
    location: SelectorChain,
    salary_icon: Selector,
    work_mode_icon: Selector,
    detail_container: SelectorChain,
    detail_fallback: SelectorChain,
}

impl ComputrabajoExtractor {
    pub fn new(urls: SiteUrls, source_tag: impl Into<String>) -> Result<Self, ExtractionError> {
        Ok(Self {
            urls,
            source_tag: source_tag.into(),
            card: selector("article.box_offer")?,
            title: selector("a.js-o-link.fc_base")?,
            company: SelectorChain::new(&[
                "a[offer-grid-article-company-url]",
                "a.fc_base",
                "span.fs16",
                "p.fs16",
                "div.fs16",
            ])?,
            // Exact class list; the company row carries the same classes plus others
            location: SelectorChain::new(&["p[class=\"fs16 fc_base mt5\"]"])?,
            salary_icon: selector("span.icon.i_salary")?,
            work_mode_icon: selector("span.icon.i_home_office")?,
            detail_container: SelectorChain::new(&["p.mbB", "div#job-description"])?,
            detail_fallback: SelectorChain::new(&["main", "article"])?,
        })
    }

    fn parse_card(&self, card: ElementRef<'_>) -> ItemRecord {
        let title = card.select(&self.title).next();

        let link = title
            .and_then(|anchor| anchor.value().attr("href"))
            .and_then(|href| self.urls.resolve(href).ok())
            .map(|url| url.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        // The company cascade includes `a.fc_base`, which also matches the title anchor
        let organization = self
            .company
            .first_element(card, |element| title.is_some_and(|t| t.id() == element.id()))
            .map(collapse_whitespace)
            .filter(|text| !text.is_empty());

        ItemRecord {
            identity_key: link,
            title: or_missing(title.map(collapse_whitespace).filter(|t| !t.is_empty())),
            organization: or_missing(organization),
            locality: or_missing(self.location.first_text(card)),
            compensation: or_missing(text_after(card, &self.salary_icon)),
            work_mode: or_missing(text_after(card, &self.work_mode_icon)),
            description: NOT_AVAILABLE.to_string(),
            source: self.source_tag.clone(),
            keyword: String::new(),
        }
    }
}

impl Extractor for ComputrabajoExtractor {
    fn parse_listing(&self, raw: &str) -> Result<ListingPage, ExtractionError> {
        if raw.trim().is_empty() {
            return Err(ExtractionError::EmptyContent);
        }

        let document = Html::parse_document(raw);
        let items: Vec<ItemRecord> = document
            .select(&self.card)
            .map(|card| self.parse_card(card))
            .collect();

        tracing::debug!("Found {} offer cards on page", items.len());

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
            .or_else(|| page_fallback(&self.detail_fallback, &document))
    }
}

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|_| ExtractionError::Selector(css.to_string()))
}

/// Bare text node that follows the first `icon` inside `card`
fn text_after(card: ElementRef<'_>, icon: &Selector) -> Option<String> {
    let icon = card.select(icon).next()?;
    icon.next_siblings()
        .find_map(|node| node.value().as_text().map(|text| text.trim().to_string()))
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SiteConfig, SiteKind};
    use crate::url::identity_key;

    const LISTING_HTML: &str = r#"
        <html><body>
        <article class="box_offer">
            <h2><a class="js-o-link fc_base" href="/ofertas-de-trabajo/oferta-de-trabajo-de-analista-de-rh-ABC123?utm_source=grid">
                Analista de RH
            </a></h2>
            <p class="dFlex vm_fx fs16 fc_base mt5">
                <a class="fc_base t_ellipsis" offer-grid-article-company-url="">Grupo Acme</a>
            </p>
            <p class="fs16 fc_base mt5"><span class="mr10">Miguel Hidalgo, CDMX</span></p>
            <div class="fs13 mt15">
                <span class="dIB mr10"><span class="icon i_salary"></span> $ 15,000.00 (Mensual)</span>
                <span class="dIB mr10"><span class="icon i_home_office"></span> Remoto</span>
            </div>
        </article>
        <article class="box_offer">
            <h2><a class="js-o-link fc_base" href="/ofertas-de-trabajo/oferta-de-trabajo-de-reclutador-DEF456">Reclutador</a></h2>
        </article>
        </body></html>
    "#;

    fn extractor() -> ComputrabajoExtractor {
        let urls = SiteUrls::new(&SiteConfig {
            extractor: SiteKind::Computrabajo,
            listing_url: "https://mx.computrabajo.com/trabajo-de-{keyword}".to_string(),
            page_param: "p".to_string(),
            detail_url: String::new(),
            source_tag: "Computrabajo".to_string(),
        });
        ComputrabajoExtractor::new(urls, "Computrabajo").unwrap()
    }

    #[test]
    fn test_parse_offer_cards() {
        let page = extractor().parse_listing(LISTING_HTML).unwrap();
        assert!(page.has_more);
        assert_eq!(page.items.len(), 2);

        let first = &page.items[0];
        assert_eq!(first.title, "Analista de RH");
        assert_eq!(first.organization, "Grupo Acme");
        assert_eq!(first.locality, "Miguel Hidalgo, CDMX");
        assert_eq!(first.compensation, "$ 15,000.00 (Mensual)");
        assert_eq!(first.work_mode, "Remoto");
        assert_eq!(first.description, NOT_AVAILABLE);
        assert_eq!(first.source, "Computrabajo");
        assert_eq!(
            identity_key(&first.identity_key).unwrap(),
            "https://mx.computrabajo.com/ofertas-de-trabajo/oferta-de-trabajo-de-analista-de-rh-ABC123/"
        );
    }

    #[test]
    fn test_missing_card_fields_are_not_available() {
        let page = extractor().parse_listing(LISTING_HTML).unwrap();
        let second = &page.items[1];

        assert_eq!(second.title, "Reclutador");
        assert_eq!(second.organization, NOT_AVAILABLE);
        assert_eq!(second.locality, NOT_AVAILABLE);
        assert_eq!(second.compensation, NOT_AVAILABLE);
        assert_eq!(second.work_mode, NOT_AVAILABLE);
        assert_eq!(
            second.identity_key,
            "https://mx.computrabajo.com/ofertas-de-trabajo/oferta-de-trabajo-de-reclutador-DEF456"
        );
    }

    #[test]
    fn test_company_never_taken_from_title() {
        let html = r#"<article class="box_offer">
            <a class="js-o-link fc_base" href="/oferta-1">Analista</a>
            <span class="fs16">Beta Consultores</span>
        </article>"#;

        let page = extractor().parse_listing(html).unwrap();
        assert_eq!(page.items[0].organization, "Beta Consultores");
    }

    #[test]
    fn test_no_cards_means_no_more_pages() {
        let page = extractor()
            .parse_listing("<html><body><p>Sin resultados</p></body></html>")
            .unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn test_empty_content_is_error() {
        assert!(matches!(
            extractor().parse_listing("  "),
            Err(ExtractionError::EmptyContent)
        ));
    }

    #[test]
    fn test_detail_description() {
        let html = r#"<main><p class="mbB">Buscamos analista   con experiencia.</p></main>"#;
        assert_eq!(
            extractor().parse_detail(html),
            Some("Buscamos analista con experiencia.".to_string())
        );

        let html = r#"<div id="job-description">Funciones del puesto</div>"#;
        assert_eq!(
            extractor().parse_detail(html),
            Some("Funciones del puesto".to_string())
        );

        assert_eq!(extractor().parse_detail("<main>corto</main>"), None);
    }
}
