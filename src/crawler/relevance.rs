//! Relevance filtering
//!
//! A relevance predicate decides, from a listing's title, description and
//! locality, whether the listing is kept. Any `Fn(&str, &str, &str) -> bool`
//! closure is a predicate.

use crate::config::FilterConfig;

/// Decides whether a listing is relevant to the crawl
pub trait RelevancePredicate: Send + Sync {
    fn is_relevant(&self, title: &str, description: &str, locality: &str) -> bool;
}

impl<F> RelevancePredicate for F
where
    F: Fn(&str, &str, &str) -> bool + Send + Sync,
{
    fn is_relevant(&self, title: &str, description: &str, locality: &str) -> bool {
        self(title, description, locality)
    }
}

/// Accepts every listing
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl RelevancePredicate for AcceptAll {
    fn is_relevant(&self, _title: &str, _description: &str, _locality: &str) -> bool {
        true
    }
}

/// Case-insensitive term matching on topic and location
///
/// A listing passes when some topic term occurs in its title or
/// description and some location term occurs in its locality. An empty
/// term list accepts everything.
#[derive(Debug, Clone, Default)]
pub struct KeywordRelevance {
    topic_terms: Vec<String>,
    location_terms: Vec<String>,
}

impl KeywordRelevance {
    pub fn new<I, J>(topic_terms: I, location_terms: J) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        J: IntoIterator,
        J::Item: AsRef<str>,
    {
        Self {
            topic_terms: normalize_terms(topic_terms),
            location_terms: normalize_terms(location_terms),
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.topic_terms, &config.location_terms)
    }

    fn topic_matches(&self, title: &str, description: &str) -> bool {
        if self.topic_terms.is_empty() {
            return true;
        }
        let title = title.to_lowercase();
        let description = description.to_lowercase();
        self.topic_terms
            .iter()
            .any(|term| title.contains(term.as_str()) || description.contains(term.as_str()))
    }

    fn location_matches(&self, locality: &str) -> bool {
        if self.location_terms.is_empty() {
            return true;
        }
        let locality = locality.to_lowercase();
        self.location_terms
            .iter()
            .any(|term| locality.contains(term.as_str()))
    }
}

impl RelevancePredicate for KeywordRelevance {
    fn is_relevant(&self, title: &str, description: &str, locality: &str) -> bool {
        self.topic_matches(title, description) && self.location_matches(locality)
    }
}

fn normalize_terms<I>(terms: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    terms
        .into_iter()
        .map(|term| term.as_ref().trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}
