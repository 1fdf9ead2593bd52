use crate::config::types::{
    Config, CrawlerConfig, FetchConfig, OutputConfig, SiteConfig, SiteKind, UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the crawl plan and run-loop settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.keywords.is_empty() {
        return Err(ConfigError::Validation(
            "keywords must contain at least one keyword".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for keyword in &config.keywords {
        if keyword.trim().is_empty() {
            return Err(ConfigError::Validation(
                "keywords cannot contain empty entries".to_string(),
            ));
        }
        if !seen.insert(keyword.as_str()) {
            return Err(ConfigError::Validation(format!(
                "keyword '{}' is listed more than once",
                keyword
            )));
        }
    }

    if config.pages_per_keyword < 1 {
        return Err(ConfigError::Validation(format!(
            "pages_per_keyword must be >= 1, got {}",
            config.pages_per_keyword
        )));
    }

    if config.target_items < 1 {
        return Err(ConfigError::Validation(format!(
            "target_items must be >= 1, got {}",
            config.target_items
        )));
    }

    if config.workers < 1 || config.workers > 16 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 16, got {}",
            config.workers
        )));
    }

    if config.flush_every < 1 {
        return Err(ConfigError::Validation(format!(
            "flush_every must be >= 1, got {}",
            config.flush_every
        )));
    }

    Ok(())
}

/// Validates timeout, retry and delay settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.request_timeout < 1 || config.request_timeout > 300 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be between 1 and 300 seconds, got {}",
            config.request_timeout
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.listing_delay_min > config.listing_delay_max {
        return Err(ConfigError::Validation(format!(
            "listing_delay_min ({}ms) exceeds listing_delay_max ({}ms)",
            config.listing_delay_min, config.listing_delay_max
        )));
    }

    if config.detail_delay_min > config.detail_delay_max {
        return Err(ConfigError::Validation(format!(
            "detail_delay_min ({}ms) exceeds detail_delay_max ({}ms)",
            config.detail_delay_min, config.detail_delay_max
        )));
    }

    // Detail pages are fetched far more often than listing pages
    if config.detail_delay_max > config.listing_delay_max {
        return Err(ConfigError::Validation(format!(
            "detail_delay_max ({}ms) must not exceed listing_delay_max ({}ms)",
            config.detail_delay_max, config.listing_delay_max
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates the site URL templates
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if !config.listing_url.contains("{keyword}") {
        return Err(ConfigError::Validation(format!(
            "listing_url must contain a {{keyword}} placeholder, got '{}'",
            config.listing_url
        )));
    }
    validate_template_url("listing_url", &config.listing_url, "{keyword}")?;

    let needs_detail_template = config.extractor == SiteKind::Occ;
    if needs_detail_template && !config.detail_url.contains("{id}") {
        return Err(ConfigError::Validation(format!(
            "detail_url must contain an {{id}} placeholder, got '{}'",
            config.detail_url
        )));
    }
    if !config.detail_url.is_empty() {
        validate_template_url("detail_url", &config.detail_url, "{id}")?;
    }

    if config.page_param.trim().is_empty() {
        return Err(ConfigError::Validation(
            "page_param cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a template parses as an http(s) URL once its placeholder is filled
fn validate_template_url(name: &str, template: &str, placeholder: &str) -> Result<(), ConfigError> {
    let sample = template.replace(placeholder, "sample");
    let url = Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, template, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, template
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.checkpoint_path.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint_path cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawler_config() -> CrawlerConfig {
        CrawlerConfig {
            keywords: vec!["rrhh".to_string(), "reclutamiento".to_string()],
            pages_per_keyword: 5,
            target_items: 100,
            workers: 1,
            fetch_details: false,
            flush_every: 10,
        }
    }

    #[test]
    fn test_validate_crawler_config() {
        assert!(validate_crawler_config(&crawler_config()).is_ok());

        let mut config = crawler_config();
        config.keywords.clear();
        assert!(validate_crawler_config(&config).is_err());

        let mut config = crawler_config();
        config.keywords.push("rrhh".to_string());
        assert!(validate_crawler_config(&config).is_err());

        let mut config = crawler_config();
        config.pages_per_keyword = 0;
        assert!(validate_crawler_config(&config).is_err());

        let mut config = crawler_config();
        config.workers = 17;
        assert!(validate_crawler_config(&config).is_err());
    }

    #[test]
    fn test_validate_fetch_delays() {
        assert!(validate_fetch_config(&FetchConfig::default()).is_ok());

        let mut config = FetchConfig::default();
        config.listing_delay_min = 5000;
        assert!(validate_fetch_config(&config).is_err());

        let mut config = FetchConfig::default();
        config.detail_delay_max = 4500;
        config.detail_delay_min = 100;
        assert!(validate_fetch_config(&config).is_err());

        let mut config = FetchConfig::default();
        config.max_attempts = 0;
        assert!(validate_fetch_config(&config).is_err());
    }

    #[test]
    fn test_validate_site_templates() {
        let site = SiteConfig {
            extractor: SiteKind::Occ,
            listing_url: "https://www.occ.com.mx/empleos/de-{keyword}/".to_string(),
            page_param: "page".to_string(),
            detail_url: "https://www.occ.com.mx/empleos/empleo-{id}/".to_string(),
            source_tag: "OCC".to_string(),
        };
        assert!(validate_site_config(&site).is_ok());

        let mut missing = site.clone();
        missing.listing_url = "https://www.occ.com.mx/empleos/".to_string();
        assert!(validate_site_config(&missing).is_err());

        let mut bad_scheme = site.clone();
        bad_scheme.detail_url = "ftp://example.com/{id}".to_string();
        assert!(validate_site_config(&bad_scheme).is_err());
    }

    #[test]
    fn test_detail_template_only_required_for_occ() {
        let mut site = SiteConfig {
            extractor: SiteKind::Computrabajo,
            listing_url: "https://mx.computrabajo.com/trabajo-de-{keyword}".to_string(),
            page_param: "p".to_string(),
            detail_url: String::new(),
            source_tag: "Computrabajo".to_string(),
        };
        assert!(validate_site_config(&site).is_ok());

        site.extractor = SiteKind::Occ;
        assert!(validate_site_config(&site).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }
}
