//! Normalizes the `company_domain` column, which arrives as a bare domain or a website URL.

use crate::core::error::{AppError, Result};
use url::Url;

/// Extracts the base domain name (e.g., "example.com") from a given URL or domain string.
///
/// Handles common variations:
/// - Adds `https://` scheme if missing.
/// - Extracts the host (dropping path, query and port).
/// - Removes the `www.` prefix.
/// - Converts to lowercase.
///
/// Returns `Err(AppError::DomainExtraction)` if the input is empty or no plausible host remains.
pub(crate) fn get_domain_from_url(website_url_or_domain: &str) -> Result<String> {
    let trimmed_input = website_url_or_domain.trim();
    if trimmed_input.is_empty() {
        return Err(AppError::DomainExtraction(
            "Input string is empty".to_string(),
        ));
    }

    let url_str_with_scheme = if !trimmed_input.contains("://") {
        format!("https://{}", trimmed_input)
    } else {
        trimmed_input.to_string()
    };

    let host = match Url::parse(&url_str_with_scheme) {
        Ok(parsed_url) => parsed_url
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::DomainExtraction(format!(
                    "Could not extract host from parsed URL: {}",
                    parsed_url
                ))
            })?,
        Err(e) => {
            if !trimmed_input.contains('/')
                && trimmed_input.contains('.')
                && !trimmed_input.starts_with('.')
                && !trimmed_input.ends_with('.')
            {
                tracing::warn!(target: "lead_task",
                    "Input '{}' failed URL parsing but looks like a domain, attempting direct use.",
                    trimmed_input
                );
                trimmed_input.to_string()
            } else {
                return Err(AppError::UrlParse(e));
            }
        }
    };

    let domain = host.strip_prefix("www.").unwrap_or(&host).to_lowercase();

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(AppError::DomainExtraction(format!(
            "Extracted domain appears invalid: {}",
            domain
        )));
    }

    tracing::trace!(target: "lead_task", "Normalized domain '{}' -> '{}'", trimmed_input, domain);
    Ok(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_domain_from_url_valid() {
        assert_eq!(get_domain_from_url("acme.com").unwrap(), "acme.com");
        assert_eq!(
            get_domain_from_url("https://www.acme.com").unwrap(),
            "acme.com"
        );
        assert_eq!(get_domain_from_url("http://acme.com").unwrap(), "acme.com");
        assert_eq!(get_domain_from_url("www.Acme.com").unwrap(), "acme.com");
        assert_eq!(
            get_domain_from_url("https://ACME.com/about?ref=1").unwrap(),
            "acme.com"
        );
        assert_eq!(
            get_domain_from_url("http://acme.com:8080").unwrap(),
            "acme.com"
        );
        assert_eq!(
            get_domain_from_url(" sub.acme.co.uk ").unwrap(),
            "sub.acme.co.uk"
        );
    }

    #[test]
    fn test_get_domain_from_url_invalid() {
        assert!(get_domain_from_url("").is_err());
        assert!(get_domain_from_url("   ").is_err());
        assert!(get_domain_from_url("https://").is_err());
        assert!(get_domain_from_url("www.").is_err());
        assert!(get_domain_from_url(".com").is_err());
        assert!(get_domain_from_url("acme").is_err());
        assert!(get_domain_from_url("https://acme.").is_err());
    }
}
