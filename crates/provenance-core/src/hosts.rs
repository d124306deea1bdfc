//! Hostname and URL predicates used for strategy selection.

/// Domains serving Word for the web.
pub const WORD_DOMAINS: &[&str] = &[
    "office.com",
    "officeapps.live.com",
    "sharepoint.com",
    "live.com",
    "microsoft.com",
];

pub const GOOGLE_DOCS_DOMAIN: &str = "docs.google.com";

pub fn is_word_host(hostname: &str) -> bool {
    WORD_DOMAINS.iter().any(|domain| hostname.contains(domain))
}

pub fn is_google_docs_host(hostname: &str) -> bool {
    hostname.contains(GOOGLE_DOCS_DOMAIN)
}

/// Word selection mapping only works on the editing hosts themselves.
pub fn word_tracks_selection(url: &str) -> bool {
    url.contains("office.com") || url.contains("officeapps.live.com")
}

pub fn docs_tracks_selection(url: &str) -> bool {
    url.contains("docs.google.com/document")
}

/// Whether clipboard content from `source_url` came from another site.
///
/// A record without a URL is never external.
pub fn is_external_source(source_url: &str, hostname: &str) -> bool {
    !source_url.is_empty() && !source_url.contains(hostname)
}
