//! Paginated discovery of an account's identifiers via the search endpoint.

use serde::Deserialize;

use crate::error::{Error, Result};

const DEFAULT_SEARCH_BASE: &str = "https://archive.org/services/search/beta/page_production/";

/// An archive.org account, identified by its case-folded username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    username: String,
}

impl Account {
    /// Creates an account from a raw username, trimming and lower-casing it.
    #[must_use]
    pub fn new(username: &str) -> Self {
        Self {
            username: username.trim().to_lowercase(),
        }
    }

    /// The case-folded username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The `page_target` form used by the search endpoint.
    #[must_use]
    pub fn page_target(&self) -> String {
        format!("@{}", self.username)
    }
}

// Shape of the search response down to the identifier field. Everything the
// tool does not read is left out; serde ignores unknown keys.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: ResponseBody,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    body: PageBody,
}

#[derive(Debug, Deserialize)]
struct PageBody {
    page_elements: PageElements,
}

#[derive(Debug, Deserialize)]
struct PageElements {
    uploads: Uploads,
}

#[derive(Debug, Deserialize)]
struct Uploads {
    hits: HitsWrapper,
}

#[derive(Debug, Deserialize)]
struct HitsWrapper {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    fields: HitFields,
}

#[derive(Debug, Deserialize)]
struct HitFields {
    identifier: String,
}

/// Result of draining the catalog for one account.
///
/// Enumeration is not restartable: a page failure ends it early, keeping
/// whatever was collected and recording the error.
#[derive(Debug)]
pub struct Enumeration {
    /// Identifiers in page-then-within-page order.
    pub identifiers: Vec<String>,
    /// The error that ended enumeration early, if any.
    pub error: Option<Error>,
}

impl Enumeration {
    /// True when enumeration failed before collecting anything — the run
    /// cannot proceed at all.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.identifiers.is_empty() && self.error.is_some()
    }
}

/// Client for the account search endpoint.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    hits_per_page: u32,
}

impl CatalogClient {
    /// Creates a catalog client against the production search endpoint.
    #[must_use]
    pub fn new(http: reqwest::Client, hits_per_page: u32) -> Self {
        Self::with_base_url(http, DEFAULT_SEARCH_BASE, hits_per_page)
    }

    /// Creates a catalog client against a custom base URL (used in tests).
    #[must_use]
    pub fn with_base_url(http: reqwest::Client, base_url: &str, hits_per_page: u32) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            hits_per_page,
        }
    }

    /// Fetches one page of the account's uploads.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// response body that does not match the expected JSON shape.
    pub async fn fetch_page(&self, account: &Account, page: u32) -> Result<Vec<String>> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("user_query", ""),
                ("page_type", "account_details"),
                ("page_target", &account.page_target()),
                ("page_elements", "[\"uploads\"]"),
                ("hits_per_page", &self.hits_per_page.to_string()),
                ("page", &page.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                context: "fetching catalog page",
            });
        }

        let body = response.text().await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| Error::Parse(e.to_string()))?;

        Ok(parsed
            .response
            .body
            .page_elements
            .uploads
            .hits
            .hits
            .into_iter()
            .map(|hit| hit.fields.identifier)
            .collect())
    }

    /// Drains every page for the account, starting at page 1.
    ///
    /// An empty page terminates enumeration; a failed page ends it early
    /// with the identifiers collected so far.
    pub async fn enumerate(&self, account: &Account) -> Enumeration {
        let mut identifiers = Vec::new();
        let mut page = 1;
        loop {
            match self.fetch_page(account, page).await {
                Ok(batch) => {
                    if batch.is_empty() {
                        return Enumeration {
                            identifiers,
                            error: None,
                        };
                    }
                    log::info!("catalog page {page}: {} identifier(s)", batch.len());
                    identifiers.extend(batch);
                    page += 1;
                }
                Err(e) => {
                    log::warn!("catalog page {page} failed, ending enumeration early: {e}");
                    return Enumeration {
                        identifiers,
                        error: Some(e),
                    };
                }
            }
        }
    }
}
