//! Identifier-to-endpoint resolution against the storage service.
//!
//! Each identifier maps to a fixed per-identifier path on the storage
//! frontend; the frontend redirects to the node actually holding the bucket,
//! and the final redirect target becomes the endpoint for the rest of the
//! run.

use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Url;

use crate::error::{Error, Result};

const DEFAULT_STORAGE_BASE: &str = "https://s3.us.archive.org";

/// Resolved base address serving one identifier's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Wraps a resolved URL, normalizing it to end with a slash so that
    /// file keys join as path segments.
    #[must_use]
    pub fn new(mut url: Url) -> Self {
        if !url.path().ends_with('/') {
            url.set_path(&format!("{}/", url.path()));
        }
        Self { url }
    }

    /// The endpoint's base URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// URL of one file under this endpoint. Spaces and other reserved
    /// characters in the key are percent-encoded by the join.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the key does not form a valid URL path.
    pub fn file_url(&self, key: &str) -> Result<Url> {
        self.url
            .join(key)
            .map_err(|e| Error::Parse(format!("bad file key '{key}': {e}")))
    }
}

/// Extracts the `<Code>` element text from an S3-style XML error document.
fn parse_error_code(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_code = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"Code" => in_code = true,
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Code" => in_code = false,
            Ok(Event::Text(ref e)) if in_code => {
                return Some(String::from_utf8_lossy(e.as_ref()).trim().to_string());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}

/// Resolves identifiers to their storage endpoints.
pub struct EndpointResolver {
    http: reqwest::Client,
    base_url: String,
}

impl EndpointResolver {
    /// Creates a resolver against the production storage frontend.
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, DEFAULT_STORAGE_BASE)
    }

    /// Creates a resolver against a custom base URL (used in tests).
    #[must_use]
    pub fn with_base_url(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolves one identifier, following redirects to the canonical
    /// storage endpoint.
    ///
    /// Classification is total: every status/body combination maps to
    /// exactly one of endpoint, `IdentifierNotFound`, `Status` or `Http`.
    /// All failures are terminal for the identifier.
    ///
    /// # Errors
    ///
    /// - [`Error::IdentifierNotFound`] on a 403 whose body carries the
    ///   `NoSuchBucket` error code.
    /// - [`Error::Status`] on any other non-success status.
    /// - [`Error::Http`] on transport failure.
    pub async fn resolve(&self, identifier: &str) -> Result<Endpoint> {
        let url = format!("{}/{}/", self.base_url, identifier);
        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(Endpoint::new(response.url().clone()));
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            if parse_error_code(&body).as_deref() == Some("NoSuchBucket") {
                return Err(Error::IdentifierNotFound {
                    identifier: identifier.to_string(),
                });
            }
        }

        Err(Error::Status {
            status: status.as_u16(),
            context: "resolving identifier",
        })
    }
}
