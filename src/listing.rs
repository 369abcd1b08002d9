//! Bucket-listing retrieval and parsing.
//!
//! The storage endpoint serves an S3-compatible XML document enumerating the
//! bucket's objects. The parser is pure; [`FileLister`] couples it to the
//! HTTP fetch.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::resolve::Endpoint;

/// One object in a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Object key as reported by the listing.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
}

/// The files discovered for one identifier, in listing order, plus their
/// aggregate size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    /// Entries in the order the listing reported them.
    pub entries: Vec<FileEntry>,
    /// Sum of all entry sizes.
    pub total_size: u64,
}

impl FileSet {
    /// Number of files in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the identifier has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses an S3-style `ListBucketResult` document into a [`FileSet`].
///
/// A truncated listing (`<IsTruncated>true</IsTruncated>`) is an error in
/// its own right: treating it as complete would silently drop files, and
/// treating it as empty would hide the inconsistency.
///
/// # Errors
///
/// - [`Error::Parse`] on malformed XML or a non-numeric size.
/// - [`Error::PartialListing`] when the listing is truncated.
pub fn parse_listing(xml: &str) -> Result<FileSet> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut total_size: u64 = 0;
    let mut truncated = false;

    let mut in_contents = false;
    let mut in_key = false;
    let mut in_size = false;
    let mut in_truncated = false;
    let mut key: Option<String> = None;
    let mut size: Option<u64> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"ListBucketResult" => saw_root = true,
                b"Contents" => in_contents = true,
                b"Key" if in_contents => in_key = true,
                b"Size" if in_contents => in_size = true,
                b"IsTruncated" => in_truncated = true,
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"Contents" => {
                    if let (Some(key), Some(size)) = (key.take(), size.take()) {
                        total_size += size;
                        entries.push(FileEntry { key, size });
                    }
                    in_contents = false;
                }
                b"Key" => in_key = false,
                b"Size" => in_size = false,
                b"IsTruncated" => in_truncated = false,
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).trim().to_string();
                if in_key {
                    key = Some(text);
                } else if in_size {
                    size = Some(
                        text.parse()
                            .map_err(|_| Error::Parse(format!("bad size '{text}' in listing")))?,
                    );
                } else if in_truncated && text.eq_ignore_ascii_case("true") {
                    truncated = true;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("malformed listing XML: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(Error::Parse("not a bucket listing document".to_string()));
    }
    if truncated {
        return Err(Error::PartialListing);
    }

    Ok(FileSet {
        entries,
        total_size,
    })
}

/// Fetches and parses the bucket listing for a resolved endpoint.
pub struct FileLister {
    http: reqwest::Client,
}

impl FileLister {
    /// Creates a lister sharing the run's HTTP client.
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Lists every file under the endpoint.
    ///
    /// An identifier with no files yields an `Ok` empty set; a failed or
    /// malformed listing is an error, never silently empty.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, a
    /// malformed body, or a truncated listing.
    pub async fn list(&self, endpoint: &Endpoint) -> Result<FileSet> {
        let response = self.http.get(endpoint.url().clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                context: "listing files",
            });
        }
        let body = response.text().await?;
        parse_listing(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(contents: &str) -> String {
        format!(
            "<?xml version='1.0' encoding='UTF-8'?>\
             <ListBucketResult><Name>bucket</Name>{contents}</ListBucketResult>"
        )
    }

    #[test]
    fn sums_entry_sizes() {
        let xml = listing(
            "<Contents><Key>a.txt</Key><Size>100</Size></Contents>\
             <Contents><Key>b.bin</Key><Size>250</Size></Contents>",
        );
        let set = parse_listing(&xml).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.total_size, 350);
        assert_eq!(set.entries[0].key, "a.txt");
        assert_eq!(set.entries[1].size, 250);
    }

    #[test]
    fn empty_listing_is_ok_and_empty() {
        let set = parse_listing(&listing("")).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.total_size, 0);
    }

    #[test]
    fn preserves_listing_order() {
        let xml = listing(
            "<Contents><Key>z</Key><Size>1</Size></Contents>\
             <Contents><Key>a</Key><Size>2</Size></Contents>\
             <Contents><Key>m</Key><Size>3</Size></Contents>",
        );
        let keys: Vec<_> = parse_listing(&xml)
            .unwrap()
            .entries
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn truncated_listing_is_distinct_from_empty() {
        let xml = listing(
            "<IsTruncated>true</IsTruncated>\
             <Contents><Key>a</Key><Size>1</Size></Contents>",
        );
        assert!(matches!(parse_listing(&xml), Err(Error::PartialListing)));
    }

    #[test]
    fn untruncated_flag_is_accepted() {
        let xml = listing(
            "<IsTruncated>false</IsTruncated>\
             <Contents><Key>a</Key><Size>1</Size></Contents>",
        );
        assert_eq!(parse_listing(&xml).unwrap().len(), 1);
    }

    #[test]
    fn non_listing_document_is_a_parse_error() {
        assert!(matches!(
            parse_listing("<Error><Code>AccessDenied</Code></Error>"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn bad_size_is_a_parse_error() {
        let xml = listing("<Contents><Key>a</Key><Size>lots</Size></Contents>");
        assert!(matches!(parse_listing(&xml), Err(Error::Parse(_))));
    }

    #[test]
    fn keys_with_spaces_survive_parsing() {
        let xml = listing("<Contents><Key>my file.txt</Key><Size>5</Size></Contents>");
        let set = parse_listing(&xml).unwrap();
        assert_eq!(set.entries[0].key, "my file.txt");
    }
}
