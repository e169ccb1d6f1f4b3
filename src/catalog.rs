//! Wordlist catalog data model
//!
//! The catalog maps entry names to their candidate sources and groups entries
//! into ordered categories. Both maps preserve insertion order because the
//! 1-based selection ids handed to the [`resolver`](crate::resolver) index
//! into catalog order.
//!
//! Loading and refreshing the on-disk catalog is the embedding application's
//! job; this module only defines the shapes and [`Catalog::from_json`] for
//! data the caller has already read.

use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Candidate sources for one wordlist entry
///
/// At least one of the two URLs must be non-empty for the entry to be
/// fetchable; the resolver rejects entries where both are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySources {
    /// Plain HTTP source URL (empty string when absent)
    #[serde(default)]
    pub http: String,

    /// Torrent source: a magnet link or a `.torrent` descriptor URL
    /// (empty string when absent)
    #[serde(default)]
    pub torrent: String,
}

/// The full set of known entries and their categories
///
/// Immutable for the duration of a run.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: IndexMap<String, EntrySources>,
    categories: IndexMap<String, Vec<String>>,
}

impl Catalog {
    /// Build a catalog from already-constructed maps
    pub fn new(
        entries: IndexMap<String, EntrySources>,
        categories: IndexMap<String, Vec<String>>,
    ) -> Self {
        Self {
            entries,
            categories,
        }
    }

    /// Parse a catalog from the JSON shapes of `urls.json` and `categories.json`
    ///
    /// `urls_json` is an object of entry name to `{"http": ..., "torrent": ...}`;
    /// `categories_json` is an object of category name to entry-name array.
    /// Key order in the documents becomes catalog order.
    ///
    /// # Example
    ///
    /// ```
    /// use wordlist_dl::Catalog;
    ///
    /// let catalog = Catalog::from_json(
    ///     r#"{"rockyou": {"http": "http://x/rockyou.txt.gz", "torrent": ""}}"#,
    ///     r#"{"passwords": ["rockyou"]}"#,
    /// ).unwrap();
    /// assert_eq!(catalog.len(), 1);
    /// ```
    pub fn from_json(urls_json: &str, categories_json: &str) -> Result<Self> {
        let entries: IndexMap<String, EntrySources> = serde_json::from_str(urls_json)?;
        let categories: IndexMap<String, Vec<String>> = serde_json::from_str(categories_json)?;
        Ok(Self {
            entries,
            categories,
        })
    }

    /// Look up an entry's sources by name
    pub fn entry(&self, name: &str) -> Option<&EntrySources> {
        self.entries.get(name)
    }

    /// All entry names in catalog order
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Ordered entry names of a category, if it exists
    pub fn category(&self, name: &str) -> Option<&[String]> {
        self.categories.get(name).map(Vec::as_slice)
    }

    /// All category names in catalog order
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// First category (in catalog order) containing the entry
    ///
    /// Entries may belong to several categories; directory placement honors
    /// only the first match.
    pub fn category_of(&self, entry_name: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == entry_name))
            .map(|(name, _)| name.as_str())
    }

    /// Number of entries in the catalog
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
