//! Search and sort over folder listings.
//!
//! [`filter_and_sort`] is a pure function of its inputs and is called on every
//! page render with the `q` and `sort` query parameters.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Comparison, Folder};
use crate::natural::natural_cmp;

/// Anything that can appear in a searchable listing.
pub trait Listable {
    fn display_name(&self) -> &str;

    fn created_time(&self) -> Option<DateTime<Utc>>;

    /// Extra labels matched by the search box (revision labels on comparisons).
    fn search_labels(&self) -> [Option<&str>; 2] {
        [None, None]
    }
}

impl Listable for Folder {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn created_time(&self) -> Option<DateTime<Utc>> {
        self.created_time
    }
}

impl Listable for Comparison {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn created_time(&self) -> Option<DateTime<Utc>> {
        self.created_time
    }

    fn search_labels(&self) -> [Option<&str>; 2] {
        [self.rev_a.as_deref(), self.rev_b.as_deref()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    #[serde(rename = "a-z")]
    AZ,
    #[serde(rename = "z-a")]
    ZA,
    #[default]
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "oldest")]
    Oldest,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Newest, SortKey::Oldest, SortKey::AZ, SortKey::ZA];

    /// Parse a query-string value, falling back to the default for anything unknown.
    pub fn from_query(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::AZ => "a-z",
            SortKey::ZA => "z-a",
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::AZ => "Name (A-Z)",
            SortKey::ZA => "Name (Z-A)",
            SortKey::Newest => "Newest first",
            SortKey::Oldest => "Oldest first",
        }
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a-z" => Ok(SortKey::AZ),
            "z-a" => Ok(SortKey::ZA),
            "newest" => Ok(SortKey::Newest),
            "oldest" => Ok(SortKey::Oldest),
            _ => Err(anyhow::anyhow!("Invalid sort key: {}", s)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip a trailing file extension (`Plant 7.pdf` -> `Plant 7`).
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && !ext.contains(['/', ' ']) => {
            stem
        }
        _ => name,
    }
}

fn matches_query<T: Listable>(item: &T, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let hit = |s: &str| s.to_lowercase().contains(needle);
    hit(item.display_name()) || item.search_labels().into_iter().flatten().any(hit)
}

fn cmp_names<T: Listable>(a: &T, b: &T) -> Ordering {
    natural_cmp(strip_extension(a.display_name()), strip_extension(b.display_name()))
        .then_with(|| a.display_name().cmp(b.display_name()))
}

/// Dated items first (in the requested direction), undated ones after by name.
/// Undated items stay A-Z even under `newest`, so the order stays total.
fn cmp_dates<T: Listable>(a: &T, b: &T, newest_first: bool) -> Ordering {
    match (a.created_time(), b.created_time()) {
        (Some(x), Some(y)) => {
            let by_name = cmp_names(a, b);
            let ord = x.cmp(&y).then(by_name);
            if newest_first {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => cmp_names(a, b),
    }
}

/// Filter `items` by `query` (case-insensitive substring of the name or a
/// revision label) and order them by `sort`.
pub fn filter_and_sort<T>(items: &[T], query: &str, sort: SortKey) -> Vec<T>
where
    T: Listable + Clone,
{
    let needle = query.trim().to_lowercase();
    let mut out: Vec<T> = items
        .iter()
        .filter(|item| matches_query(*item, &needle))
        .cloned()
        .collect();

    out.sort_by(|a, b| match sort {
        SortKey::AZ => cmp_names(a, b),
        SortKey::ZA => cmp_names(b, a),
        SortKey::Newest => cmp_dates(a, b, true),
        SortKey::Oldest => cmp_dates(a, b, false),
    });
    out
}
