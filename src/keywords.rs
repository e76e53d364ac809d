//! Case-insensitive substring keyword filtering over record fields.

use crate::data::FieldLookup;
use crate::types::Keyword;

/// Whether keyword matches are dropped or kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeywordPolicy {
    /// Keep only records with no matching field.
    Exclude,
    /// Keep only records with at least one matching field.
    Select,
}

/// Keywords normalized once (trimmed, lowercased) for repeated matching.
#[derive(Clone, Debug)]
pub struct KeywordMatcher {
    keywords: Vec<Keyword>,
}

impl KeywordMatcher {
    /// Normalize `keywords` for matching.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|keyword| normalize(keyword.as_ref()))
                .collect(),
        }
    }

    /// True when no keywords were given.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// True if any inspected field contains any keyword. Absent fields are skipped.
    pub fn matches<R, F>(&self, record: &R, fields: &[F]) -> bool
    where
        R: FieldLookup,
        F: AsRef<str>,
    {
        fields.iter().any(|field| {
            record.field_text(field.as_ref()).is_some_and(|value| {
                let value = normalize(&value);
                self.keywords
                    .iter()
                    .any(|keyword| value.contains(keyword.as_str()))
            })
        })
    }

    /// Apply `policy` to `records`, preserving order.
    pub fn apply<R, F>(&self, records: Vec<R>, fields: &[F], policy: KeywordPolicy) -> Vec<R>
    where
        R: FieldLookup,
        F: AsRef<str>,
    {
        records
            .into_iter()
            .filter(|record| {
                let matched = self.matches(record, fields);
                match policy {
                    KeywordPolicy::Exclude => !matched,
                    KeywordPolicy::Select => matched,
                }
            })
            .collect()
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Drop records where any of `fields` contains any of `keywords`.
///
/// Callers holding an empty keyword list skip the call entirely; see
/// [`crate::filter::filter_url_records`].
pub fn exclude_with_keywords<R, F, S>(records: Vec<R>, fields: &[F], keywords: &[S]) -> Vec<R>
where
    R: FieldLookup,
    F: AsRef<str>,
    S: AsRef<str>,
{
    KeywordMatcher::new(keywords).apply(records, fields, KeywordPolicy::Exclude)
}

/// Keep only records where any of `fields` contains any of `keywords`.
pub fn select_with_keywords<R, F, S>(records: Vec<R>, fields: &[F], keywords: &[S]) -> Vec<R>
where
    R: FieldLookup,
    F: AsRef<str>,
    S: AsRef<str>,
{
    KeywordMatcher::new(keywords).apply(records, fields, KeywordPolicy::Select)
}
