//! Query criteria types and the tag-query parser.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Tag-query token selecting notes without any tag.
pub const UNTAGGED_SENTINEL: &str = "<none>";

const REQUIRED_PREFIX: char = '+';

/// Tag-query parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParseError {
    /// `<none>` appeared together with other tag tokens.
    MixedUntagged(String),
    /// A lone `+` without a tag name.
    EmptyRequiredTag,
}

impl Display for QueryParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MixedUntagged(raw) => write!(
                f,
                "`{UNTAGGED_SENTINEL}` cannot be combined with other tags: `{raw}`"
            ),
            Self::EmptyRequiredTag => write!(f, "required tag marker `+` needs a tag name"),
        }
    }
}

impl Error for QueryParseError {}

/// Parsed tag criteria of a listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TagFilter {
    /// No tag filtering.
    #[default]
    Unfiltered,
    /// Only notes with zero tag associations.
    Untagged,
    /// Any-of and all-of tag sets; at least one of them is non-empty.
    Tags {
        /// Unprefixed tokens: the note needs at least one of them.
        any_of: Vec<String>,
        /// `+`-prefixed tokens: the note needs every one of them.
        all_of: Vec<String>,
    },
}

impl TagFilter {
    /// Parses a space-delimited tag query such as `work home +urgent`.
    pub fn parse(raw: &str) -> Result<Self, QueryParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::Unfiltered);
        }
        if trimmed == UNTAGGED_SENTINEL {
            return Ok(Self::Untagged);
        }

        let mut any_of = Vec::new();
        let mut all_of = Vec::new();
        for token in trimmed.split_whitespace() {
            if token == UNTAGGED_SENTINEL {
                return Err(QueryParseError::MixedUntagged(trimmed.to_string()));
            }
            match token.strip_prefix(REQUIRED_PREFIX) {
                Some("") => return Err(QueryParseError::EmptyRequiredTag),
                Some(name) => push_unique(&mut all_of, name),
                None => push_unique(&mut any_of, token),
            }
        }

        Ok(Self::Tags { any_of, all_of })
    }

    /// Tags that must all be present; checked after the storage phase.
    pub fn required(&self) -> &[String] {
        match self {
            Self::Tags { all_of, .. } => all_of,
            _ => &[],
        }
    }
}

fn push_unique(target: &mut Vec<String>, name: &str) {
    if !target.iter().any(|existing| existing == name) {
        target.push(name.to_string());
    }
}

/// Listing order. The default follows storage-natural id order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoteOrder {
    /// Ascending note id, i.e. creation order.
    #[default]
    Id,
    /// Most recently modified first, ties broken by descending id.
    ModifiedDesc,
}

/// Full listing criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteQuery {
    /// Substring matched against note bodies; empty matches everything.
    pub search: String,
    pub tags: TagFilter,
    pub order: NoteOrder,
}

impl NoteQuery {
    /// Builds criteria from the raw `search` and `tag_query` request fields.
    pub fn parse(search: &str, tag_query: &str) -> Result<Self, QueryParseError> {
        Ok(Self {
            search: search.to_string(),
            tags: TagFilter::parse(tag_query)?,
            order: NoteOrder::default(),
        })
    }

    pub fn with_order(mut self, order: NoteOrder) -> Self {
        self.order = order;
        self
    }

    /// Part of the criteria executed in SQL.
    ///
    /// `<none>` lists every untagged note, so the search text is dropped.
    pub fn storage_filter(&self) -> StorageFilter<'_> {
        let (search, any_of) = match &self.tags {
            TagFilter::Tags { any_of, .. } => (self.search.as_str(), any_of.as_slice()),
            TagFilter::Unfiltered => (self.search.as_str(), &[][..]),
            TagFilter::Untagged => ("", &[][..]),
        };
        StorageFilter {
            search,
            any_of,
            untagged: self.tags == TagFilter::Untagged,
            order: self.order,
        }
    }
}

/// Storage-phase filter handed to the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageFilter<'a> {
    pub search: &'a str,
    /// Note must carry at least one of these tags (ignored when empty).
    pub any_of: &'a [String],
    /// Note must carry no tags at all.
    pub untagged: bool,
    pub order: NoteOrder,
}

impl Default for StorageFilter<'_> {
    fn default() -> Self {
        Self {
            search: "",
            any_of: &[],
            untagged: false,
            order: NoteOrder::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteOrder, NoteQuery, QueryParseError, TagFilter};

    #[test]
    fn empty_query_is_unfiltered() {
        assert_eq!(TagFilter::parse("").unwrap(), TagFilter::Unfiltered);
        assert_eq!(TagFilter::parse("   ").unwrap(), TagFilter::Unfiltered);
    }

    #[test]
    fn none_sentinel_selects_untagged() {
        assert_eq!(TagFilter::parse(" <none> ").unwrap(), TagFilter::Untagged);
    }

    #[test]
    fn none_sentinel_is_exclusive() {
        let err = TagFilter::parse("work <none>").unwrap_err();
        assert!(matches!(err, QueryParseError::MixedUntagged(_)));
    }

    #[test]
    fn splits_required_and_optional_tokens() {
        let parsed = TagFilter::parse("work +urgent home +urgent +Q3").unwrap();
        assert_eq!(
            parsed,
            TagFilter::Tags {
                any_of: vec!["work".to_string(), "home".to_string()],
                all_of: vec!["urgent".to_string(), "Q3".to_string()],
            }
        );
        assert_eq!(parsed.required(), ["urgent".to_string(), "Q3".to_string()]);
    }

    #[test]
    fn lone_plus_is_rejected() {
        assert_eq!(
            TagFilter::parse("work +").unwrap_err(),
            QueryParseError::EmptyRequiredTag
        );
    }

    #[test]
    fn storage_filter_carries_only_sql_criteria() {
        let query = NoteQuery::parse("milk", "+a b")
            .unwrap()
            .with_order(NoteOrder::ModifiedDesc);
        let storage = query.storage_filter();
        assert_eq!(storage.search, "milk");
        assert_eq!(storage.any_of, ["b".to_string()]);
        assert!(!storage.untagged);
        assert_eq!(storage.order, NoteOrder::ModifiedDesc);

        let untagged = NoteQuery::parse("milk", "<none>").unwrap();
        let storage = untagged.storage_filter();
        assert!(storage.untagged);
        assert!(storage.any_of.is_empty());
        assert_eq!(storage.search, "");
    }
}
