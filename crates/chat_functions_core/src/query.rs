//! Store-agnostic collection queries.
//!
//! A [`CollectionQuery`] is evaluated locally with [`CollectionQuery::matches`]
//! and rendered for the REST `runQuery` endpoint with
//! [`CollectionQuery::to_run_query_request`]. Only top-level field paths are
//! supported.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::document::{Document, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equal { field: String, value: Value },
    NotNull { field: String },
    LessThanOrEqual { field: String, value: Value },
}

impl Filter {
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::Equal { field, value } => document.get(field) == Some(value),
            // Documents without the field are excluded, like the store does.
            Self::NotNull { field } => document.get(field).is_some_and(|value| !value.is_null()),
            Self::LessThanOrEqual { field, value } => document
                .get(field)
                .and_then(|candidate| candidate.compare_same_kind(value))
                .is_some_and(|ordering| ordering != Ordering::Greater),
        }
    }

    fn to_wire(&self) -> WireFilter {
        match self {
            Self::Equal { field, value } => WireFilter::FieldFilter(FieldFilter {
                field: FieldReference::new(field),
                op: "EQUAL".to_string(),
                value: value.clone(),
            }),
            Self::NotNull { field } => WireFilter::UnaryFilter(UnaryFilter {
                op: "IS_NOT_NULL".to_string(),
                field: FieldReference::new(field),
            }),
            Self::LessThanOrEqual { field, value } => WireFilter::FieldFilter(FieldFilter {
                field: FieldReference::new(field),
                op: "LESS_THAN_OR_EQUAL".to_string(),
                value: value.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    pub collection: String,
    pub filters: Vec<Filter>,
}

impl CollectionQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
        }
    }

    pub fn where_equal(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filters.push(Filter::Equal {
            field: field.into(),
            value,
        });
        self
    }

    pub fn where_not_null(mut self, field: impl Into<String>) -> Self {
        self.filters.push(Filter::NotNull {
            field: field.into(),
        });
        self
    }

    pub fn where_less_than_or_equal(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filters.push(Filter::LessThanOrEqual {
            field: field.into(),
            value,
        });
        self
    }

    /// True when the document's collection matches and every filter holds.
    pub fn matches(&self, document: &Document) -> bool {
        crate::collections::collection_from_name(&document.name) == Some(self.collection.as_str())
            && self.filters.iter().all(|filter| filter.matches(document))
    }

    pub fn to_run_query_request(&self) -> RunQueryRequest {
        let mut filters: Vec<WireFilter> = self.filters.iter().map(Filter::to_wire).collect();
        let where_clause = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(WireFilter::CompositeFilter(CompositeFilter {
                op: "AND".to_string(),
                filters,
            })),
        };

        RunQueryRequest {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: self.collection.clone(),
                }],
                where_clause,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<WireFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum WireFilter {
    CompositeFilter(CompositeFilter),
    FieldFilter(FieldFilter),
    UnaryFilter(UnaryFilter),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositeFilter {
    pub op: String,
    pub filters: Vec<WireFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnaryFilter {
    pub op: String,
    pub field: FieldReference,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

impl FieldReference {
    fn new(field_path: &str) -> Self {
        Self {
            field_path: field_path.to_string(),
        }
    }
}

/// One element of the streamed `runQuery` response array. Elements that only
/// report progress carry no document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponseItem {
    #[serde(default)]
    pub document: Option<Document>,
}
