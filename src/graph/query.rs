//! Structured `OData` query construction for Graph collection requests.
//!
//! Values are escaped per clause (`''` inside `$filter` literals, `\"` inside
//! `$search` phrases) and percent-encoded when the URL is rendered, so user
//! input never alters the shape of the query.

use url::Url;

use crate::domain::types::GroupId;
use crate::graph::{ConsistencyLevel, GraphResult};

/// Collection a listing request is issued against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Collection {
    /// `/users`, every user in the tenant.
    Users,
    /// `/groups/{id}/members`
    GroupMembers(GroupId),
    /// `/groups`, offered by the group selector.
    Groups,
}

impl Collection {
    /// Path relative to the versioned Graph endpoint.
    pub fn path(&self) -> String {
        match self {
            Collection::Users => "users".to_string(),
            Collection::GroupMembers(group) => format!("groups/{group}/members"),
            Collection::Groups => "groups".to_string(),
        }
    }
}

/// One `property:value` phrase of a `$search` clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchTerm {
    pub property: &'static str,
    pub value: String,
}

impl SearchTerm {
    pub fn new(property: &'static str, value: impl Into<String>) -> Self {
        Self {
            property,
            value: value.into(),
        }
    }

    fn render(&self) -> String {
        let escaped = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}:{}\"", self.property, escaped)
    }
}

/// Boolean expression of a `$filter` clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterExpr {
    /// `property eq 'value'`
    Eq {
        property: &'static str,
        value: String,
    },
    /// Operands joined with `and`.
    And(Vec<FilterExpr>),
}

impl FilterExpr {
    pub fn equals(property: &'static str, value: impl Into<String>) -> Self {
        FilterExpr::Eq {
            property,
            value: value.into(),
        }
    }

    pub fn render(&self) -> String {
        match self {
            FilterExpr::Eq { property, value } => {
                format!("{property} eq '{}'", value.replace('\'', "''"))
            }
            FilterExpr::And(operands) => operands
                .iter()
                .map(|operand| match operand {
                    FilterExpr::And(_) => format!("({})", operand.render()),
                    FilterExpr::Eq { .. } => operand.render(),
                })
                .collect::<Vec<_>>()
                .join(" and "),
        }
    }
}

/// A single system query option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryClause {
    /// `$search`, phrases joined with `OR`.
    Search(Vec<SearchTerm>),
    /// `$filter`
    Filter(FilterExpr),
    /// `$top`
    Top(usize),
    /// `$select`
    Select(Vec<&'static str>),
    /// `$count=true`
    Count,
}

impl QueryClause {
    /// Query parameter name including the `$` prefix.
    pub fn key(&self) -> &'static str {
        match self {
            QueryClause::Search(_) => "$search",
            QueryClause::Filter(_) => "$filter",
            QueryClause::Top(_) => "$top",
            QueryClause::Select(_) => "$select",
            QueryClause::Count => "$count",
        }
    }

    /// Unencoded query parameter value.
    pub fn value(&self) -> String {
        match self {
            QueryClause::Search(terms) => terms
                .iter()
                .map(SearchTerm::render)
                .collect::<Vec<_>>()
                .join(" OR "),
            QueryClause::Filter(expr) => expr.render(),
            QueryClause::Top(top) => top.to_string(),
            QueryClause::Select(fields) => fields.join(","),
            QueryClause::Count => "true".to_string(),
        }
    }
}

/// Collection request under construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphQuery {
    collection: Collection,
    clauses: Vec<QueryClause>,
}

impl GraphQuery {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            clauses: Vec::new(),
        }
    }

    /// Searches every property for the same text.
    pub fn search_any(mut self, properties: &[&'static str], text: &str) -> Self {
        let terms = properties
            .iter()
            .map(|property| SearchTerm::new(*property, text))
            .collect();
        self.clauses.push(QueryClause::Search(terms));
        self
    }

    /// Adds a filter, combining it with an existing one using `and`.
    pub fn filter(mut self, expr: FilterExpr) -> Self {
        let existing = self
            .clauses
            .iter()
            .position(|clause| matches!(clause, QueryClause::Filter(_)));

        match existing {
            Some(index) => {
                if let QueryClause::Filter(current) = self.clauses.remove(index) {
                    let operands = match current {
                        FilterExpr::And(mut operands) => {
                            operands.push(expr);
                            operands
                        }
                        single => vec![single, expr],
                    };
                    self.clauses
                        .insert(index, QueryClause::Filter(FilterExpr::And(operands)));
                }
            }
            None => self.clauses.push(QueryClause::Filter(expr)),
        }
        self
    }

    pub fn top(mut self, top: usize) -> Self {
        self.clauses.push(QueryClause::Top(top));
        self
    }

    pub fn select(mut self, fields: &[&'static str]) -> Self {
        self.clauses.push(QueryClause::Select(fields.to_vec()));
        self
    }

    pub fn count(mut self) -> Self {
        self.clauses.push(QueryClause::Count);
        self
    }

    /// `$search` and `$count` are advanced queries that need
    /// `ConsistencyLevel: eventual`.
    pub fn requires_eventual_consistency(&self) -> bool {
        self.clauses
            .iter()
            .any(|clause| matches!(clause, QueryClause::Search(_) | QueryClause::Count))
    }

    /// Header value every request of this query, continuations included, is sent with.
    pub fn consistency_level(&self) -> ConsistencyLevel {
        if self.requires_eventual_consistency() {
            ConsistencyLevel::Eventual
        } else {
            ConsistencyLevel::Default
        }
    }

    /// Unencoded `(key, value)` pairs in clause order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        self.clauses
            .iter()
            .map(|clause| (clause.key(), clause.value()))
            .collect()
    }

    /// Renders the absolute request URL against a versioned Graph endpoint.
    pub fn to_url(&self, graph_url: &str) -> GraphResult<Url> {
        let base = format!(
            "{}/{}",
            graph_url.trim_end_matches('/'),
            self.collection.path()
        );
        let mut url = Url::parse(&base)?;
        if !self.clauses.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in self.params() {
                pairs.append_pair(key, &value);
            }
        }
        Ok(url)
    }
}
