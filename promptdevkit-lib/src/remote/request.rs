//! Query-builder requests for reads against the remote source.
//!
//! A [`ReadRequest`] only composes column selection, filter predicates, ordering and
//! a limit. It renders to the query pairs understood by the REST endpoint and is
//! evaluated directly by [`super::MemorySource`].

use core::fmt::{Display, Formatter, Result as FmtResult};

/// Comparison operator of a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// `IS` comparison, used with `null`.
    Is,
}

impl FilterOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Is => "is",
        }
    }
}

/// A single `column <op> value` predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

/// Sort direction for an ordering clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// A filtered, projected read against one table or view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadRequest {
    table: String,
    columns: Vec<String>,
    filters: Vec<Filter>,
    order: Vec<Order>,
    limit: Option<usize>,
}

impl ReadRequest {
    /// Start a read of every column of `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Restrict the read to the given columns.
    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn filter(mut self, column: impl Into<String>, op: FilterOp, value: impl Display) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            op,
            value: value.to_string(),
        });
        self
    }

    #[must_use]
    pub fn eq(self, column: impl Into<String>, value: impl Display) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    #[must_use]
    pub fn neq(self, column: impl Into<String>, value: impl Display) -> Self {
        self.filter(column, FilterOp::Neq, value)
    }

    #[must_use]
    pub fn gt(self, column: impl Into<String>, value: impl Display) -> Self {
        self.filter(column, FilterOp::Gt, value)
    }

    #[must_use]
    pub fn gte(self, column: impl Into<String>, value: impl Display) -> Self {
        self.filter(column, FilterOp::Gte, value)
    }

    #[must_use]
    pub fn lt(self, column: impl Into<String>, value: impl Display) -> Self {
        self.filter(column, FilterOp::Lt, value)
    }

    #[must_use]
    pub fn lte(self, column: impl Into<String>, value: impl Display) -> Self {
        self.filter(column, FilterOp::Lte, value)
    }

    #[must_use]
    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.filter(column, FilterOp::Is, "null")
    }

    #[must_use]
    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push(Order {
            column: column.into(),
            direction,
        });
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[must_use]
    pub fn ordering(&self) -> &[Order] {
        &self.order
    }

    #[must_use]
    pub const fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Render the request as REST query pairs (`select=..`, `col=op.value`, `order=..`, `limit=..`).
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 3);

        let select = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        pairs.push(("select".to_string(), select));

        for filter in &self.filters {
            pairs.push((filter.column.clone(), format!("{}.{}", filter.op.as_str(), filter.value)));
        }

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| match o.direction {
                    Direction::Asc => format!("{}.asc", o.column),
                    Direction::Desc => format!("{}.desc", o.column),
                })
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("order".to_string(), order));
        }

        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }
}

impl Display for ReadRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.table)?;
        for (i, (name, value)) in self.to_query_pairs().iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{name}={value}")?;
        }
        Ok(())
    }
}
