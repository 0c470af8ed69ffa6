//! An in-memory remote source.

use super::{ApiError, Direction, Filter, FilterOp, QueryError, ReadRequest, RemoteSource};
use core::cmp::Ordering;
use core::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

const LOG_TARGET: &str = "    memory";

type Procedure = Arc<dyn Fn(Value) -> Result<Value, QueryError> + Send + Sync>;

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    procedures: HashMap<String, Procedure>,
    failures: HashMap<String, QueryError>,
}

/// A [`RemoteSource`] over in-memory JSON rows.
///
/// Filters, ordering and limits are evaluated the way the service evaluates them:
/// values compare numerically when both sides are numbers and as text otherwise, `null`
/// never satisfies a comparison other than `is.null`, and nulls sort last in ascending
/// order.
#[derive(Default)]
pub struct MemorySource {
    state: Mutex<State>,
    calls: AtomicUsize,
}

impl core::fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.lock();
        f.debug_struct("MemorySource")
            .field("tables", &state.tables.keys().collect::<Vec<_>>())
            .field("procedures", &state.procedures.keys().collect::<Vec<_>>())
            .field("calls", &self.calls.load(AtomicOrdering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows of `table`.
    #[must_use]
    pub fn with_table(self, table: impl Into<String>, rows: Vec<Value>) -> Self {
        self.set_table(table, rows);
        self
    }

    /// Register a procedure handler.
    #[must_use]
    pub fn with_procedure<F>(self, function: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Result<Value, QueryError> + Send + Sync + 'static,
    {
        let _ = self.lock().procedures.insert(function.into(), Arc::new(handler));
        self
    }

    /// Make every call against `name` (a table or a procedure) fail with `error`.
    #[must_use]
    pub fn with_failure(self, name: impl Into<String>, error: QueryError) -> Self {
        let _ = self.lock().failures.insert(name.into(), error);
        self
    }

    pub fn set_table(&self, table: impl Into<String>, rows: Vec<Value>) {
        let _ = self.lock().tables.insert(table.into(), rows);
    }

    /// Number of reads and procedure calls issued so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(AtomicOrdering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn evaluate(&self, request: &ReadRequest) -> Result<Vec<Value>, QueryError> {
        let _ = self.calls.fetch_add(1, AtomicOrdering::Relaxed);
        log::debug!(target: LOG_TARGET, "read {request}");

        let state = self.lock();
        if let Some(error) = state.failures.get(request.table()) {
            return Err(error.clone());
        }

        let rows = state.tables.get(request.table()).ok_or_else(|| ApiError {
            status: 404,
            code: Some("42P01".to_string()),
            message: format!("relation \"{}\" does not exist", request.table()),
            ..ApiError::default()
        })?;

        let mut matched: Vec<&Value> = rows
            .iter()
            .filter(|row| request.filters().iter().all(|filter| matches_filter(row, filter)))
            .collect();

        for order in request.ordering().iter().rev() {
            matched.sort_by(|a, b| {
                let ordering = compare_nullable(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        let limit = request.row_limit().unwrap_or(usize::MAX);
        Ok(matched.into_iter().take(limit).map(|row| project(row, request.columns())).collect())
    }
}

impl RemoteSource for MemorySource {
    async fn select<T>(&self, request: &ReadRequest) -> Result<Vec<T>, QueryError>
    where
        T: DeserializeOwned + Send,
    {
        self.evaluate(request)?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(QueryError::transport))
            .collect()
    }

    async fn rpc<P, T>(&self, function: &str, params: &P) -> Result<T, QueryError>
    where
        P: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        let _ = self.calls.fetch_add(1, AtomicOrdering::Relaxed);
        log::debug!(target: LOG_TARGET, "rpc {function}");

        let handler = {
            let state = self.lock();
            if let Some(error) = state.failures.get(function) {
                return Err(error.clone());
            }

            state.procedures.get(function).cloned().ok_or_else(|| ApiError {
                status: 404,
                code: Some("PGRST202".to_string()),
                message: format!("Could not find the function public.{function}"),
                ..ApiError::default()
            })?
        };

        let params = serde_json::to_value(params).map_err(QueryError::transport)?;
        let result = handler(params)?;
        serde_json::from_value(result).map_err(QueryError::transport)
    }
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    let value = row.get(&filter.column).unwrap_or(&Value::Null);

    if filter.op == FilterOp::Is {
        return match filter.value.as_str() {
            "null" => value.is_null(),
            "true" => value.as_bool() == Some(true),
            "false" => value.as_bool() == Some(false),
            _ => false,
        };
    }

    let Some(ordering) = compare_to_literal(value, &filter.value) else {
        return false;
    };

    match filter.op {
        FilterOp::Eq => ordering == Ordering::Equal,
        FilterOp::Neq => ordering != Ordering::Equal,
        FilterOp::Gt => ordering == Ordering::Greater,
        FilterOp::Gte => ordering != Ordering::Less,
        FilterOp::Lt => ordering == Ordering::Less,
        FilterOp::Lte => ordering != Ordering::Greater,
        FilterOp::Is => false,
    }
}

/// Compare a row value with a filter literal; `None` when the value is null.
fn compare_to_literal(value: &Value, literal: &str) -> Option<Ordering> {
    match value {
        Value::Null => None,
        Value::Number(n) => match (n.as_f64(), literal.parse::<f64>()) {
            (Some(a), Ok(b)) => a.partial_cmp(&b),
            _ => Some(n.to_string().as_str().cmp(literal)),
        },
        Value::String(s) => Some(s.as_str().cmp(literal)),
        Value::Bool(b) => Some(b.to_string().as_str().cmp(literal)),
        other => Some(other.to_string().as_str().cmp(literal)),
    }
}

fn compare_nullable(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn project(row: &Value, columns: &[String]) -> Value {
    if columns.is_empty() || columns.iter().any(|c| c == "*") {
        return row.clone();
    }

    let Value::Object(fields) = row else {
        return row.clone();
    };

    let projected: Map<String, Value> = columns
        .iter()
        .filter_map(|column| fields.get(column).map(|value| (column.clone(), value.clone())))
        .collect();

    Value::Object(projected)
}
