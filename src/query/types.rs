//! Query descriptor types
//!
//! Filters and orders are plain data so they serialize canonically and
//! can be evaluated by any source.

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A filtered, ordered query over one data kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Data kind (table, collection, entity type)
    pub kind: String,

    /// Predicates, all of which must hold
    #[serde(default)]
    pub filters: Vec<Filter>,

    /// Sort keys, most significant first
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl Query {
    /// Create an unfiltered, unordered query over `kind`
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            filters: Vec::new(),
            orders: Vec::new(),
        }
    }

    /// Add a filter predicate
    #[must_use]
    pub fn filter(
        mut self,
        field: impl Into<String>,
        op: FilterOp,
        value: impl Into<JsonValue>,
    ) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Add a sort key
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(Order {
            field: field.into(),
            direction,
        });
        self
    }

    /// Whether a JSON record satisfies every filter
    pub fn matches(&self, record: &JsonValue) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Compare two JSON records by this query's sort keys
    pub fn compare(&self, a: &JsonValue, b: &JsonValue) -> Ordering {
        for order in &self.orders {
            let ordering = compare_values(field(a, &order.field), field(b, &order.field));
            let ordering = match order.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// A single field predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field name
    pub field: String,
    /// Comparison operator
    pub op: FilterOp,
    /// Value compared against
    pub value: JsonValue,
}

impl Filter {
    /// Evaluate against a JSON record; a missing field compares as null
    pub fn matches(&self, record: &JsonValue) -> bool {
        self.op
            .holds(compare_values(field(record, &self.field), &self.value))
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl FilterOp {
    /// SQL operator text
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Whether `lhs op rhs` holds given `lhs.cmp(rhs)`
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Field name
    pub field: String,
    /// Sort direction
    #[serde(default)]
    pub direction: Direction,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

static NULL: JsonValue = JsonValue::Null;

fn field<'a>(record: &'a JsonValue, name: &str) -> &'a JsonValue {
    record.get(name).unwrap_or(&NULL)
}

/// Total order over JSON values.
///
/// Values of different types order by type rank:
/// null < bool < number < string < array < object.
pub fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Null, JsonValue::Null) => Ordering::Equal,
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            }
        },
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Array(x), JsonValue::Array(y)) => {
            for (left, right) in x.iter().zip(y) {
                let ordering = compare_values(left, right);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        // Objects only need a consistent order; compare their canonical text
        (JsonValue::Object(_), JsonValue::Object(_)) => a.to_string().cmp(&b.to_string()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Bool(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::String(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}
