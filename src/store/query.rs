use std::fmt;

/// The four logical tables of the hosted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    AdminSettings,
    Services,
    Bookings,
    Quotes,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::AdminSettings => "admin_settings",
            Table::Services => "services",
            Table::Bookings => "bookings",
            Table::Quotes => "quotes",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
}

/// `column <op> value`, rendered as `column=op.value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.to_string(),
        }
    }

    pub fn neq(column: impl Into<String>, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Neq,
            value: value.to_string(),
        }
    }

    pub fn query_pair(&self) -> (String, String) {
        let op = match self.op {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
        };
        (self.column.clone(), format!("{op}.{}", self.value))
    }

    /// In-process evaluation against a JSON row; used by non-HTTP backends.
    pub fn matches(&self, row: &serde_json::Value) -> bool {
        let cell = match row.get(&self.column) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        match self.op {
            FilterOp::Eq => cell == self.value,
            FilterOp::Neq => cell != self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// Select options: filters and an optional ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Order {
            column: column.into(),
            descending: true,
        });
        self
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Order {
            column: column.into(),
            descending: false,
        });
        self
    }

    /// PostgREST query string pairs, `select=*` first.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(self.filters.iter().map(Filter::query_pair));
        if let Some(order) = &self.order {
            let dir = if order.descending { "desc" } else { "asc" };
            pairs.push(("order".to_string(), format!("{}.{dir}", order.column)));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_postgrest_pairs() {
        let q = Query::new()
            .filter(Filter::eq("id", 1))
            .order_desc("created_at");
        assert_eq!(
            q.query_pairs(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("id".to_string(), "eq.1".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn filters_evaluate_against_rows() {
        let row = json!({"id": "web", "n": 1});
        assert!(Filter::eq("id", "web").matches(&row));
        assert!(Filter::neq("id", "0").matches(&row));
        assert!(Filter::eq("n", 1).matches(&row));
        assert!(!Filter::eq("missing", "x").matches(&row));
    }
}
