//! SQL Generation
//!
//! Renders the builder to a SQL string with `?` placeholders and collects
//! bindings in the exact order their placeholders appear. Backends rewrite
//! the placeholders to their native parameter syntax.

use crate::backends::DatabaseValue;
use crate::query::builder::QueryBuilder;
use crate::query::types::{QueryType, WhereClause};

impl QueryBuilder {
    /// Render the statement. With `count` set, the select list becomes
    /// `COUNT(*) AS count` and ordering/limit/offset are dropped.
    pub fn to_sql(&self, count: bool) -> String {
        self.render(count).0
    }

    /// The binding list, in placeholder order
    pub fn bindings(&self) -> Vec<DatabaseValue> {
        self.render(false).1
    }

    /// Render the statement and its bindings together
    pub fn to_sql_with_bindings(&self, count: bool) -> (String, Vec<DatabaseValue>) {
        self.render(count)
    }

    fn render(&self, count: bool) -> (String, Vec<DatabaseValue>) {
        match self.query_type {
            QueryType::Select => self.render_select(count),
            QueryType::Insert => self.render_insert(),
            QueryType::Update => self.render_update(),
            QueryType::Delete => self.render_delete(),
        }
    }

    fn render_select(&self, count: bool) -> (String, Vec<DatabaseValue>) {
        let mut bindings = Vec::new();

        let select_list = if count {
            "COUNT(*) AS count".to_string()
        } else if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };

        let mut sql = format!("SELECT {} FROM {}", select_list, self.table);

        for join in &self.joins {
            sql.push_str(&format!(
                " INNER JOIN {} ON {} = {}",
                join.table, join.first, join.second
            ));
        }

        self.render_where(&mut sql, &mut bindings);

        if !count {
            if !self.orders.is_empty() {
                let orders: Vec<String> = self
                    .orders
                    .iter()
                    .map(|(column, direction)| format!("{} {}", column, direction))
                    .collect();
                sql.push_str(&format!(" ORDER BY {}", orders.join(", ")));
            }

            if let Some(limit) = self.limit {
                sql.push_str(&format!(" LIMIT {}", limit));
            }
            if let Some(offset) = self.offset {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }

        (sql, bindings)
    }

    pub(crate) fn render_where(&self, sql: &mut String, bindings: &mut Vec<DatabaseValue>) {
        for (index, clause) in self.where_clauses.iter().enumerate() {
            if index == 0 {
                sql.push_str(" WHERE ");
            } else {
                sql.push_str(&format!(" {} ", clause.connector()));
            }

            match clause {
                WhereClause::Basic {
                    column,
                    operator,
                    value,
                    ..
                } => {
                    sql.push_str(&format!("{} {} ?", column, operator));
                    bindings.push(value.clone());
                }
                WhereClause::In { column, values, .. } => {
                    if values.is_empty() {
                        // IN over an empty set matches nothing
                        sql.push_str("0 = 1");
                    } else {
                        let placeholders = vec!["?"; values.len()].join(", ");
                        sql.push_str(&format!("{} IN ({})", column, placeholders));
                        bindings.extend(values.iter().cloned());
                    }
                }
                WhereClause::NotIn { column, values, .. } => {
                    if values.is_empty() {
                        // NOT IN over an empty set excludes nothing
                        sql.push_str("1 = 1");
                    } else {
                        let placeholders = vec!["?"; values.len()].join(", ");
                        sql.push_str(&format!("{} NOT IN ({})", column, placeholders));
                        bindings.extend(values.iter().cloned());
                    }
                }
                WhereClause::Null { column, .. } => {
                    sql.push_str(&format!("{} IS NULL", column));
                }
                WhereClause::NotNull { column, .. } => {
                    sql.push_str(&format!("{} IS NOT NULL", column));
                }
            }
        }
    }
}
