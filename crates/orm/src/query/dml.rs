//! DML Generation - INSERT, UPDATE and DELETE rendering

use crate::backends::DatabaseValue;
use crate::query::builder::QueryBuilder;

impl QueryBuilder {
    pub(crate) fn render_insert(&self) -> (String, Vec<DatabaseValue>) {
        let columns: Vec<&str> = self.set_clauses.iter().map(|s| s.column.as_str()).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let bindings: Vec<DatabaseValue> =
            self.set_clauses.iter().map(|s| s.value.clone()).collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders
        );
        (sql, bindings)
    }

    pub(crate) fn render_update(&self) -> (String, Vec<DatabaseValue>) {
        let mut bindings = Vec::new();
        let assignments: Vec<String> = self
            .set_clauses
            .iter()
            .map(|s| {
                bindings.push(s.value.clone());
                format!("{} = ?", s.column)
            })
            .collect();

        let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));
        self.render_where(&mut sql, &mut bindings);
        (sql, bindings)
    }

    pub(crate) fn render_delete(&self) -> (String, Vec<DatabaseValue>) {
        let mut bindings = Vec::new();
        let mut sql = format!("DELETE FROM {}", self.table);
        self.render_where(&mut sql, &mut bindings);
        (sql, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_renders_columns_and_placeholders() {
        let query = QueryBuilder::insert_into("posts")
            .set("title", "hello")
            .set("user_id", 1i64);

        let (sql, bindings) = query.to_sql_with_bindings(false);
        assert_eq!(sql, "INSERT INTO posts (title, user_id) VALUES (?, ?)");
        assert_eq!(
            bindings,
            vec![
                DatabaseValue::String("hello".to_string()),
                DatabaseValue::Int64(1)
            ]
        );
    }

    #[test]
    fn test_update_renders_assignments_then_where_bindings() {
        let query = QueryBuilder::update("posts")
            .set("title", "renamed")
            .where_eq("id", 7i64);

        let (sql, bindings) = query.to_sql_with_bindings(false);
        assert_eq!(sql, "UPDATE posts SET title = ? WHERE id = ?");
        assert_eq!(
            bindings,
            vec![
                DatabaseValue::String("renamed".to_string()),
                DatabaseValue::Int64(7)
            ]
        );
    }

    #[test]
    fn test_delete_with_in_list() {
        let query = QueryBuilder::delete_from("role_user")
            .where_eq("user_id", 1i64)
            .where_in("role_id", vec![2i64, 3]);

        let (sql, bindings) = query.to_sql_with_bindings(false);
        assert_eq!(
            sql,
            "DELETE FROM role_user WHERE user_id = ? AND role_id IN (?, ?)"
        );
        assert_eq!(bindings.len(), 3);
    }
}
