//! Read-only statement guard.
//!
//! Uses sqlparser-rs to make sure a query file holds exactly one read-only
//! query before it is sent to the warehouse. Text the parser does not
//! understand (warehouse-specific syntax) is let through, since the
//! warehouse is the final authority on its own dialect.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::{Dialect, PostgreSqlDialect, SnowflakeDialect};
use sqlparser::parser::Parser;
use tracing::debug;

use crate::error::{DashError, Result};
use crate::warehouse::WarehouseBackend;

/// Checks statements against the dialect of one backend.
#[derive(Debug, Clone, Copy)]
pub struct ReadOnlyGuard {
    backend: WarehouseBackend,
}

impl ReadOnlyGuard {
    pub fn new(backend: WarehouseBackend) -> Self {
        Self { backend }
    }

    fn dialect(&self) -> Box<dyn Dialect> {
        match self.backend {
            WarehouseBackend::Snowflake => Box::new(SnowflakeDialect {}),
            WarehouseBackend::Postgres => Box::new(PostgreSqlDialect {}),
        }
    }

    /// Returns an error unless `sql` is a single read-only query.
    pub fn check(&self, sql: &str) -> Result<()> {
        if sql.trim().is_empty() {
            return Err(DashError::query("Query text is empty"));
        }

        let statements = match Parser::parse_sql(self.dialect().as_ref(), sql) {
            Ok(statements) => statements,
            Err(e) => {
                debug!("Guard could not parse statement, passing through: {}", e);
                return Ok(());
            }
        };

        match statements.as_slice() {
            [] => Err(DashError::query("Query text holds no statement")),
            [Statement::Query(query)] if is_read_only_query(query) => Ok(()),
            [Statement::Query(_)] => Err(DashError::query(
                "Query modifies data; only read-only queries are allowed",
            )),
            [other] => Err(DashError::query(format!(
                "Only SELECT queries are allowed, found {}",
                statement_keyword(other)
            ))),
            many => Err(DashError::query(format!(
                "Expected a single query, found {} statements",
                many.len()
            ))),
        }
    }
}

/// First keyword of a statement, for error messages.
fn statement_keyword(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or("statement")
        .to_uppercase()
}

/// Returns false if the query or any nested query modifies data.
fn is_read_only_query(query: &Query) -> bool {
    let ctes_read_only = query
        .with
        .as_ref()
        .map_or(true, |with| with.cte_tables.iter().all(|cte| is_read_only_query(&cte.query)));

    ctes_read_only && is_read_only_set_expr(&query.body)
}

fn is_read_only_set_expr(set_expr: &SetExpr) -> bool {
    match set_expr {
        SetExpr::Insert(_) | SetExpr::Update(_) => false,
        SetExpr::Query(query) => is_read_only_query(query),
        SetExpr::Select(select) => is_read_only_select(select),
        SetExpr::SetOperation { left, right, .. } => {
            is_read_only_set_expr(left) && is_read_only_set_expr(right)
        }
        _ => true,
    }
}

fn is_read_only_select(select: &Select) -> bool {
    select.from.iter().all(is_read_only_table_with_joins)
}

fn is_read_only_table_with_joins(twj: &TableWithJoins) -> bool {
    is_read_only_table_factor(&twj.relation)
        && twj
            .joins
            .iter()
            .all(|join| is_read_only_table_factor(&join.relation))
}

fn is_read_only_table_factor(factor: &TableFactor) -> bool {
    match factor {
        TableFactor::Derived { subquery, .. } => is_read_only_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => is_read_only_table_with_joins(table_with_joins),
        _ => true,
    }
}
