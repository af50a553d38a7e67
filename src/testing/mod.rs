//! Gateways for exercising the HTTP layer without PostgreSQL.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::database::{DatabaseError, Gateway, Row, SqlParam};
use crate::handlers::duties::{DELETE_BY_ID, INSERT, SELECT_ALL, UPDATE_BY_ID};

/// Build a [`Row`] from a JSON object literal; `None` for anything else
pub fn row(value: Value) -> Option<Row> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

type Call = (String, Vec<SqlParam>);

/// Scripted gateway: answers each call with the next queued outcome and
/// records the statement and parameters it was given.
///
/// With nothing queued it answers an empty row set.
#[derive(Default)]
pub struct MockGateway {
    outcomes: Mutex<VecDeque<Result<Vec<Row>, String>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(&self, rows: Vec<Row>) {
        self.outcomes.lock().unwrap().push_back(Ok(rows));
    }

    pub fn fail_with(&self, message: impl Into<String>) {
        self.outcomes.lock().unwrap().push_back(Err(message.into()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>, DatabaseError> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));

        match self.outcomes.lock().unwrap().pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(DatabaseError::QueryError(message)),
            None => Ok(Vec::new()),
        }
    }
}

/// In-memory `duties` table that understands the statements the duty
/// handlers issue. `name` is NOT NULL and ids come from a sequence, as with
/// the SERIAL column in PostgreSQL.
#[derive(Default)]
pub struct MemoryGateway {
    table: Mutex<MemoryTable>,
}

#[derive(Default)]
struct MemoryTable {
    next_id: i64,
    rows: BTreeMap<i64, String>,
    offline: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail, as if the connection was lost
    pub fn set_offline(&self, offline: bool) {
        self.table.lock().unwrap().offline = offline;
    }

    fn duty_row(id: i64, name: &str) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(id));
        row.insert("name".to_string(), json!(name));
        row
    }

    fn name_param(param: Option<&SqlParam>) -> Result<String, DatabaseError> {
        match param {
            Some(SqlParam::Text(name)) => Ok(name.clone()),
            Some(SqlParam::Int(i)) => Ok(i.to_string()),
            _ => Err(DatabaseError::QueryError(
                "null value in column \"name\" violates not-null constraint".to_string(),
            )),
        }
    }

    fn id_param(param: Option<&SqlParam>) -> Result<Option<i64>, DatabaseError> {
        match param {
            Some(SqlParam::Int(id)) => Ok(Some(*id)),
            Some(SqlParam::Null) => Ok(None),
            _ => Err(DatabaseError::QueryError(
                "operator does not exist: integer = text".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>, DatabaseError> {
        let mut table = self.table.lock().unwrap();
        if table.offline {
            return Err(DatabaseError::QueryError("connection refused".to_string()));
        }

        match sql {
            "SELECT 1" => Ok(row(json!({ "?column?": 1 })).into_iter().collect()),
            SELECT_ALL => Ok(table
                .rows
                .iter()
                .map(|(id, name)| Self::duty_row(*id, name))
                .collect()),
            INSERT => {
                let name = Self::name_param(params.first())?;
                table.next_id += 1;
                let id = table.next_id;
                table.rows.insert(id, name.clone());
                Ok(vec![Self::duty_row(id, &name)])
            }
            UPDATE_BY_ID => {
                let id = Self::id_param(params.get(1))?;
                let target = id.filter(|id| table.rows.contains_key(id));
                match target {
                    Some(id) => {
                        let name = Self::name_param(params.first())?;
                        table.rows.insert(id, name.clone());
                        Ok(vec![Self::duty_row(id, &name)])
                    }
                    None => Ok(Vec::new()),
                }
            }
            DELETE_BY_ID => {
                let id = Self::id_param(params.first())?;
                Ok(id
                    .and_then(|id| table.rows.remove(&id).map(|name| Self::duty_row(id, &name)))
                    .into_iter()
                    .collect())
            }
            other => Err(DatabaseError::QueryError(format!(
                "unsupported statement: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_accepts_only_objects() {
        assert!(row(json!({ "id": 1 })).is_some());
        assert!(row(json!([1, 2])).is_none());
    }

    #[tokio::test]
    async fn mock_records_calls_and_replays_outcomes() {
        let gateway = MockGateway::new();
        gateway.fail_with("Database error");

        let err = gateway.execute("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, DatabaseError::QueryError(msg) if msg == "Database error"));
        assert!(gateway.execute("SELECT 1", &[]).await.unwrap().is_empty());
        assert_eq!(gateway.calls().len(), 2);
    }

    #[tokio::test]
    async fn memory_table_assigns_sequential_ids() {
        let gateway = MemoryGateway::new();
        let first = gateway.execute(INSERT, &[SqlParam::from("a")]).await.unwrap();
        let second = gateway.execute(INSERT, &[SqlParam::from("b")]).await.unwrap();

        assert_eq!(first[0]["id"], json!(1));
        assert_eq!(second[0]["id"], json!(2));
        assert_eq!(gateway.execute(SELECT_ALL, &[]).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn memory_table_rejects_null_name_on_insert() {
        let gateway = MemoryGateway::new();
        assert!(gateway.execute(INSERT, &[SqlParam::Null]).await.is_err());
        assert!(gateway.execute(SELECT_ALL, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_update_of_missing_row_matches_nothing() {
        let gateway = MemoryGateway::new();
        let rows = gateway
            .execute(UPDATE_BY_ID, &[SqlParam::Null, SqlParam::Int(999)])
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
