use std::sync::{Arc, Mutex};
use tabula_core::{
    async_trait,
    source::{QueryResult, TableQuery},
    DataSource, RelationSpec, Result,
};

/// A data source wrapper that records every query for assertions.
#[derive(Debug)]
pub struct RecordingSource {
    inner: Box<dyn DataSource>,

    /// Log of all queries executed through this source
    /// Using Arc<Mutex> for thread-safe access from tests
    log: Arc<Mutex<Vec<TableQuery>>>,
}

impl RecordingSource {
    pub fn new(inner: impl DataSource + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a handle to access the query log
    pub fn log_handle(&self) -> Arc<Mutex<Vec<TableQuery>>> {
        self.log.clone()
    }

    pub fn queries(&self) -> Vec<TableQuery> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for RecordingSource {
    async fn columns(&self, table: &str) -> Result<Option<Vec<String>>> {
        self.inner.columns(table).await
    }

    async fn relations(&self, table: &str) -> Result<Vec<RelationSpec>> {
        self.inner.relations(table).await
    }

    async fn query(&self, query: &TableQuery) -> Result<QueryResult> {
        self.log.lock().unwrap().push(query.clone());
        self.inner.query(query).await
    }
}
