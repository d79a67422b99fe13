use async_trait::async_trait;

use super::domain::{CatalogEntry, WriteOp};
use super::errors::CatalogError;

/// Computes the writes for one mutation from the snapshot read inside the
/// write transaction.
pub type Planner = Box<dyn FnOnce(&[CatalogEntry]) -> Result<Vec<WriteOp>, CatalogError> + Send>;

/// Repository abstraction for catalog persistence.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All rows, unordered.
    async fn list(&self) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Run `planner` against a locked snapshot and apply its writes in order,
    /// all in one transaction. Returns the number of writes applied. Any error
    /// leaves stored state untouched.
    async fn transact(&self, planner: Planner) -> Result<usize, CatalogError>;
}

/// In-memory repository for tests and doc examples. Enforces the same unique
/// constraints as the table.
pub mod memory {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{Mutex, RwLock};

    #[derive(Default)]
    pub struct InMemoryCatalogRepository {
        rows: RwLock<Vec<CatalogEntry>>,
        writes: AtomicUsize,
        fail_after: Mutex<Option<usize>>, // 下一次事务在第 N 次写入后失败
    }

    impl InMemoryCatalogRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed rows as given, without constraint checks, so tests can start
        /// from legacy data with missing or broken positions.
        pub fn with_entries(entries: Vec<CatalogEntry>) -> Self {
            Self { rows: RwLock::new(entries), ..Self::default() }
        }

        /// Total writes committed so far.
        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// Make the next transaction fail with a store error after `n` writes.
        pub async fn fail_next_transaction_after(&self, n: usize) {
            *self.fail_after.lock().await = Some(n);
        }

        pub async fn snapshot(&self) -> Vec<CatalogEntry> {
            self.rows.read().await.clone()
        }
    }

    #[async_trait]
    impl CatalogRepository for InMemoryCatalogRepository {
        async fn list(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
            Ok(self.rows.read().await.clone())
        }

        async fn transact(&self, planner: Planner) -> Result<usize, CatalogError> {
            // 写锁相当于表锁
            let mut guard = self.rows.write().await;
            let fail_after = self.fail_after.lock().await.take();

            let mut working = guard.clone();
            let ops = planner(&working)?;
            for (i, op) in ops.iter().enumerate() {
                if fail_after == Some(i) {
                    return Err(CatalogError::Store("connection lost mid-transaction".into()));
                }
                apply(&mut working, op)?;
            }
            *guard = working;
            self.writes.fetch_add(ops.len(), Ordering::SeqCst);
            Ok(ops.len())
        }
    }

    fn ensure_slot_free(rows: &[CatalogEntry], position: Option<i32>, except: Option<&str>) -> Result<(), CatalogError> {
        if let Some(p) = position {
            if rows.iter().any(|r| r.position == Some(p) && Some(r.name.as_str()) != except) {
                return Err(CatalogError::Conflict(format!("duplicate key value (position)=({p})")));
            }
        }
        Ok(())
    }

    fn ensure_name_free(rows: &[CatalogEntry], name: &str) -> Result<(), CatalogError> {
        if rows.iter().any(|r| r.name == name) {
            return Err(CatalogError::Conflict(format!("duplicate key value (name)=({name})")));
        }
        Ok(())
    }

    fn apply(rows: &mut Vec<CatalogEntry>, op: &WriteOp) -> Result<(), CatalogError> {
        match op {
            WriteOp::Insert { name, fields, position } => {
                ensure_name_free(rows, name)?;
                ensure_slot_free(rows, Some(*position), None)?;
                rows.push(CatalogEntry {
                    name: name.clone(),
                    position: Some(*position),
                    visible: fields.visible.unwrap_or(true),
                    prices: fields.prices,
                    description: fields.description.clone(),
                    updated_at: Utc::now(),
                });
            }
            WriteOp::UpdateFields { name, fields } => {
                if let Some(row) = rows.iter_mut().find(|r| r.name == *name) {
                    row.prices = fields.prices;
                    if let Some(d) = &fields.description {
                        row.description = Some(d.clone());
                    }
                    if let Some(v) = fields.visible {
                        row.visible = v;
                    }
                    row.updated_at = Utc::now();
                }
            }
            WriteOp::Rename { from, to } => {
                ensure_name_free(rows, to)?;
                if let Some(row) = rows.iter_mut().find(|r| r.name == *from) {
                    row.name = to.clone();
                    row.updated_at = Utc::now();
                }
            }
            WriteOp::SetPosition { name, position } => {
                ensure_slot_free(rows, *position, Some(name))?;
                if let Some(row) = rows.iter_mut().find(|r| r.name == *name) {
                    row.position = *position;
                }
            }
            WriteOp::Delete { name } => rows.retain(|r| r.name != *name),
        }
        Ok(())
    }

}
