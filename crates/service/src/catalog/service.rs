use std::sync::Arc;

use tracing::{error, info, instrument};

use models::catalog_service::validate_name;

use super::domain::{CatalogEntry, Direction, ListFilter, ServiceFields, UpsertRequest};
use super::errors::CatalogError;
use super::ordering;
use super::repository::{CatalogRepository, Planner};

/// Ordered catalog business service independent of web framework.
///
/// Every mutation runs as one repository transaction and returns the full
/// catalog in display order afterwards.
#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    /// Entries in display order. Positions are renumbered first when they are
    /// not exactly `1..=n`; a dense catalog is read without any writes.
    ///
    /// # Examples
    /// ```
    /// use service::catalog::{CatalogService, ListFilter, ServiceFields};
    /// use service::catalog::repository::memory::InMemoryCatalogRepository;
    /// use std::sync::Arc;
    /// let svc = CatalogService::new(Arc::new(InMemoryCatalogRepository::new()));
    /// tokio_test::block_on(svc.upsert("Basic", ServiceFields::default(), None)).unwrap();
    /// let rows = tokio_test::block_on(svc.list(ListFilter::All)).unwrap();
    /// assert_eq!(rows[0].name, "Basic");
    /// assert_eq!(rows[0].position, Some(1));
    /// ```
    #[instrument(skip(self))]
    pub async fn list(&self, filter: ListFilter) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut rows = self.repo.list().await?;
        if !ordering::is_dense(&rows) {
            self.normalize().await?;
            rows = self.repo.list().await?;
        }
        ordering::sort_for_display(&mut rows);
        if filter == ListFilter::VisibleOnly {
            rows.retain(|e| e.visible);
        }
        Ok(rows)
    }

    /// Renumber positions to `1..=n` in current display order. Returns the
    /// number of rows written.
    #[instrument(skip(self))]
    pub async fn normalize(&self) -> Result<usize, CatalogError> {
        let writes = self
            .run("normalize", "*", Box::new(|snapshot: &[CatalogEntry]| Ok::<_, CatalogError>(ordering::plan_normalize(snapshot))))
            .await?;
        if writes > 0 {
            info!(writes, "catalog_normalized");
        }
        Ok(writes)
    }

    /// Create a service, update it in place, or rename it when `rename_from`
    /// names a different existing entry.
    ///
    /// # Examples
    /// ```
    /// use service::catalog::{CatalogService, ServiceFields, Prices};
    /// use service::catalog::repository::memory::InMemoryCatalogRepository;
    /// use std::sync::Arc;
    /// let svc = CatalogService::new(Arc::new(InMemoryCatalogRepository::new()));
    /// let fields = ServiceFields { prices: Prices { bike: Some(50), sedan: Some(150), suv: Some(200) }, ..Default::default() };
    /// tokio_test::block_on(svc.upsert("Basic", fields.clone(), None)).unwrap();
    /// let rows = tokio_test::block_on(svc.upsert("Basic Wash", fields, Some("Basic"))).unwrap();
    /// assert_eq!(rows.len(), 1);
    /// assert_eq!(rows[0].name, "Basic Wash");
    /// ```
    #[instrument(skip(self, fields))]
    pub async fn upsert(
        &self,
        name: &str,
        fields: ServiceFields,
        rename_from: Option<&str>,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let name = validate_name(name)?;
        let rename_from = rename_from.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        let renaming = rename_from.as_deref().is_some_and(|from| from != name);
        let req = UpsertRequest { name: name.clone(), fields, rename_from: rename_from.clone() };

        let writes = self
            .run("upsert", &name, Box::new(move |snapshot: &[CatalogEntry]| ordering::plan_upsert(snapshot, &req)))
            .await?;
        if renaming {
            info!(service = %name, from = ?rename_from, writes, "catalog_entry_renamed");
        } else {
            info!(service = %name, writes, "catalog_entry_saved");
        }
        self.list(ListFilter::All).await
    }

    /// Swap with the neighbour above or below. No-op at either end.
    #[instrument(skip(self))]
    pub async fn move_entry(&self, name: &str, direction: Direction) -> Result<Vec<CatalogEntry>, CatalogError> {
        let name = validate_name(name)?;
        let target = name.clone();
        let writes = self
            .run(
                "move",
                &name,
                Box::new(move |snapshot: &[CatalogEntry]| ordering::plan_move(snapshot, &target, direction)),
            )
            .await?;
        info!(service = %name, ?direction, writes, "catalog_entry_moved");
        self.list(ListFilter::All).await
    }

    /// Place the entry at `target` (clamped into `1..=n`), shifting the
    /// entries in between by one.
    #[instrument(skip(self))]
    pub async fn move_to_position(&self, name: &str, target: i64) -> Result<Vec<CatalogEntry>, CatalogError> {
        let name = validate_name(name)?;
        let moving = name.clone();
        let writes = self
            .run(
                "move_to",
                &name,
                Box::new(move |snapshot: &[CatalogEntry]| ordering::plan_move_to(snapshot, &moving, target)),
            )
            .await?;
        info!(service = %name, target, writes, "catalog_entry_placed");
        self.list(ListFilter::All).await
    }

    /// Remove the entry and close the gap it leaves.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        let name = validate_name(name)?;
        let doomed = name.clone();
        let writes = self
            .run("delete", &name, Box::new(move |snapshot: &[CatalogEntry]| ordering::plan_delete(snapshot, &doomed)))
            .await?;
        info!(service = %name, writes, "catalog_entry_deleted");
        self.list(ListFilter::All).await
    }

    async fn run(&self, op: &'static str, name: &str, planner: Planner) -> Result<usize, CatalogError> {
        match self.repo.transact(planner).await {
            Err(CatalogError::Conflict(msg)) => {
                error!(op, service = name, error = %msg, "catalog_constraint_conflict");
                Err(CatalogError::Conflict(msg))
            }
            other => other,
        }
    }
}
