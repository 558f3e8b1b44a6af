//! The sync service: optimistic local state over the remote sheet.
//!
//! Every mutation is applied to the in-memory [`Inventory`] first and then
//! persisted with one or more Sheets calls. A failed write is reported
//! through the sync status and the `synced` flag of the result, and the
//! local change is kept; the next refresh reconciles local and remote.
//!
//! Row numbers are never cached. Each write re-reads the range it
//! targets, locates its row, and hands the resulting [`RowPosition`]
//! straight to the client.
//!
//! [`RowPosition`]: humidor_engine::RowPosition

pub mod status;

use std::future::Future;

use chrono::Local;
use humidor_engine::{
    count_history_matches, insertion_point, locate_history, locate_unit_occurrence, pack, Cell,
    Column,
    HistoryEntry, HistoryKey, Inventory, LotRow, NewLot, RowCodec, RowPosition, SheetDate,
    SyncActivity, Unit, UnitId, UnitPatch, COLUMN_COUNT,
};
use serde::Serialize;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::config::Config;
use crate::sheets::{SheetRef, SheetsClient, SheetsError};

pub use status::{StatusChannel, StatusSnapshot};

/// Columns in a history row.
const HISTORY_WIDTH: usize = humidor_engine::HISTORY_COLUMN_COUNT;

/// Errors from the sync service.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Engine(#[from] humidor_engine::Error),

    #[error(transparent)]
    Sheets(#[from] SheetsError),

    #[error("No sheet row holds {0}")]
    RowNotFound(String),

    #[error("No history row matches")]
    HistoryNotFound,

    #[error("Box {0} has no identity in the sheet")]
    Unlocatable(UnitId),
}

/// A locally applied mutation and whether it reached the sheet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome<T> {
    pub data: T,
    pub synced: bool,
}

/// Result of a full refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub units: usize,
    pub skipped: usize,
}

/// Optional history entry written alongside a consume.
#[derive(Debug, Clone, Default)]
pub struct ConsumeLog {
    pub notes: String,
}

/// Sheet layout the service works against.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub inventory: SheetRef,
    pub history: SheetRef,
    pub sentinel: String,
}

impl SheetLayout {
    pub fn from_config(config: &Config) -> Self {
        Self {
            inventory: config.inventory_sheet.clone(),
            history: config.history_sheet.clone(),
            sentinel: config.subtotal_sentinel.clone(),
        }
    }
}

/// Where a row sits in the sheet right now: its identity cell and which
/// of the rows repeating that cell it is.
struct RowRef {
    key: String,
    occurrence: u32,
}

impl RowRef {
    fn of(unit: &Unit) -> Self {
        Self {
            key: unit.row_key.clone(),
            occurrence: unit.row_occurrence,
        }
    }
}

/// A row rewrite staged under the inventory lock: where the row is found
/// now and its new contents.
struct StagedRow {
    at: RowRef,
    row: LotRow,
}

impl StagedRow {
    /// Pack the boxes persisted with `unit`, rekeying them locally when
    /// the row's identity cell has to change.
    fn stage(inventory: &mut Inventory, unit: &Unit) -> Self {
        let at = RowRef::of(unit);
        let row = pack(&at.key, &inventory.lot_members(&at.key, at.occurrence))
            .unwrap_or_else(|| LotRow::single(unit));
        inventory.rekey(&at.key, at.occurrence, &row.identity);
        Self { at, row }
    }
}

/// What a removal has to do to the sheet.
enum RowChange {
    Delete(RowRef),
    Rewrite(StagedRow),
}

/// Owns the local inventory and persists its changes.
#[derive(Debug)]
pub struct SyncService {
    client: SheetsClient,
    codec: RowCodec,
    layout: SheetLayout,
    inventory: RwLock<Inventory>,
    status: StatusChannel,
}

impl SyncService {
    pub fn new(
        client: SheetsClient,
        codec: RowCodec,
        layout: SheetLayout,
        status: StatusChannel,
    ) -> Self {
        Self {
            client,
            codec,
            layout,
            inventory: RwLock::new(Inventory::new()),
            status,
        }
    }

    /// Build the service and its Sheets client from configuration.
    ///
    /// A zero linger keeps outcomes until the next transition.
    pub fn from_config(config: &Config) -> Result<Self, SheetsError> {
        let client = SheetsClient::new(
            &config.sheets_api_base,
            config.spreadsheet_id.clone(),
            config.credential.provider(),
            config.request_timeout,
        )?;
        let linger = Some(config.status_linger).filter(|d| !d.is_zero());

        Ok(Self::new(
            client,
            RowCodec::new(config.default_location.clone()),
            SheetLayout::from_config(config),
            StatusChannel::new(linger),
        ))
    }

    pub fn status(&self) -> &StatusChannel {
        &self.status
    }

    /// Read access to the local inventory. Do not hold across a Sheets call.
    pub async fn inventory(&self) -> RwLockReadGuard<'_, Inventory> {
        self.inventory.read().await
    }

    pub async fn unit(&self, id: &str) -> Option<Unit> {
        self.inventory.read().await.get(id).cloned()
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Re-read the inventory sheet and replace the local collection.
    pub async fn refresh(&self) -> Result<RefreshSummary, SyncError> {
        self.status.begin(SyncActivity::Refresh);

        let rows = match self
            .client
            .read_rows(&self.layout.inventory, COLUMN_COUNT)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Refresh failed: {}", e);
                self.status.finish(false);
                return Err(e.into());
            }
        };

        let decoded = self.codec.decode_all(&rows);
        for (row, reason) in &decoded.skipped {
            tracing::debug!(row = *row, reason = %reason, "Skipped row");
        }

        let summary = RefreshSummary {
            units: decoded.units.len(),
            skipped: decoded.skipped.len(),
        };
        self.inventory.write().await.replace_all(decoded.units);
        self.status.finish(true);

        tracing::info!(
            units = summary.units,
            skipped = summary.skipped,
            rows = rows.len(),
            "Inventory refreshed"
        );
        Ok(summary)
    }

    // ========================================================================
    // Box mutations
    // ========================================================================

    /// Add new boxes, each in its own row above the summary row.
    pub async fn add_lot(&self, new_lot: NewLot) -> Result<MutationOutcome<Vec<Unit>>, SyncError> {
        let new_lot = NewLot {
            lot: self.codec.normalize_lot(new_lot.lot),
            ..new_lot
        };
        let units = self.inventory.write().await.add_lot(new_lot)?;
        tracing::info!(
            ids = ?units.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(),
            "Added boxes"
        );

        let synced = self
            .persist("add boxes", async {
                for unit in &units {
                    self.insert_unit_row(unit).await?;
                }
                Ok::<_, SyncError>(())
            })
            .await;

        Ok(MutationOutcome {
            data: units,
            synced,
        })
    }

    /// Edit a box; lot-level fields apply to its whole row.
    pub async fn update_unit(
        &self,
        id: &str,
        patch: &UnitPatch,
    ) -> Result<MutationOutcome<Unit>, SyncError> {
        let mut patch = patch.clone();
        if patch.location.as_deref().is_some_and(|l| l.trim().is_empty()) {
            patch.location = Some(self.codec.default_location().to_string());
        }

        let (unit, staged) = {
            let mut inventory = self.inventory.write().await;
            let unit = inventory.patch(id, &patch)?;
            let staged = StagedRow::stage(&mut inventory, &unit);
            let unit = inventory.get(id).cloned().unwrap_or(unit);
            (unit, staged)
        };
        tracing::info!(unit_id = %id, "Updated box");

        let synced = self
            .persist("update box", self.rewrite_row(&unit.id, staged))
            .await;
        Ok(MutationOutcome { data: unit, synced })
    }

    /// Consume cigars from a box, optionally logging it to history.
    pub async fn consume(
        &self,
        id: &str,
        count: u32,
        log: Option<ConsumeLog>,
    ) -> Result<MutationOutcome<Unit>, SyncError> {
        let (unit, staged) = {
            let mut inventory = self.inventory.write().await;
            let unit = inventory.consume(id, count)?;
            let staged = StagedRow::stage(&mut inventory, &unit);
            let unit = inventory.get(id).cloned().unwrap_or(unit);
            (unit, staged)
        };
        tracing::info!(unit_id = %id, count = count, remaining = unit.remaining, "Consumed");

        let entry = log.map(|log| HistoryEntry {
            date: SheetDate::from(Local::now().date_naive()),
            box_ref: unit.id.clone(),
            brand: unit.lot.brand.clone(),
            name: unit.lot.name.clone(),
            quantity: i64::from(count),
            notes: log.notes,
        });

        let synced = self
            .persist("consume", async {
                self.rewrite_row(&unit.id, staged).await?;
                if let Some(entry) = &entry {
                    self.client
                        .append_row(&self.layout.history, entry.encode())
                        .await?;
                }
                Ok::<_, SyncError>(())
            })
            .await;
        Ok(MutationOutcome { data: unit, synced })
    }

    /// Mark a box's lot as received or not. Only the received cell is written.
    pub async fn set_received(
        &self,
        id: &str,
        received: bool,
    ) -> Result<MutationOutcome<Unit>, SyncError> {
        let unit = self.inventory.write().await.set_received(id, received)?;
        tracing::info!(unit_id = %id, received = received, "Set received");

        let synced = self
            .persist("set received", async {
                let position = self.locate_row(&unit.id, &RowRef::of(&unit)).await?;
                self.client
                    .update_cell(
                        &self.layout.inventory,
                        Column::Received.index(),
                        position,
                        Cell::from(received),
                    )
                    .await?;
                Ok::<_, SyncError>(())
            })
            .await;
        Ok(MutationOutcome { data: unit, synced })
    }

    /// Remove a box. Its row is deleted, or rewritten when other boxes
    /// of the lot still live in it.
    pub async fn remove_unit(&self, id: &str) -> Result<MutationOutcome<Unit>, SyncError> {
        let (unit, change) = {
            let mut inventory = self.inventory.write().await;
            let unit = inventory.remove(id)?;
            let sibling = inventory
                .lot_members(&unit.row_key, unit.row_occurrence)
                .first()
                .map(|&u| u.clone());
            let change = match sibling {
                Some(sibling) => RowChange::Rewrite(StagedRow::stage(&mut inventory, &sibling)),
                None => RowChange::Delete(RowRef::of(&unit)),
            };
            (unit, change)
        };
        tracing::info!(unit_id = %id, "Removed box");

        let synced = self
            .persist("remove box", async {
                match change {
                    RowChange::Delete(at) => {
                        let position = self.locate_row(&unit.id, &at).await?;
                        self.client
                            .delete_row(&self.layout.inventory, position)
                            .await?;
                    }
                    RowChange::Rewrite(staged) => self.rewrite_row(&unit.id, staged).await?,
                }
                Ok::<_, SyncError>(())
            })
            .await;
        Ok(MutationOutcome { data: unit, synced })
    }

    // ========================================================================
    // History
    // ========================================================================

    pub async fn list_history(&self) -> Result<Vec<HistoryEntry>, SyncError> {
        let rows = self
            .client
            .read_rows(&self.layout.history, HISTORY_WIDTH)
            .await?;
        Ok(HistoryEntry::decode_all(&rows))
    }

    pub async fn append_history(&self, entry: HistoryEntry) -> Result<HistoryEntry, SyncError> {
        self.write(async {
            self.client
                .append_row(&self.layout.history, entry.encode())
                .await?;
            Ok::<_, SyncError>(())
        })
        .await?;
        Ok(entry)
    }

    /// Delete the first history row matching `key`.
    ///
    /// History rows have no identity; when several rows share the key the
    /// first one goes, whichever the caller meant.
    pub async fn delete_history(&self, key: &HistoryKey) -> Result<(), SyncError> {
        self.write(async {
            let rows = self
                .client
                .read_rows(&self.layout.history, HISTORY_WIDTH)
                .await?;

            let matches = count_history_matches(&rows, key);
            if matches > 1 {
                tracing::warn!(
                    matches = matches,
                    box_ref = %key.box_ref,
                    date = %key.date,
                    "Several history rows share this key; deleting the first"
                );
            }

            let position = locate_history(&rows, key).ok_or(SyncError::HistoryNotFound)?;
            self.client
                .delete_row(&self.layout.history, position)
                .await?;
            Ok::<_, SyncError>(())
        })
        .await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Run a write under the `writing` status and report its outcome.
    async fn write<F>(&self, write: F) -> Result<(), SyncError>
    where
        F: Future<Output = Result<(), SyncError>>,
    {
        self.status.begin(SyncActivity::Write);
        let result = write.await;
        self.status.finish(result.is_ok());
        result
    }

    /// Like [`Self::write`], for writes backing a local change that stays
    /// whether or not the sheet accepted it.
    async fn persist<F>(&self, action: &str, write: F) -> bool
    where
        F: Future<Output = Result<(), SyncError>>,
    {
        match self.write(write).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(action = action, "Remote write failed, local change kept: {}", e);
                false
            }
        }
    }

    /// Read the inventory sheet and find the row `at` refers to.
    async fn locate_row(&self, id: &str, at: &RowRef) -> Result<RowPosition, SyncError> {
        if at.key.trim().is_empty() {
            return Err(SyncError::Unlocatable(id.to_string()));
        }
        let rows = self
            .client
            .read_rows(&self.layout.inventory, COLUMN_COUNT)
            .await?;
        locate_unit_occurrence(&rows, &at.key, at.occurrence)
            .ok_or_else(|| SyncError::RowNotFound(at.key.clone()))
    }

    async fn rewrite_row(&self, id: &str, staged: StagedRow) -> Result<(), SyncError> {
        let position = self.locate_row(id, &staged.at).await?;
        self.client
            .update_row(
                &self.layout.inventory,
                position,
                self.codec.encode_lot(&staged.row),
            )
            .await?;
        Ok(())
    }

    /// Insert a box's row directly above the summary row. The first
    /// column is read again for every insert.
    async fn insert_unit_row(&self, unit: &Unit) -> Result<(), SyncError> {
        let column = self.client.read_column(&self.layout.inventory, 0).await?;
        let position = insertion_point(&column, &self.layout.sentinel);
        self.client
            .insert_row(&self.layout.inventory, position, self.codec.encode_unit(unit))
            .await?;
        Ok(())
    }
}
