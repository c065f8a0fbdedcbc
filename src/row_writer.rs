//! Appends finished transactions to the base sheet.

use std::sync::Arc;

use tracing::{error, info};

use crate::sheets::{SheetBackend, SheetError};
use crate::transaction::OutputRow;

/// Writes [`OutputRow`]s to one sheet; failures are returned, never retried
pub struct RowWriter<B> {
    backend: Arc<B>,
    sheet: String,
}

impl<B: SheetBackend> RowWriter<B> {
    pub fn new(backend: Arc<B>, sheet: impl Into<String>) -> Self {
        Self {
            backend,
            sheet: sheet.into(),
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub async fn append(&self, row: &OutputRow) -> Result<(), SheetError> {
        match self.backend.append_row(&self.sheet, &row.cells()).await {
            Ok(()) => {
                info!(sheet = %self.sheet, date = %row.date, kind = %row.transaction_type, "Transaction recorded");
                Ok(())
            }
            Err(e) => {
                error!(sheet = %self.sheet, error = %e, "Failed to record transaction");
                Err(e)
            }
        }
    }

    /// Row number the next append is expected to land on (1-based)
    pub async fn next_row_index(&self) -> Result<usize, SheetError> {
        Ok(self.backend.row_count(&self.sheet).await? + 1)
    }
}
