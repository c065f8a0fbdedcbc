//! In-process spreadsheet used by the test-suite.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{SheetBackend, SheetError};

/// Sheets held in memory as rows of cells, with switchable failures
#[derive(Debug, Default)]
pub struct InMemorySheets {
    sheets: Mutex<HashMap<String, Vec<Vec<String>>>>,
    failing_reads: Mutex<HashSet<String>>,
    failing_writes: Mutex<bool>,
}

impl InMemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) a sheet whose column A holds `values`
    pub fn with_column(self, sheet: &str, values: &[&str]) -> Self {
        self.set_column(sheet, values);
        self
    }

    /// Replace a sheet in place with a single column of `values`
    pub fn set_column(&self, sheet: &str, values: &[&str]) {
        let rows = values.iter().map(|v| vec![v.to_string()]).collect();
        self.sheets.lock().unwrap().insert(sheet.to_string(), rows);
    }

    /// Make every read of `sheet` fail
    pub fn fail_reads_of(&self, sheet: &str) {
        self.failing_reads.lock().unwrap().insert(sheet.to_string());
    }

    /// Make every append fail
    pub fn fail_writes(&self, fail: bool) {
        *self.failing_writes.lock().unwrap() = fail;
    }

    /// Snapshot of the rows of one sheet
    pub fn rows(&self, sheet: &str) -> Vec<Vec<String>> {
        self.sheets
            .lock()
            .unwrap()
            .get(sheet)
            .cloned()
            .unwrap_or_default()
    }
}

impl SheetBackend for InMemorySheets {
    async fn read_column(&self, sheet: &str, column: usize) -> Result<Vec<String>, SheetError> {
        if self.failing_reads.lock().unwrap().contains(sheet) {
            return Err(SheetError::Transport(format!("read of {sheet} refused")));
        }
        let sheets = self.sheets.lock().unwrap();
        let rows = sheets
            .get(sheet)
            .ok_or_else(|| SheetError::SheetNotFound(sheet.to_string()))?;
        let mut cells: Vec<String> = rows
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or_default())
            .collect();
        while cells.last().is_some_and(|cell| cell.is_empty()) {
            cells.pop();
        }
        Ok(cells)
    }

    async fn append_row(&self, sheet: &str, values: &[String]) -> Result<(), SheetError> {
        if *self.failing_writes.lock().unwrap() {
            return Err(SheetError::Api {
                status: 403,
                message: "The caller does not have permission".to_string(),
            });
        }
        self.sheets
            .lock()
            .unwrap()
            .entry(sheet.to_string())
            .or_default()
            .push(values.to_vec());
        Ok(())
    }
}
