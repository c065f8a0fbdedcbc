//! # Option Cache
//!
//! Menu choices (accounts, business units, clients, currencies, payment
//! methods) live in auxiliary sheet tabs, one list per tab in column A.
//! They are read once at start-up and kept in memory; operators can
//! `reload()` them without restarting the bot.
//!
//! A tab that cannot be read never stops the bot: its list becomes a single
//! placeholder entry instead.

use std::collections::HashMap;

use log::{info, warn};
use tokio::sync::RwLock;

use crate::sheets::SheetBackend;
use crate::transaction::TransactionType;

/// Placeholder list entry for a readable but empty tab
pub const NO_DATA_PLACEHOLDER: &str = "(Sin datos disponibles)";
/// Placeholder list entry for a tab that could not be read
pub const LOAD_ERROR_PLACEHOLDER: &str = "(Error obteniendo datos)";

/// The option lists the form draws its menus from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionCategory {
    IncomeAccounts,
    ExpenseAccounts,
    BusinessUnits,
    Clients,
    Currencies,
    PaymentMethods,
}

impl OptionCategory {
    pub const ALL: [OptionCategory; 6] = [
        OptionCategory::IncomeAccounts,
        OptionCategory::ExpenseAccounts,
        OptionCategory::BusinessUnits,
        OptionCategory::Clients,
        OptionCategory::Currencies,
        OptionCategory::PaymentMethods,
    ];

    /// Account list matching a transaction type
    pub fn accounts_for(transaction_type: TransactionType) -> Self {
        match transaction_type {
            TransactionType::Income => OptionCategory::IncomeAccounts,
            TransactionType::Expense => OptionCategory::ExpenseAccounts,
        }
    }

    /// Tab name used when none is configured
    pub fn default_sheet(self) -> &'static str {
        match self {
            OptionCategory::IncomeAccounts => "CtasIngresos",
            OptionCategory::ExpenseAccounts => "CtasEgresos",
            OptionCategory::BusinessUnits => "UnidadNegocio",
            OptionCategory::Clients => "Cliente",
            OptionCategory::Currencies => "Moneda",
            OptionCategory::PaymentMethods => "MetodosPago",
        }
    }

    /// Localization key of the category's display name
    pub fn message_key(self) -> &'static str {
        match self {
            OptionCategory::IncomeAccounts => "category-income-accounts",
            OptionCategory::ExpenseAccounts => "category-expense-accounts",
            OptionCategory::BusinessUnits => "category-business-units",
            OptionCategory::Clients => "category-clients",
            OptionCategory::Currencies => "category-currencies",
            OptionCategory::PaymentMethods => "category-payment-methods",
        }
    }

    /// Suffix of the `SHEET_*` environment variable overriding the tab name
    pub fn env_suffix(self) -> &'static str {
        match self {
            OptionCategory::IncomeAccounts => "INCOME_ACCOUNTS",
            OptionCategory::ExpenseAccounts => "EXPENSE_ACCOUNTS",
            OptionCategory::BusinessUnits => "BUSINESS_UNITS",
            OptionCategory::Clients => "CLIENTS",
            OptionCategory::Currencies => "CURRENCIES",
            OptionCategory::PaymentMethods => "PAYMENT_METHODS",
        }
    }
}

/// Tab name for each option category
#[derive(Debug, Clone, PartialEq)]
pub struct SheetNames {
    names: HashMap<OptionCategory, String>,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            names: OptionCategory::ALL
                .into_iter()
                .map(|c| (c, c.default_sheet().to_string()))
                .collect(),
        }
    }
}

impl SheetNames {
    pub fn set(&mut self, category: OptionCategory, sheet: impl Into<String>) {
        self.names.insert(category, sheet.into());
    }

    pub fn get(&self, category: OptionCategory) -> &str {
        self.names
            .get(&category)
            .map(String::as_str)
            .unwrap_or_else(|| category.default_sheet())
    }
}

/// Read the option list stored in column A of `sheet`
///
/// With `skip_header` the first row is dropped, blank or not, before empty
/// cells are removed. Never fails: read errors and empty tabs yield a
/// one-element placeholder.
pub async fn load<B: SheetBackend>(backend: &B, sheet: &str, skip_header: bool) -> Vec<String> {
    match backend.read_column(sheet, 0).await {
        Ok(values) => {
            let values: Vec<String> = values
                .into_iter()
                .skip(usize::from(skip_header))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if values.is_empty() {
                warn!("Sheet {} has no options", sheet);
                vec![NO_DATA_PLACEHOLDER.to_string()]
            } else {
                info!("Loaded {} options from {}", values.len(), sheet);
                values
            }
        }
        Err(e) => {
            warn!("Failed to load options from {}: {}", sheet, e);
            vec![LOAD_ERROR_PLACEHOLDER.to_string()]
        }
    }
}

/// In-memory option lists, shared by every conversation
#[derive(Debug)]
pub struct OptionCache {
    sheets: SheetNames,
    skip_header: bool,
    lists: RwLock<HashMap<OptionCategory, Vec<String>>>,
}

impl OptionCache {
    /// Create an empty cache; every list reads as the no-data placeholder until loaded
    pub fn new(sheets: SheetNames, skip_header: bool) -> Self {
        Self {
            sheets,
            skip_header,
            lists: RwLock::new(HashMap::new()),
        }
    }

    /// Create a cache and load every list
    pub async fn load_all<B: SheetBackend>(backend: &B, sheets: SheetNames, skip_header: bool) -> Self {
        let cache = Self::new(sheets, skip_header);
        cache.reload(backend).await;
        cache
    }

    /// Re-read every list from the spreadsheet
    pub async fn reload<B: SheetBackend>(&self, backend: &B) {
        let mut fresh = HashMap::new();
        for category in OptionCategory::ALL {
            let values = load(backend, self.sheets.get(category), self.skip_header).await;
            fresh.insert(category, values);
        }
        *self.lists.write().await = fresh;
    }

    /// Current list for a category
    pub async fn get(&self, category: OptionCategory) -> Vec<String> {
        self.lists
            .read()
            .await
            .get(&category)
            .cloned()
            .unwrap_or_else(|| vec![NO_DATA_PLACEHOLDER.to_string()])
    }

    /// Number of entries per category, in category order
    pub async fn counts(&self) -> Vec<(OptionCategory, usize)> {
        let lists = self.lists.read().await;
        OptionCategory::ALL
            .into_iter()
            .map(|c| (c, lists.get(&c).map_or(0, Vec::len)))
            .collect()
    }

    pub fn sheet_names(&self) -> &SheetNames {
        &self.sheets
    }
}
