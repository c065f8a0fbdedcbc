//! # Transaction Model
//!
//! The draft a conversation fills in and the spreadsheet row it becomes.

use chrono::{Datelike, NaiveDate};

/// Date format users type and the spreadsheet stores (`DD/MM/YYYY`)
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Number of cells in an [`OutputRow`]
pub const ROW_WIDTH: usize = 12;

/// Account cell written for quick entries, which never ask for one
pub const UNSPECIFIED_ACCOUNT: &str = "-";

/// Direction of the money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub const ALL: [TransactionType; 2] = [TransactionType::Income, TransactionType::Expense];

    /// Label shown on the type menu and written in the `type` column
    pub fn label(self) -> &'static str {
        match self {
            TransactionType::Income => "Ingreso",
            TransactionType::Expense => "Gasto",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The nine fields of a transaction, in the order the form asks for them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Date,
    Type,
    Account,
    BusinessUnit,
    Client,
    Concept,
    Currency,
    Amount,
    PaymentMethod,
}

impl DraftField {
    pub const ALL: [DraftField; 9] = [
        DraftField::Date,
        DraftField::Type,
        DraftField::Account,
        DraftField::BusinessUnit,
        DraftField::Client,
        DraftField::Concept,
        DraftField::Currency,
        DraftField::Amount,
        DraftField::PaymentMethod,
    ];

    /// Localization key of the field's display name
    pub fn message_key(self) -> &'static str {
        match self {
            DraftField::Date => "field-date",
            DraftField::Type => "field-type",
            DraftField::Account => "field-account",
            DraftField::BusinessUnit => "field-business-unit",
            DraftField::Client => "field-client",
            DraftField::Concept => "field-concept",
            DraftField::Currency => "field-currency",
            DraftField::Amount => "field-amount",
            DraftField::PaymentMethod => "field-payment-method",
        }
    }
}

/// In-progress record for one conversation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionDraft {
    pub transaction_type: Option<TransactionType>,
    pub date: Option<String>,
    pub account: Option<String>,
    pub business_unit: Option<String>,
    pub client: Option<String>,
    pub concept: Option<String>,
    pub currency: Option<String>,
    pub amount: Option<String>,
    pub payment_method: Option<String>,
    /// Sheet row the quick entry expects to land on
    pub row_index: Option<usize>,
}

impl TransactionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_set(&self, field: DraftField) -> bool {
        match field {
            DraftField::Type => self.transaction_type.is_some(),
            DraftField::Date => self.date.is_some(),
            DraftField::Account => self.account.is_some(),
            DraftField::BusinessUnit => self.business_unit.is_some(),
            DraftField::Client => self.client.is_some(),
            DraftField::Concept => self.concept.is_some(),
            DraftField::Currency => self.currency.is_some(),
            DraftField::Amount => self.amount.is_some(),
            DraftField::PaymentMethod => self.payment_method.is_some(),
        }
    }

    /// Unset fields, in form order
    pub fn missing_fields(&self) -> Vec<DraftField> {
        DraftField::ALL
            .into_iter()
            .filter(|field| !self.is_set(*field))
            .collect()
    }
}

/// Why a draft could not become a row
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeError {
    MissingFields(Vec<DraftField>),
    InvalidDate(String),
}

impl std::fmt::Display for FinalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalizeError::MissingFields(fields) => write!(f, "Missing fields: {fields:?}"),
            FinalizeError::InvalidDate(text) => write!(f, "Invalid date: {text}"),
        }
    }
}

impl std::error::Error for FinalizeError {}

/// Parse a `DD/MM/YYYY` date
pub fn parse_date(text: &str) -> Result<NaiveDate, FinalizeError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|_| FinalizeError::InvalidDate(text.to_string()))
}

/// Spreadsheet row in canonical column order
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub transaction_type: TransactionType,
    pub date: String,
    pub business_unit: String,
    pub account: String,
    pub client: String,
    pub concept: String,
    pub currency: String,
    pub income_amount: String,
    pub expense_amount: String,
    pub month: u32,
    pub year: i32,
    pub payment_method: String,
}

impl OutputRow {
    /// Build a row from a complete draft
    ///
    /// Every field must be present and the date must parse; the income and
    /// expense columns are split on the transaction type.
    pub fn from_draft(draft: &TransactionDraft) -> Result<Self, FinalizeError> {
        let (
            Some(transaction_type),
            Some(date),
            Some(account),
            Some(business_unit),
            Some(client),
            Some(concept),
            Some(currency),
            Some(amount),
            Some(payment_method),
        ) = (
            draft.transaction_type,
            draft.date.clone(),
            draft.account.clone(),
            draft.business_unit.clone(),
            draft.client.clone(),
            draft.concept.clone(),
            draft.currency.clone(),
            draft.amount.clone(),
            draft.payment_method.clone(),
        )
        else {
            return Err(FinalizeError::MissingFields(draft.missing_fields()));
        };

        let parsed = parse_date(&date)?;
        let (income_amount, expense_amount) = match transaction_type {
            TransactionType::Income => (amount, String::new()),
            TransactionType::Expense => (String::new(), amount),
        };

        Ok(Self {
            transaction_type,
            date: date.trim().to_string(),
            business_unit,
            account,
            client,
            concept,
            currency,
            income_amount,
            expense_amount,
            month: parsed.month(),
            year: parsed.year(),
            payment_method,
        })
    }

    /// Cell values in column order
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.transaction_type.label().to_string(),
            self.date.clone(),
            self.business_unit.clone(),
            self.account.clone(),
            self.client.clone(),
            self.concept.clone(),
            self.currency.clone(),
            self.income_amount.clone(),
            self.expense_amount.clone(),
            self.month.to_string(),
            self.year.to_string(),
            self.payment_method.clone(),
        ]
    }
}
