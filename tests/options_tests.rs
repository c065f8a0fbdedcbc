//! # Option Cache Tests
//!
//! Loading, degrading and reloading the menu option lists.

use std::sync::Arc;

use cashflow_bot::bot::ConversationMachine;
use cashflow_bot::options::{
    OptionCache, OptionCategory, SheetNames, LOAD_ERROR_PLACEHOLDER, NO_DATA_PLACEHOLDER,
};
use cashflow_bot::sheets::InMemorySheets;

fn backend() -> InMemorySheets {
    InMemorySheets::new()
        .with_column("CtasIngresos", &["Ventas", "Intereses"])
        .with_column("CtasEgresos", &["Sueldos", " Materiales ", ""])
        .with_column("UnidadNegocio", &["Obra Norte"])
        .with_column("Cliente", &["ACME", "Globex"])
        .with_column("Moneda", &["ARS", "USD"])
        .with_column("MetodosPago", &["Efectivo"])
}

#[tokio::test]
async fn test_load_all_reads_every_category() {
    let cache = OptionCache::load_all(&backend(), SheetNames::default(), false).await;

    assert_eq!(
        cache.get(OptionCategory::IncomeAccounts).await,
        vec!["Ventas", "Intereses"]
    );
    // Cells are trimmed and blanks dropped
    assert_eq!(
        cache.get(OptionCategory::ExpenseAccounts).await,
        vec!["Sueldos", "Materiales"]
    );
    assert_eq!(
        cache.counts().await,
        vec![
            (OptionCategory::IncomeAccounts, 2),
            (OptionCategory::ExpenseAccounts, 2),
            (OptionCategory::BusinessUnits, 1),
            (OptionCategory::Clients, 2),
            (OptionCategory::Currencies, 2),
            (OptionCategory::PaymentMethods, 1),
        ]
    );
}

#[tokio::test]
async fn test_failing_sheet_does_not_block_others() {
    let sheets = backend();
    sheets.fail_reads_of("Cliente");

    let cache = OptionCache::load_all(&sheets, SheetNames::default(), false).await;

    assert_eq!(
        cache.get(OptionCategory::Clients).await,
        vec![LOAD_ERROR_PLACEHOLDER]
    );
    assert_eq!(cache.get(OptionCategory::Currencies).await, vec!["ARS", "USD"]);
    assert_eq!(cache.get(OptionCategory::PaymentMethods).await, vec!["Efectivo"]);
}

#[tokio::test]
async fn test_empty_and_missing_sheets_use_placeholders() {
    let sheets = InMemorySheets::new()
        .with_column("Moneda", &[])
        .with_column("Cliente", &["Cliente"]);
    let cache = OptionCache::load_all(&sheets, SheetNames::default(), true).await;

    assert_eq!(cache.get(OptionCategory::Currencies).await, vec![NO_DATA_PLACEHOLDER]);
    assert_eq!(cache.get(OptionCategory::Clients).await, vec![NO_DATA_PLACEHOLDER]);
    assert_eq!(
        cache.get(OptionCategory::BusinessUnits).await,
        vec![LOAD_ERROR_PLACEHOLDER]
    );
}

#[tokio::test]
async fn test_configured_sheet_names() {
    let sheets = backend().with_column("Met. Pago", &["Tarjeta", "Cheque"]);
    let mut names = SheetNames::default();
    names.set(OptionCategory::PaymentMethods, "Met. Pago");

    let cache = OptionCache::load_all(&sheets, names, false).await;
    assert_eq!(
        cache.get(OptionCategory::PaymentMethods).await,
        vec!["Tarjeta", "Cheque"]
    );
    assert_eq!(
        cache.sheet_names().get(OptionCategory::PaymentMethods),
        "Met. Pago"
    );
}

#[tokio::test]
async fn test_reload_picks_up_changes() {
    let cache = OptionCache::load_all(&backend(), SheetNames::default(), false).await;
    assert_eq!(cache.get(OptionCategory::Clients).await, vec!["ACME", "Globex"]);

    let updated = backend().with_column("Cliente", &["ACME", "Globex", "Initech"]);
    cache.reload(&updated).await;
    assert_eq!(
        cache.get(OptionCategory::Clients).await,
        vec!["ACME", "Globex", "Initech"]
    );
}

#[tokio::test]
async fn test_machine_reload_refreshes_menus() {
    let sheets = Arc::new(InMemorySheets::new().with_column("Cliente", &["ACME"]));
    let options = Arc::new(OptionCache::load_all(sheets.as_ref(), SheetNames::default(), false).await);
    let machine = ConversationMachine::new(Arc::clone(&sheets), options, "Base", "@bot");
    assert_eq!(
        machine.options().get(OptionCategory::Currencies).await,
        vec![LOAD_ERROR_PLACEHOLDER]
    );

    // The sheet shows up after start-up
    sheets.set_column("Moneda", &["ARS"]);
    machine.reload_options().await;
    assert_eq!(
        machine.options().get(OptionCategory::Currencies).await,
        vec!["ARS"]
    );
}
