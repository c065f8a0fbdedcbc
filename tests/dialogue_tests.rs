//! # Dialogue Tests
//!
//! Drives the guided form end to end against the in-memory spreadsheet.

use std::sync::Arc;

use cashflow_bot::bot::ConversationMachine;
use cashflow_bot::dialogue::{ConversationState, Event, MenuChoice, Reply, SessionKey};
use cashflow_bot::localization::t_lang;
use cashflow_bot::options::{OptionCache, SheetNames};
use cashflow_bot::sheets::InMemorySheets;
use cashflow_bot::transaction::TransactionDraft;

const LANG: Option<&str> = Some("es");
const KEY: SessionKey = SessionKey {
    chat_id: 1001,
    user_id: 42,
};

#[derive(Clone, Copy)]
enum Answer {
    Text(&'static str),
    Pick(&'static str),
}

const EXPENSE_SCRIPT: [Answer; 9] = [
    Answer::Text("15/03/2024"),
    Answer::Pick("Gasto"),
    Answer::Pick("Comida"),
    Answer::Pick("Obra Norte"),
    Answer::Pick("ACME"),
    Answer::Text("Almuerzo equipo"),
    Answer::Pick("ARS"),
    Answer::Text("500"),
    Answer::Pick("Efectivo"),
];

fn backend() -> Arc<InMemorySheets> {
    Arc::new(
        InMemorySheets::new()
            .with_column("CtasIngresos", &["Ventas", "Intereses"])
            .with_column("CtasEgresos", &["Sueldos", "Materiales", "Comida"])
            .with_column("UnidadNegocio", &["Obra Norte", "Obra Sur"])
            .with_column("Cliente", &["ACME", "Globex"])
            .with_column("Moneda", &["ARS", "USD"])
            .with_column("MetodosPago", &["Efectivo", "Transferencia"]),
    )
}

async fn machine(backend: Arc<InMemorySheets>) -> ConversationMachine<InMemorySheets> {
    let options = Arc::new(OptionCache::load_all(backend.as_ref(), SheetNames::default(), false).await);
    ConversationMachine::new(backend, options, "Base", "@bot")
}

async fn pick(m: &ConversationMachine<InMemorySheets>, last: &Reply, label: &str) -> Option<Reply> {
    let Reply::Menu { state, options, .. } = last else {
        panic!("expected a menu before picking {label}, got {last:?}");
    };
    let index = options
        .iter()
        .position(|o| o == label)
        .unwrap_or_else(|| panic!("{label} not in menu {options:?}"));
    m.handle(KEY, Event::Choice(MenuChoice::new(*state, index)), LANG)
        .await
}

async fn answer(m: &ConversationMachine<InMemorySheets>, last: &Reply, answer: Answer) -> Option<Reply> {
    match answer {
        Answer::Text(text) => m.handle(KEY, Event::Text(text.to_string()), LANG).await,
        Answer::Pick(label) => pick(m, last, label).await,
    }
}

/// Start the form and feed it a script, returning the last reply
async fn run_script(m: &ConversationMachine<InMemorySheets>, script: &[Answer]) -> Reply {
    let mut reply = m.handle(KEY, Event::Start, LANG).await.unwrap();
    for step in script {
        reply = answer(m, &reply, *step).await.unwrap();
    }
    reply
}

fn script(date: &'static str, kind: &'static str, account: &'static str, amount: &'static str) -> [Answer; 9] {
    [
        Answer::Text(date),
        Answer::Pick(kind),
        Answer::Pick(account),
        Answer::Pick("Obra Sur"),
        Answer::Pick("Globex"),
        Answer::Text("Cobro factura"),
        Answer::Pick("USD"),
        Answer::Text(amount),
        Answer::Pick("Transferencia"),
    ]
}

#[tokio::test]
async fn test_start_prompts_for_date() {
    let m = machine(backend()).await;
    let reply = m.handle(KEY, Event::Start, LANG).await.unwrap();
    assert_eq!(reply, Reply::Text(t_lang("prompt-date", LANG)));

    let session = m.sessions().get(KEY).await.unwrap();
    assert_eq!(session.state, ConversationState::AwaitingDate);
    assert_eq!(session.draft, TransactionDraft::default());
}

#[tokio::test]
async fn test_states_follow_form_order() {
    let m = machine(backend()).await;
    let expected = [
        ConversationState::AwaitingType,
        ConversationState::AwaitingAccount,
        ConversationState::AwaitingBusinessUnit,
        ConversationState::AwaitingClient,
        ConversationState::AwaitingConcept,
        ConversationState::AwaitingCurrency,
        ConversationState::AwaitingAmount,
        ConversationState::AwaitingPaymentMethod,
    ];

    let mut reply = m.handle(KEY, Event::Start, LANG).await.unwrap();
    for (step, state) in EXPENSE_SCRIPT.iter().zip(expected) {
        reply = answer(&m, &reply, *step).await.unwrap();
        assert_eq!(m.sessions().get(KEY).await.unwrap().state, state);
    }
}

#[tokio::test]
async fn test_expense_row_written() {
    let sheets = backend();
    let m = machine(Arc::clone(&sheets)).await;

    let reply = run_script(&m, &EXPENSE_SCRIPT).await;
    assert_eq!(reply, Reply::Text(t_lang("record-saved", LANG)));

    assert_eq!(
        sheets.rows("Base"),
        vec![vec![
            "Gasto", "15/03/2024", "Obra Norte", "Comida", "ACME", "Almuerzo equipo", "ARS",
            "", "500", "3", "2024", "Efectivo"
        ]]
    );
    assert!(m.sessions().get(KEY).await.is_none());
}

#[tokio::test]
async fn test_income_and_expense_split_matches_type() {
    let cases = [
        ("01/01/2023", "Ingreso", "Ventas", "1000", 1, 2023),
        ("28/02/2024", "Gasto", "Sueldos", "250.75", 2, 2024),
        ("31/12/2025", "Ingreso", "Intereses", "3", 12, 2025),
        ("9/7/2024", "Gasto", "Materiales", "12", 7, 2024),
    ];

    for (date, kind, account, amount, month, year) in cases {
        let sheets = backend();
        let m = machine(Arc::clone(&sheets)).await;
        run_script(&m, &script(date, kind, account, amount)).await;

        let rows = sheets.rows("Base");
        assert_eq!(rows.len(), 1, "{date} {kind}");
        let row = &rows[0];
        assert_eq!(row[0], kind);
        assert_eq!(row[3], account);
        if kind == "Ingreso" {
            assert_eq!((row[7].as_str(), row[8].as_str()), (amount, ""));
        } else {
            assert_eq!((row[7].as_str(), row[8].as_str()), ("", amount));
        }
        assert_eq!(row[9], month.to_string());
        assert_eq!(row[10], year.to_string());
    }
}

#[tokio::test]
async fn test_account_menu_depends_on_type() {
    let m = machine(backend()).await;
    m.handle(KEY, Event::Start, LANG).await;
    let type_menu = m
        .handle(KEY, Event::Text("15/03/2024".to_string()), LANG)
        .await
        .unwrap();

    let accounts = pick(&m, &type_menu, "Ingreso").await.unwrap();
    match accounts {
        Reply::Menu { state, options, .. } => {
            assert_eq!(state, ConversationState::AwaitingAccount);
            assert_eq!(options, vec!["Ventas", "Intereses"]);
        }
        other => panic!("expected account menu, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_dates_write_nothing() {
    for date in ["31-02-2024", "hello", "31/02/2024"] {
        let sheets = backend();
        let m = machine(Arc::clone(&sheets)).await;

        let reply = run_script(&m, &script(date, "Gasto", "Comida", "10")).await;
        assert_eq!(reply, Reply::Text(t_lang("record-invalid-date", LANG)), "{date}");
        assert!(sheets.rows("Base").is_empty(), "{date} should not be written");
        assert!(m.sessions().get(KEY).await.is_none());
    }
}

#[tokio::test]
async fn test_cancel_from_every_state_writes_nothing() {
    for steps in 0..EXPENSE_SCRIPT.len() {
        let sheets = backend();
        let m = machine(Arc::clone(&sheets)).await;

        let mut reply = m.handle(KEY, Event::Start, LANG).await.unwrap();
        for step in &EXPENSE_SCRIPT[..steps] {
            reply = answer(&m, &reply, *step).await.unwrap();
        }

        let cancelled = m.handle(KEY, Event::Cancel, LANG).await.unwrap();
        assert_eq!(cancelled, Reply::Text(t_lang("conversation-cancelled", LANG)));
        assert!(m.sessions().get(KEY).await.is_none(), "after {steps} steps");
        assert!(sheets.rows("Base").is_empty());
    }
}

#[tokio::test]
async fn test_cancel_without_conversation() {
    let m = machine(backend()).await;
    let reply = m.handle(KEY, Event::Cancel, LANG).await.unwrap();
    assert_eq!(reply, Reply::Text(t_lang("nothing-to-cancel", LANG)));
}

#[tokio::test]
async fn test_restart_mid_conversation_clears_draft() {
    let sheets = backend();
    let m = machine(Arc::clone(&sheets)).await;

    let mut reply = m.handle(KEY, Event::Start, LANG).await.unwrap();
    for step in &EXPENSE_SCRIPT[..5] {
        reply = answer(&m, &reply, *step).await.unwrap();
    }
    assert!(m.sessions().get(KEY).await.unwrap().draft.client.is_some());

    let restarted = m.handle(KEY, Event::Start, LANG).await.unwrap();
    assert_eq!(restarted, Reply::Text(t_lang("prompt-date", LANG)));

    let session = m.sessions().get(KEY).await.unwrap();
    assert_eq!(session.state, ConversationState::AwaitingDate);
    assert_eq!(session.draft, TransactionDraft::default());

    // The fresh conversation completes normally
    run_script(&m, &EXPENSE_SCRIPT).await;
    assert_eq!(sheets.rows("Base").len(), 1);
}

#[tokio::test]
async fn test_text_while_menu_open_repeats_menu() {
    let m = machine(backend()).await;
    m.handle(KEY, Event::Start, LANG).await;
    let type_menu = m
        .handle(KEY, Event::Text("15/03/2024".to_string()), LANG)
        .await
        .unwrap();

    let reply = m
        .handle(KEY, Event::Text("Gasto".to_string()), LANG)
        .await
        .unwrap();
    match (&reply, &type_menu) {
        (
            Reply::Menu { state, options, prompt },
            Reply::Menu { options: shown, .. },
        ) => {
            assert_eq!(*state, ConversationState::AwaitingType);
            assert_eq!(options, shown);
            assert_eq!(prompt, &t_lang("prompt-use-menu", LANG));
        }
        _ => panic!("expected menus, got {reply:?}"),
    }
    assert_eq!(
        m.sessions().get(KEY).await.unwrap().state,
        ConversationState::AwaitingType
    );
}

#[tokio::test]
async fn test_stale_menu_button_is_ignored() {
    let m = machine(backend()).await;
    m.handle(KEY, Event::Start, LANG).await;
    let type_menu = m
        .handle(KEY, Event::Text("15/03/2024".to_string()), LANG)
        .await
        .unwrap();
    pick(&m, &type_menu, "Gasto").await.unwrap();

    // Pressing the type menu again once the account menu is open
    let stale = m
        .handle(
            KEY,
            Event::Choice(MenuChoice::new(ConversationState::AwaitingType, 0)),
            LANG,
        )
        .await;
    assert!(stale.is_none());

    let session = m.sessions().get(KEY).await.unwrap();
    assert_eq!(session.state, ConversationState::AwaitingAccount);
    assert_eq!(
        session.draft.transaction_type,
        Some(cashflow_bot::transaction::TransactionType::Expense)
    );
}

#[tokio::test]
async fn test_stale_button_while_text_expected_reprompts() {
    let m = machine(backend()).await;
    let mut reply = m.handle(KEY, Event::Start, LANG).await.unwrap();
    for step in &EXPENSE_SCRIPT[..5] {
        reply = answer(&m, &reply, *step).await.unwrap();
    }
    assert_eq!(reply, Reply::Text(t_lang("prompt-concept", LANG)));

    let stale = m
        .handle(
            KEY,
            Event::Choice(MenuChoice::new(ConversationState::AwaitingClient, 1)),
            LANG,
        )
        .await;
    assert_eq!(stale, Some(Reply::Text(t_lang("prompt-use-text", LANG))));

    let session = m.sessions().get(KEY).await.unwrap();
    assert_eq!(session.state, ConversationState::AwaitingConcept);
    assert_eq!(session.draft.client.as_deref(), Some("ACME"));
}

#[tokio::test]
async fn test_out_of_range_choice_is_ignored() {
    let m = machine(backend()).await;
    m.handle(KEY, Event::Start, LANG).await;
    m.handle(KEY, Event::Text("15/03/2024".to_string()), LANG)
        .await;

    let reply = m
        .handle(
            KEY,
            Event::Choice(MenuChoice::new(ConversationState::AwaitingType, 9)),
            LANG,
        )
        .await;
    assert!(reply.is_none());
    assert_eq!(
        m.sessions().get(KEY).await.unwrap().state,
        ConversationState::AwaitingType
    );
}

#[tokio::test]
async fn test_choice_without_conversation() {
    let m = machine(backend()).await;
    let reply = m
        .handle(
            KEY,
            Event::Choice(MenuChoice::new(ConversationState::AwaitingType, 0)),
            LANG,
        )
        .await;
    assert!(reply.is_none());
}

#[tokio::test]
async fn test_write_failure_is_reported_and_session_ends() {
    let sheets = backend();
    sheets.fail_writes(true);
    let m = machine(Arc::clone(&sheets)).await;

    let reply = run_script(&m, &EXPENSE_SCRIPT).await;
    assert!(reply.text().starts_with("❌"));
    assert!(reply.text().contains("The caller does not have permission"));
    assert!(m.sessions().get(KEY).await.is_none());
    assert!(sheets.rows("Base").is_empty());
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let sheets = backend();
    let m = machine(Arc::clone(&sheets)).await;
    let other = SessionKey::new(1001, 43);

    m.handle(KEY, Event::Start, LANG).await;
    m.handle(other, Event::Start, LANG).await;
    m.handle(KEY, Event::Text("15/03/2024".to_string()), LANG)
        .await;
    m.handle(other, Event::Cancel, LANG).await;

    assert_eq!(
        m.sessions().get(KEY).await.unwrap().state,
        ConversationState::AwaitingType
    );
    assert!(m.sessions().get(other).await.is_none());
}
