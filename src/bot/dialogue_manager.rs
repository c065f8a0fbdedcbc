//! Dialogue Manager module for handling dialogue state transitions
//!
//! [`ConversationMachine`] owns the session map and moves each session
//! through the form one input at a time. It knows nothing about Telegram:
//! events come in as [`Event`]s and leave as [`Reply`]s.

use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::dialogue::{
    ConversationState, Event, ExpectedInput, MenuChoice, Reply, Session, SessionKey, SessionStore,
};
use crate::localization::{t_args_lang, t_lang};
use crate::options::{OptionCache, OptionCategory};
use crate::quick_entry::{QuickEntryError, QuickEntryParser};
use crate::row_writer::RowWriter;
use crate::sheets::SheetBackend;
use crate::transaction::{
    FinalizeError, OutputRow, TransactionDraft, TransactionType, UNSPECIFIED_ACCOUNT,
};

/// Result of feeding one input to a session
enum Step {
    /// Session moved on (or stayed put) and waits for more input
    Continue(Session, Reply),
    /// All fields collected; write the row
    Finalize(Session),
}

/// The transaction form state machine
pub struct ConversationMachine<B> {
    sessions: SessionStore,
    options: Arc<OptionCache>,
    backend: Arc<B>,
    writer: RowWriter<B>,
    parser: QuickEntryParser,
}

impl<B: SheetBackend> ConversationMachine<B> {
    pub fn new(backend: Arc<B>, options: Arc<OptionCache>, base_sheet: &str, mention: &str) -> Self {
        Self {
            sessions: SessionStore::new(),
            options,
            writer: RowWriter::new(Arc::clone(&backend), base_sheet),
            backend,
            parser: QuickEntryParser::new(mention),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn options(&self) -> &OptionCache {
        &self.options
    }

    pub fn mention(&self) -> &str {
        self.parser.mention()
    }

    /// Re-read every option list from the spreadsheet
    pub async fn reload_options(&self) {
        self.options.reload(self.backend.as_ref()).await;
    }

    /// Handle one event for a session
    ///
    /// Returns `None` when the event needs no answer (e.g. a stale menu button).
    pub async fn handle(
        &self,
        key: SessionKey,
        event: Event,
        language_code: Option<&str>,
    ) -> Option<Reply> {
        match event {
            Event::Start => Some(self.start(key, language_code).await),
            Event::Cancel => Some(self.cancel(key, language_code).await),
            Event::Text(text) => Some(self.handle_text(key, text, language_code).await),
            Event::Choice(choice) => self.handle_choice(key, choice).await,
        }
    }

    /// Clear any draft and ask for the date
    async fn start(&self, key: SessionKey, language_code: Option<&str>) -> Reply {
        if self
            .sessions
            .begin(key, Session::new(language_code))
            .await
            .is_some()
        {
            info!(session = %key, "Restarted conversation, previous draft discarded");
        } else {
            info!(session = %key, "Started conversation");
        }
        Reply::Text(t_lang("prompt-date", language_code))
    }

    async fn cancel(&self, key: SessionKey, language_code: Option<&str>) -> Reply {
        match self.sessions.take(key).await {
            Some(session) => {
                info!(session = %key, state = ?session.state, "Conversation cancelled");
                Reply::Text(t_lang(
                    "conversation-cancelled",
                    session.language_code.as_deref().or(language_code),
                ))
            }
            None => Reply::Text(t_lang("nothing-to-cancel", language_code)),
        }
    }

    async fn handle_text(&self, key: SessionKey, text: String, language_code: Option<&str>) -> Reply {
        let Some(session) = self.sessions.take(key).await else {
            return self.begin_quick_entry(key, &text, language_code).await;
        };

        match session.state.expected_input() {
            ExpectedInput::Text | ExpectedInput::TextOrChoice => {
                let value = text.trim().to_string();
                self.apply(key, session, value).await
            }
            ExpectedInput::Choice => {
                debug!(session = %key, state = ?session.state, "Text received while a menu is open");
                let lang = session.language_code.clone();
                let reply = Reply::Menu {
                    prompt: t_lang("prompt-use-menu", lang.as_deref()),
                    state: session.state,
                    options: session.menu.clone(),
                };
                self.sessions.put(key, session).await;
                reply
            }
            ExpectedInput::Nothing => Reply::Text(t_lang("nothing-to-cancel", language_code)),
        }
    }

    async fn handle_choice(&self, key: SessionKey, choice: MenuChoice) -> Option<Reply> {
        let session = self.sessions.take(key).await?;

        if choice.state != session.state {
            debug!(session = %key, state = ?session.state, button = ?choice.state, "Ignoring stale menu button");
            // A newer menu is already on screen; only text states need a nudge
            let reply = (session.state.expected_input() == ExpectedInput::Text)
                .then(|| Reply::Text(t_lang("prompt-use-text", session.language_code.as_deref())));
            self.sessions.put(key, session).await;
            return reply;
        }

        match session.state.expected_input() {
            ExpectedInput::Choice | ExpectedInput::TextOrChoice => {
                match session.menu.get(choice.index).cloned() {
                    Some(value) => Some(self.apply(key, session, value).await),
                    None => {
                        warn!(session = %key, index = choice.index, "Menu index out of range");
                        self.sessions.put(key, session).await;
                        None
                    }
                }
            }
            _ => {
                let reply = Reply::Text(t_lang("prompt-use-text", session.language_code.as_deref()));
                self.sessions.put(key, session).await;
                Some(reply)
            }
        }
    }

    /// Record one value and either store the advanced session or finish it
    async fn apply(&self, key: SessionKey, session: Session, value: String) -> Reply {
        match self.advance(session, value).await {
            Step::Continue(session, reply) => {
                debug!(session = %key, state = ?session.state, "Advanced conversation");
                self.sessions.put(key, session).await;
                reply
            }
            Step::Finalize(session) => self.finalize(key, session).await,
        }
    }

    /// Store `value` in the field the session is waiting for and present the next question
    async fn advance(&self, mut session: Session, value: String) -> Step {
        let lang = session.language_code.clone();
        let lang = lang.as_deref();
        let draft = &mut session.draft;

        let (next, prompt_key, menu) = match session.state {
            ConversationState::AwaitingDate => {
                draft.date = Some(value);
                let labels: Vec<String> = TransactionType::ALL.iter().map(|t| t.label().to_string()).collect();
                (ConversationState::AwaitingType, "prompt-type", Some(labels))
            }
            ConversationState::AwaitingType => {
                let Some(transaction_type) = TransactionType::from_label(&value) else {
                    let reply = self.menu_reply(&session, "prompt-use-menu");
                    return Step::Continue(session, reply);
                };
                draft.transaction_type = Some(transaction_type);
                let accounts = self.options.get(OptionCategory::accounts_for(transaction_type)).await;
                (ConversationState::AwaitingAccount, "prompt-account", Some(accounts))
            }
            ConversationState::AwaitingAccount => {
                draft.account = Some(value);
                let units = self.options.get(OptionCategory::BusinessUnits).await;
                (ConversationState::AwaitingBusinessUnit, "prompt-business-unit", Some(units))
            }
            ConversationState::AwaitingBusinessUnit => {
                draft.business_unit = Some(value);
                let clients = self.options.get(OptionCategory::Clients).await;
                (ConversationState::AwaitingClient, "prompt-client", Some(clients))
            }
            ConversationState::AwaitingClient => {
                draft.client = Some(value);
                (ConversationState::AwaitingConcept, "prompt-concept", None)
            }
            ConversationState::AwaitingConcept => {
                draft.concept = Some(value);
                let currencies = self.options.get(OptionCategory::Currencies).await;
                (ConversationState::AwaitingCurrency, "prompt-currency", Some(currencies))
            }
            ConversationState::AwaitingCurrency => {
                draft.currency = Some(value);
                (ConversationState::AwaitingAmount, "prompt-amount", None)
            }
            ConversationState::AwaitingAmount => {
                draft.amount = Some(value);
                let methods = self.options.get(OptionCategory::PaymentMethods).await;
                (ConversationState::AwaitingPaymentMethod, "prompt-payment-method", Some(methods))
            }
            ConversationState::AwaitingPaymentMethod | ConversationState::QuickPaymentMethod => {
                draft.payment_method = Some(value);
                session.state = ConversationState::Complete;
                return Step::Finalize(session);
            }
            ConversationState::QuickBusinessUnit => {
                draft.business_unit = Some(value);
                let clients = self.options.get(OptionCategory::Clients).await;
                (ConversationState::QuickClient, "quick-prompt-client", Some(clients))
            }
            ConversationState::QuickClient => {
                draft.client = Some(value);
                let methods = self.options.get(OptionCategory::PaymentMethods).await;
                (ConversationState::QuickPaymentMethod, "quick-prompt-payment-method", Some(methods))
            }
            ConversationState::Complete => return Step::Finalize(session),
        };

        session.state = next;
        let reply = match menu {
            Some(options) => {
                session.menu = options;
                self.menu_reply(&session, prompt_key)
            }
            None => {
                session.menu.clear();
                Reply::Text(t_lang(prompt_key, lang))
            }
        };
        Step::Continue(session, reply)
    }

    fn menu_reply(&self, session: &Session, prompt_key: &str) -> Reply {
        Reply::Menu {
            prompt: t_lang(prompt_key, session.language_code.as_deref()),
            state: session.state,
            options: session.menu.clone(),
        }
    }

    /// Validate the draft, write the row and report the outcome
    ///
    /// The session has already been removed from the store; nothing here
    /// puts it back.
    async fn finalize(&self, key: SessionKey, session: Session) -> Reply {
        let lang = session.language_code.as_deref();
        let draft = &session.draft;

        let row = match OutputRow::from_draft(draft) {
            Ok(row) => row,
            Err(FinalizeError::MissingFields(fields)) => {
                warn!(session = %key, missing = ?fields, "Draft incomplete, nothing written");
                let names = fields
                    .iter()
                    .map(|f| t_lang(f.message_key(), lang))
                    .collect::<Vec<_>>()
                    .join(", ");
                return Reply::Text(t_args_lang("record-missing-fields", &[("fields", names.as_str())], lang));
            }
            Err(FinalizeError::InvalidDate(date)) => {
                warn!(session = %key, date = %date, "Invalid date, nothing written");
                return Reply::Text(t_lang("record-invalid-date", lang));
            }
        };

        if let Err(e) = self.writer.append(&row).await {
            return Reply::Text(t_args_lang(
                "record-save-failed",
                &[("error", e.to_string().as_str())],
                lang,
            ));
        }

        info!(session = %key, "Conversation complete");
        match draft.row_index {
            Some(row_index) => Reply::Text(t_args_lang(
                "quick-saved",
                &[
                    ("description", row.concept.as_str()),
                    ("amount", draft.amount.as_deref().unwrap_or_default()),
                    ("currency", row.currency.as_str()),
                    ("row", row_index.to_string().as_str()),
                ],
                lang,
            )),
            None => Reply::Text(t_lang("record-saved", lang)),
        }
    }

    /// Start a quick entry from a message addressed to the bot
    async fn begin_quick_entry(&self, key: SessionKey, text: &str, language_code: Option<&str>) -> Reply {
        let entry = match self.parser.parse(text, Local::now().date_naive()) {
            Ok(entry) => entry,
            Err(QuickEntryError::InvalidAmount(word)) => {
                info!(session = %key, amount = %word, "Rejected quick entry amount");
                return Reply::Text(t_lang("quick-invalid-amount", language_code));
            }
            Err(e) => {
                debug!(session = %key, reason = %e, "Message is not a quick entry");
                return Reply::Text(t_args_lang(
                    "quick-usage",
                    &[("mention", self.parser.mention())],
                    language_code,
                ));
            }
        };

        let row_index = match self.writer.next_row_index().await {
            Ok(index) => index,
            Err(e) => {
                warn!(session = %key, error = %e, "Could not count rows of the base sheet");
                0
            }
        };

        let mut session = Session::new(language_code);
        session.state = ConversationState::QuickBusinessUnit;
        session.draft = TransactionDraft {
            transaction_type: Some(entry.transaction_type),
            date: Some(entry.date),
            account: Some(UNSPECIFIED_ACCOUNT.to_string()),
            concept: Some(entry.description),
            currency: Some(entry.currency),
            amount: Some(entry.amount),
            row_index: Some(row_index),
            ..TransactionDraft::default()
        };
        session.menu = self.options.get(OptionCategory::BusinessUnits).await;

        info!(session = %key, kind = %entry.transaction_type, row_index, "Started quick entry");
        let reply = self.menu_reply(&session, "quick-prompt-business-unit");
        self.sessions.begin(key, session).await;
        reply
    }
}
