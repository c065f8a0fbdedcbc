//! Conversation state and per-user sessions for the transaction form.

use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::transaction::TransactionDraft;

/// Where a conversation stands
///
/// The guided form walks `AwaitingDate` to `AwaitingPaymentMethod` in order.
/// A quick entry only asks for the three `Quick*` fields it could not parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConversationState {
    #[default]
    AwaitingDate,
    AwaitingType,
    AwaitingAccount,
    AwaitingBusinessUnit,
    AwaitingClient,
    AwaitingConcept,
    AwaitingCurrency,
    AwaitingAmount,
    AwaitingPaymentMethod,
    QuickBusinessUnit,
    QuickClient,
    QuickPaymentMethod,
    Complete,
}

/// What kind of reply a state waits for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpectedInput {
    Text,
    Choice,
    TextOrChoice,
    Nothing,
}

impl ConversationState {
    pub const ALL: [ConversationState; 13] = [
        ConversationState::AwaitingDate,
        ConversationState::AwaitingType,
        ConversationState::AwaitingAccount,
        ConversationState::AwaitingBusinessUnit,
        ConversationState::AwaitingClient,
        ConversationState::AwaitingConcept,
        ConversationState::AwaitingCurrency,
        ConversationState::AwaitingAmount,
        ConversationState::AwaitingPaymentMethod,
        ConversationState::QuickBusinessUnit,
        ConversationState::QuickClient,
        ConversationState::QuickPaymentMethod,
        ConversationState::Complete,
    ];

    pub fn expected_input(self) -> ExpectedInput {
        match self {
            ConversationState::AwaitingDate
            | ConversationState::AwaitingConcept
            | ConversationState::AwaitingAmount => ExpectedInput::Text,
            ConversationState::AwaitingType
            | ConversationState::AwaitingAccount
            | ConversationState::AwaitingBusinessUnit
            | ConversationState::AwaitingClient
            | ConversationState::AwaitingCurrency
            | ConversationState::AwaitingPaymentMethod => ExpectedInput::Choice,
            ConversationState::QuickBusinessUnit
            | ConversationState::QuickClient
            | ConversationState::QuickPaymentMethod => ExpectedInput::TextOrChoice,
            ConversationState::Complete => ExpectedInput::Nothing,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ConversationState::Complete
    }

    pub fn is_quick_entry(self) -> bool {
        matches!(
            self,
            ConversationState::QuickBusinessUnit
                | ConversationState::QuickClient
                | ConversationState::QuickPaymentMethod
        )
    }

    /// Short tag carried in menu callback data
    pub fn code(self) -> &'static str {
        match self {
            ConversationState::AwaitingDate => "date",
            ConversationState::AwaitingType => "type",
            ConversationState::AwaitingAccount => "acct",
            ConversationState::AwaitingBusinessUnit => "unit",
            ConversationState::AwaitingClient => "cli",
            ConversationState::AwaitingConcept => "cpt",
            ConversationState::AwaitingCurrency => "cur",
            ConversationState::AwaitingAmount => "amt",
            ConversationState::AwaitingPaymentMethod => "pay",
            ConversationState::QuickBusinessUnit => "qunit",
            ConversationState::QuickClient => "qcli",
            ConversationState::QuickPaymentMethod => "qpay",
            ConversationState::Complete => "done",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

/// A menu button press: the state whose menu it belongs to and the option index
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuChoice {
    pub state: ConversationState,
    pub index: usize,
}

impl MenuChoice {
    pub fn new(state: ConversationState, index: usize) -> Self {
        Self { state, index }
    }

    /// Callback data for the button (`acct:3`)
    pub fn encode(&self) -> String {
        format!("{}:{}", self.state.code(), self.index)
    }

    pub fn decode(data: &str) -> Option<Self> {
        let (code, index) = data.split_once(':')?;
        Some(Self {
            state: ConversationState::from_code(code)?,
            index: index.parse().ok()?,
        })
    }
}

/// Input delivered to the conversation
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Begin (or restart) the guided form
    Start,
    /// Abandon the current conversation
    Cancel,
    /// A plain text message
    Text(String),
    /// A menu button press
    Choice(MenuChoice),
}

/// Output of the conversation, rendered by the transport
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Text(String),
    Menu {
        prompt: String,
        state: ConversationState,
        options: Vec<String>,
    },
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Text(text) => text,
            Reply::Menu { prompt, .. } => prompt,
        }
    }
}

/// Identifies one user's conversation within one chat
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub chat_id: i64,
    pub user_id: u64,
}

impl SessionKey {
    pub fn new(chat_id: i64, user_id: u64) -> Self {
        Self { chat_id, user_id }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.chat_id, self.user_id)
    }
}

/// One in-progress conversation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub state: ConversationState,
    pub draft: TransactionDraft,
    /// Options of the menu last shown, indexed by button
    pub menu: Vec<String>,
    pub language_code: Option<String>,
}

impl Session {
    pub fn new(language_code: Option<&str>) -> Self {
        Self {
            language_code: language_code.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Sessions keyed by chat and user
///
/// Held only while reading or replacing an entry, never across a
/// spreadsheet call.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionKey, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, replacing any existing one for the key
    pub async fn begin(&self, key: SessionKey, session: Session) -> Option<Session> {
        self.sessions.lock().await.insert(key, session)
    }

    /// Store an updated session
    pub async fn put(&self, key: SessionKey, session: Session) {
        self.sessions.lock().await.insert(key, session);
    }

    /// Copy of the session for a key
    pub async fn get(&self, key: SessionKey) -> Option<Session> {
        self.sessions.lock().await.get(&key).cloned()
    }

    /// Remove and return the session for a key
    pub async fn take(&self, key: SessionKey) -> Option<Session> {
        self.sessions.lock().await.remove(&key)
    }

    /// Destroy the session for a key; `true` if one existed
    pub async fn discard(&self, key: SessionKey) -> bool {
        self.take(key).await.is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
