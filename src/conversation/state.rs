//! Per-user conversation state
//!
//! States live in process memory only; a restart drops unfinished dialogs.

use dashmap::DashMap;
use std::sync::Arc;

use crate::core::types::TxKind;
use crate::finance::parser::TxDraft;

/// A multi-step dialog the user is in the middle of
#[derive(Debug, Clone, PartialEq)]
pub enum ChatState {
    /// Waiting for the name of a new goal
    GoalAwaitingName,
    /// Waiting for the target amount of goal `name`
    GoalAwaitingTarget { name: String },
    /// Waiting for the name of a new category of `kind`
    CategoryAwaitingName { kind: TxKind },
    /// Category picker for a new budget is on screen
    BudgetPickingCategory { options: Vec<String> },
    /// Waiting for the monthly limit of `category`
    BudgetAwaitingAmount { category: String },
    /// Typed category was not recognised; the transaction waits for a decision
    TransactionAwaitingDecision { pending: TxDraft, options: Vec<String> },
    /// Category delete picker is on screen
    CategoryDeletePicking { options: Vec<String> },
}

impl ChatState {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ChatState::GoalAwaitingName => "goal_awaiting_name",
            ChatState::GoalAwaitingTarget { .. } => "goal_awaiting_target",
            ChatState::CategoryAwaitingName { .. } => "category_awaiting_name",
            ChatState::BudgetPickingCategory { .. } => "budget_picking_category",
            ChatState::BudgetAwaitingAmount { .. } => "budget_awaiting_amount",
            ChatState::TransactionAwaitingDecision { .. } => "transaction_awaiting_decision",
            ChatState::CategoryDeletePicking { .. } => "category_delete_picking",
        }
    }

    /// States that consume the next text message
    pub fn expects_text(&self) -> bool {
        matches!(
            self,
            ChatState::GoalAwaitingName
                | ChatState::GoalAwaitingTarget { .. }
                | ChatState::CategoryAwaitingName { .. }
                | ChatState::BudgetAwaitingAmount { .. }
        )
    }
}

/// Concurrent map of user id -> state, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    states: Arc<DashMap<i64, ChatState>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: i64) -> Option<ChatState> {
        self.states.get(&user_id).map(|entry| entry.value().clone())
    }

    pub fn set(&self, user_id: i64, state: ChatState) {
        log::debug!("User {} -> state {}", user_id, state.name());
        self.states.insert(user_id, state);
    }

    /// Removes and returns the state
    pub fn clear(&self, user_id: i64) -> Option<ChatState> {
        self.states.remove(&user_id).map(|(_, state)| state)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
