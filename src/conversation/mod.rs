//! Chat logic: what the bot answers to messages, button presses and Mini App data.
//!
//! Nothing here talks to Telegram directly. Handlers build a [`FlowContext`],
//! call into it and deliver the returned [`Outcome`].

pub mod actions;
pub mod callbacks;
pub mod flows;
pub mod menu;
pub mod reply;
pub mod state;
pub mod views;

pub use actions::CallbackAction;
pub use flows::FlowContext;
pub use menu::MenuButton;
pub use reply::{Button, ButtonAction, Delivery, Keyboard, Outcome, Reply};
pub use state::{ChatState, ConversationStore};
