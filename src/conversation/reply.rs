//! Transport-neutral description of what the bot should answer
//!
//! Flows return an [`Outcome`]; the Telegram layer turns it into API calls.
//! Texts are MarkdownV2 with dynamic parts already escaped.

/// What pressing a button does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(String),
    WebApp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn web_app(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::WebApp(url.into()),
        }
    }

    pub fn callback_data(&self) -> Option<&str> {
        match &self.action {
            ButtonAction::Callback(data) => Some(data),
            ButtonAction::WebApp(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Inline keyboard attached to the message
    Inline(Vec<Vec<Button>>),
    /// Persistent main menu; the first button opens the Mini App at `app_url`
    MainMenu { app_url: String },
}

impl Keyboard {
    /// Inline rows of `per_row` callback buttons, one per option
    pub fn grid(buttons: Vec<Button>, per_row: usize) -> Vec<Vec<Button>> {
        let mut rows = Vec::new();
        let mut iter = buttons.into_iter().peekable();
        while iter.peek().is_some() {
            rows.push(iter.by_ref().take(per_row.max(1)).collect());
        }
        rows
    }

    pub fn inline_buttons(&self) -> impl Iterator<Item = &Button> {
        let rows: &[Vec<Button>] = match self {
            Keyboard::Inline(rows) => rows.as_slice(),
            Keyboard::MainMenu { .. } => &[],
        };
        rows.iter().flatten()
    }
}

/// Where the reply goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    #[default]
    Send,
    /// Replace the message that carried the pressed button
    EditSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub delivery: Delivery,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            delivery: Delivery::Send,
        }
    }

    pub fn edit(text: impl Into<String>) -> Self {
        Self {
            delivery: Delivery::EditSource,
            ..Self::text(text)
        }
    }

    pub fn with_inline(mut self, rows: Vec<Vec<Button>>) -> Self {
        self.keyboard = Some(Keyboard::Inline(rows));
        self
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Everything a flow wants done in response to one update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub replies: Vec<Reply>,
    /// Delete the user's message (or the message holding the pressed button)
    pub delete_source: bool,
    /// Rebuild the user's Mini App menu button with fresh data
    pub refresh_menu: bool,
    /// Short toast shown when answering a callback query
    pub notice: Option<String>,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn reply(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::reply(Reply::text(text))
    }

    pub fn push(&mut self, reply: Reply) {
        self.replies.push(reply);
    }

    pub fn refreshing_menu(mut self) -> Self {
        self.refresh_menu = true;
        self
    }

    pub fn deleting_source(mut self) -> Self {
        self.delete_source = true;
        self
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty() && !self.delete_source && !self.refresh_menu && self.notice.is_none()
    }
}
