use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fingoal")]
#[command(author, version, about = "Personal finance Telegram bot with a companion Mini App", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the bot (long polling) together with the HTTP API
    Run,

    /// Create the database file and apply pending migrations
    Migrate,

    /// Print the Mini App snapshot of a user as JSON, followed by the app URL
    Snapshot {
        /// Telegram user id
        #[arg(short, long)]
        user: i64,

        /// Number of recent transactions to embed
        #[arg(short, long, default_value_t = 15)]
        limit: usize,
    },

    /// Encode a raw `action|p1|p2` string into a `/start` deep-link payload
    Deeplink {
        /// For example `expense|500|Еда` or `goal|Машина|500000`
        raw: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
