use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trialbot", about = "Telegram bot for trial signup & email confirmation")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram bot (long polling)
    Bot,
    /// Run one signup flow from the terminal, as the operator
    Signup {
        /// Requested name; becomes the mailbox local part
        name: String,
    },
    /// Wait for the confirmation email of an existing address
    Inbox {
        /// Full mailbox address, e.g. alice_1700000000@snv.email
        address: String,
    },
}
