use clap::Args;
use clap::Parser;
use clap::Subcommand;

/// Command-line admin console for the course platform.
#[derive(Parser, Debug)]
#[command(name = "coursedesk", version, about, long_about = None)]
pub struct Cli {
    /// Backend URL (overrides COURSEDESK_API_URL)
    #[arg(short = 'u', long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Log at debug level
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,

        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// End the session
    Logout,

    /// List users
    Users(ListArgs),

    /// Work with notifications
    #[command(subcommand)]
    Notifications(NotificationCommand),
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    #[arg(long)]
    pub search: Option<String>,

    /// Column keys to hide
    #[arg(long = "hide", value_name = "KEY")]
    pub hide: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum NotificationCommand {
    /// Show the latest notifications
    List(ListArgs),

    /// Follow notifications live until interrupted
    Watch,

    /// Mark a notification as read
    Read { id: String },

    /// Delete a notification
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}
