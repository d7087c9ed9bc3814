//! Command-line surface of the `eisenhower` binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use eisenhower_rs_protocol::{ItemKind, Preset};
use std::path::PathBuf;

/// Page URL assumed for snapshots saved from the web client.
pub const DEFAULT_MAIL_URL: &str = "https://outlook.office.com/mail/inbox";

/// Command-line options for the Eisenhower CLI.
#[derive(Debug, Parser)]
#[command(
    name = "eisenhower",
    version,
    about = "Sort mail and web pages into the Eisenhower matrix"
)]
pub struct Cli {
    /// Optional path to an eisenhower.json5 config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Store directory, overrides `storage.path`
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Categorize the selected or open item of a page snapshot
    Tag(TagArgs),
    /// Forget the priority of a saved web page
    Untag(PageArgs),
    /// Show which item a snapshot resolves to, without storing anything
    Resolve {
        #[command(flatten)]
        page: PageArgs,
        /// Look at the reading pane before the list selection
        #[arg(long)]
        reading_pane: bool,
    },
    /// Re-apply saved priorities to a snapshot
    Apply(PageArgs),
    /// Locate a stored mail item in a snapshot and select it
    Open {
        #[command(flatten)]
        page: PageArgs,
        /// Stored id of the item
        id: String,
    },
    /// Print the quadrant view of everything stored
    Matrix,
    /// Set or clear the display label of a stored item
    Rename {
        #[arg(value_enum)]
        kind: KindArg,
        id: String,
        /// New label; omit to clear it
        label: Option<String>,
    },
    /// Delete a stored priority
    Delete {
        #[arg(value_enum)]
        kind: KindArg,
        id: String,
    },
    /// Remove records older than the configured max age
    Sweep {
        /// Override `storage.max_age_days`
        #[arg(long)]
        max_age_days: Option<u32>,
    },
    /// Dump both namespaces as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Remove every stored priority
    Clear,
    /// Manage custom mail hosts
    Hosts {
        #[command(subcommand)]
        command: HostsCommand,
    },
    /// Inspect or change user settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

/// A page snapshot plus where it was captured.
#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    /// HTML snapshot of the page
    pub snapshot: PathBuf,
    /// URL the snapshot was taken from
    #[arg(long, default_value = DEFAULT_MAIL_URL)]
    pub url: String,
    /// Write the annotated page here
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct TagArgs {
    #[command(flatten)]
    pub page: PageArgs,
    /// Context menu preset to apply
    #[arg(long, value_enum, conflicts_with_all = ["importance", "urgency"])]
    pub preset: Option<PresetArg>,
    /// Importance rating (1-4), picker style
    #[arg(long)]
    pub importance: Option<i32>,
    /// Urgency rating (1-4), picker style
    #[arg(long)]
    pub urgency: Option<i32>,
    /// Tag the page itself instead of a mail item
    #[arg(long)]
    pub web: bool,
}

#[derive(Debug, Subcommand)]
pub enum HostsCommand {
    /// Print builtin and custom mail hosts
    List,
    /// Add a custom mail host
    Add { url: String },
    /// Remove a custom mail host by its position in `hosts list`
    Remove { index: usize },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the stored settings as JSON
    Show,
    /// Change one or more settings
    Set {
        #[arg(long)]
        auto_categorize: Option<bool>,
        #[arg(long)]
        exchange_url: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    DoFirst,
    Schedule,
    Delegate,
    Eliminate,
}

impl From<PresetArg> for Preset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::DoFirst => Preset::DoFirst,
            PresetArg::Schedule => Preset::Schedule,
            PresetArg::Delegate => Preset::Delegate,
            PresetArg::Eliminate => Preset::Eliminate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Email,
    Web,
}

impl From<KindArg> for ItemKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Email => ItemKind::Email,
            KindArg::Web => ItemKind::WebPage,
        }
    }
}
