use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stg", about = concat!("stagesync v", env!("CARGO_PKG_VERSION"), " - grow stage aggregation and plant sync"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Data directory holding grows.json, draft.json and entries/
    #[arg(short = 'D', long = "data-dir", global = true, default_value = "stagesync")]
    pub data_dir: String,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory with an empty grow snapshot
    Init,
    /// Normalize a raw stage value
    Stage(StageArgs),
    /// List grows with their aggregate stage
    Grows,
    /// Aggregate stage of a grow, optionally over selected plants
    Aggregate(AggregateArgs),
    /// Edit the entry draft
    Draft(DraftCmd),
    /// Save the draft through the entry repository
    Save(SaveArgs),
    /// View or edit stagesync.toml
    Config(ConfigCmd),
}

#[derive(Args)]
pub struct StageArgs {
    /// Raw stage value, e.g. "veg" or "Flowering"
    pub raw: String,
}

#[derive(Args)]
pub struct AggregateArgs {
    /// Grow ID
    pub grow: String,
    /// Plant ID to include (repeatable; `#N` for id-less plants)
    #[arg(long = "plant")]
    pub plants: Vec<String>,
}

#[derive(Args)]
pub struct DraftCmd {
    #[command(subcommand)]
    pub action: Option<DraftAction>,
}

#[derive(Subcommand)]
pub enum DraftAction {
    /// Show the draft and its sync state
    Show,
    /// Attach the draft to a grow (`none` to detach)
    Grow { id: String },
    /// Replace the plant selection (no IDs = whole grow)
    Plants { ids: Vec<String> },
    /// Add or remove one plant from the selection
    TogglePlant { id: String },
    /// Set the stage field (`none` to clear)
    Stage { raw: String },
    /// Turn apply-to-plants on or off
    Apply { value: OnOff },
    /// Set free-text fields
    Text(TextArgs),
    /// Discard the draft
    Clear,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum OnOff {
    On,
    Off,
}

#[derive(Args)]
pub struct TextArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Photo reference (repeatable, replaces the list)
    #[arg(long = "photo")]
    pub photos: Vec<String>,
}

#[derive(Args)]
pub struct SaveArgs {
    /// Confirm a cascading save without prompting
    #[arg(short, long)]
    pub yes: bool,
    /// Update an existing entry instead of creating one
    #[arg(long)]
    pub update: Option<String>,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective stage vocabulary
    Show,
    /// Override the legacy storage key for a stage
    SetLegacyKey { stage: String, key: String },
}
