use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "spmp",
    version,
    about = "SPMP document compliance evaluation, overrides and score history"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate (or re-evaluate) a document against the twelve SPMP sections
    Evaluate(EvaluateArgs),
    /// Record a reviewer override on the current score
    Override(OverrideArgs),
    /// Show archived score versions for a document
    History(HistoryArgs),
    /// Render the current compliance report for a document
    Report(ReportArgs),
    /// Manage grading weight profiles
    Criteria(CriteriaArgs),
    /// Register reviewer display names
    User(UserArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, default_value = ".cache/spmp")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

impl StoreArgs {
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.cache_root.join("spmp_compliance.sqlite"))
    }
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub file: PathBuf,

    /// Defaults to an id derived from the file's sha256
    #[arg(long)]
    pub doc_id: Option<String>,

    /// Defaults to the file name
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub user: String,

    /// Weight completeness with this evaluator's active grading profile
    #[arg(long)]
    pub criteria_owner: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OverrideArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub doc_id: String,

    #[arg(long)]
    pub score: f64,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub user: String,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub doc_id: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub doc_id: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Also write the JSON report to this path
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CriteriaArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub action: CriteriaAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CriteriaAction {
    Create(CriteriaWriteArgs),
    Update(CriteriaUpdateArgs),
    Activate(CriteriaTargetArgs),
    Delete(CriteriaTargetArgs),
    List(CriteriaListArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CriteriaWriteArgs {
    #[arg(long)]
    pub owner: String,

    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value_t = false)]
    pub active: bool,

    #[command(flatten)]
    pub weights: WeightArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CriteriaUpdateArgs {
    #[arg(long)]
    pub id: i64,

    #[command(flatten)]
    pub profile: CriteriaWriteArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CriteriaTargetArgs {
    #[arg(long)]
    pub id: i64,

    #[arg(long)]
    pub owner: String,
}

#[derive(Args, Debug, Clone)]
pub struct CriteriaListArgs {
    #[arg(long)]
    pub owner: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct WeightArgs {
    #[arg(long, default_value_t = 10)]
    pub overview: u32,

    #[arg(long, default_value_t = 5)]
    pub references: u32,

    #[arg(long, default_value_t = 5)]
    pub definitions: u32,

    #[arg(long, default_value_t = 15)]
    pub organization: u32,

    #[arg(long, default_value_t = 20)]
    pub managerial_process: u32,

    #[arg(long, default_value_t = 20)]
    pub technical_process: u32,

    #[arg(long, default_value_t = 15)]
    pub supporting_process: u32,

    #[arg(long, default_value_t = 10)]
    pub additional_plans: u32,
}

#[derive(Args, Debug, Clone)]
pub struct UserArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub id: String,

    #[arg(long)]
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}
