use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fleetsync",
    about = "Keep AMP game-server instances in line with their group template",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, env = "FLEETSYNC_CONFIG", help = "Path to the JSON configuration file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true, help = "Print reports as JSON instead of tables")]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List instances and how they resolve into groups")]
    Instances,

    #[command(
        about = "Copy game settings from the template to every destination",
        long_about = "Copy game settings from the template to every destination.\n\n\
            Template values are read from every settings group unless `settings.group_key` \
            is set in the configuration file (for ARK: \"arksa:stadiacontroller\"). \
            Only nodes under `settings.node_prefixes` are considered; excluded nodes are \
            never written and forced nodes always get their fixed value."
    )]
    Settings(SyncArgs),

    #[command(about = "Replicate triggers and tasks from the template to every destination")]
    Schedules(SyncArgs),

    #[command(subcommand, about = "Inspect or prune sticky backups")]
    Backups(BackupCommands),
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[arg(short, long, help = "Group to sync (default: first template found)")]
    pub group: Option<String>,

    #[arg(long, help = "Compute and print the plan without changing anything")]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum BackupCommands {
    #[command(about = "Show the retention plan for every instance of the group")]
    List(RetentionArgs),

    #[command(about = "Delete backups outside the retention policy (requires --apply)")]
    Cleanup {
        #[command(flatten)]
        retention: RetentionArgs,

        #[arg(long, help = "Actually delete; without it only the plan is printed")]
        apply: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RetentionArgs {
    #[arg(short, long, help = "Group to inspect (default: first template found)")]
    pub group: Option<String>,

    #[arg(long, help = "Compute and print the plan without changing anything")]
    pub dry_run: bool,

    #[arg(long, default_value_t = 7, help = "Keep one backup per day for this many days")]
    pub daily_days: u32,

    #[arg(long, default_value_t = 3, help = "Then one backup per week for this many months")]
    pub weekly_months: u32,

    #[arg(long, help = "Also manage non-sticky backups")]
    pub all_backups: bool,
}
