pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feedsky")]
#[command(about = "Mirror an RSS feed to Bluesky", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/feedsky/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Post feed items that haven't been posted yet
    Publish(PublishArgs),
    /// Print the profile of the configured account
    Profile,
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Log what would be posted without posting or recording anything
    #[arg(long)]
    pub dry_run: bool,

    /// Also post items already recorded as posted
    #[arg(long, visible_alias = "all")]
    pub ignore_existing: bool,

    /// Process a single item
    #[arg(long, conflicts_with = "number")]
    pub one: bool,

    /// Maximum number of items to process (-1 for no limit)
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    pub number: i64,
}
