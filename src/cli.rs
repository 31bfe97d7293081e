use clap::{Parser, Subcommand};

/// pr-reviewer: AI code review for pull and merge requests
#[derive(Parser, Debug, Clone)]
#[command(name = "pr-reviewer", version, about, subcommand_negates_reqs = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    /// Repository identifier (owner/repo, or a GitLab project path or id)
    #[arg(long, required = true)]
    pub repo: Option<String>,

    /// Pull/merge request number
    #[arg(long, required = true)]
    pub pr: Option<u64>,

    /// Git hosting provider (github, gitlab, bitbucket)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Language model to review with
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Model request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Path to config file (default: .pr-reviewer.toml if present)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Serve the review web form
    Serve {
        /// Address to listen on (default: 127.0.0.1:8000)
        #[arg(long)]
        addr: Option<String>,
    },
}
