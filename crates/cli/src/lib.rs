pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "verse",
    about = "Bible verse agent operator CLI",
    long_about = "Run the verse pipeline once, trigger the daily verse, inspect configuration, \
                  and generate the workflow descriptor for the A2A endpoint.",
    after_help = "Examples:\n  verse ask \"I need a verse on love\"\n  verse daily --dry-run\n  \
                  verse config\n  verse workflow --url https://verses.example.com/a2a"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Classify a message and answer it with a verse or a chat reply")]
    Ask {
        #[arg(required = true, trailing_var_arg = true, help = "Message text")]
        query: Vec<String>,
    },
    #[command(about = "Fetch a random verse with reflection and post it to the daily channel")]
    Daily {
        #[arg(long, help = "Print the channel message without delivering it")]
        dry_run: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Print the n8n workflow descriptor that registers the A2A endpoint")]
    Workflow {
        #[arg(long, default_value = commands::workflow::DEFAULT_A2A_URL, help = "Public A2A URL")]
        url: String,
        #[arg(long, help = "Also write the descriptor to this file")]
        out: Option<PathBuf>,
    },
}

pub fn run() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask { query } => commands::ask::run(&query.join(" ")),
        Command::Daily { dry_run } => commands::daily::run(dry_run),
        Command::Config => commands::config::run(),
        Command::Workflow { url, out } => commands::workflow::run(&url, out.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
