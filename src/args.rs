use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = r###"
notebooklm2api puts an OpenAI-compatible chat completions API in front of a NotebookLM notebook.

Any client that speaks the OpenAI protocol can ask questions of your notebook:
- Non-streaming: the notebook's answer comes back as a single chat.completion.
- Streaming: the finished answer is replayed as chat.completion.chunk events.
- Markdown: answers are either tidied up for rendering or reduced to plain text (CLEAN_MARKDOWN).
"###
)]
pub struct Args {
    #[command(subcommand)]
    pub subcmd: Option<SubCommands>,
}

#[derive(Subcommand, Debug)]
pub enum SubCommands {
    Start(StartSubCommand),
    /// Print the effective configuration with secrets masked.
    Config(ConfigSubCommand),
    Smoke(SmokeSubCommand),
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Start the API server", long_about = None)]
pub struct StartSubCommand {
    /// Address to listen on. Overrides HOST and the config file.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on. Overrides PORT and the config file.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to a notebooklm2api.toml to use instead of the default location.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Show configuration values", long_about = None)]
pub struct ConfigSubCommand {
    /// Path to a notebooklm2api.toml to use instead of the default location.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Smoke test a running server", long_about = None)]
pub struct SmokeSubCommand {
    #[arg(long, default_value = "localhost")]
    pub host: String,

    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,

    /// Sent as `Authorization: Bearer <key>`.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Notebook to query; the server default is used when absent.
    #[arg(long)]
    pub notebook_id: Option<String>,

    /// Only check /health and /v1/models.
    #[arg(long)]
    pub skip_chat: bool,

    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}
