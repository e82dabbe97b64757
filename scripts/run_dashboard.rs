use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dialoguer::{Input, Password};
use ragdash_adaptor_terminal::{
    describe_state, render_toast, AssumeYes, Console, DashboardClient, InteractivePrompt, Prompt,
};
use ragdash_adaptor_web::{shutdown_signal, DashboardServer};
use ragdash_core::types::parse_tag_input;
use ragdash_core::utils::logger::init_logging;
use ragdash_core::{load_env, load_env_from_path, DashboardConfig, FlowState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "RAG file dashboard")]
struct Cli {
    #[arg(long, env = "RAGDASH_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Load this file instead of looking for `.env`
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web dashboard (default)
    Serve(ServeArgs),
    /// Manage files through a running dashboard
    Files(FilesArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Bind host, overrides HOST
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overrides PORT
    #[arg(long)]
    port: Option<u16>,

    /// RAG API base URL, overrides RAG_API_BASE_URL
    #[arg(long)]
    rag_api: Option<String>,
}

#[derive(Args, Debug)]
struct FilesArgs {
    /// Dashboard URL
    #[arg(long, env = "RAGDASH_URL", default_value = "http://127.0.0.1:3003")]
    url: String,

    #[arg(long, env = "ADMIN_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    action: FilesAction,
}

#[derive(Subcommand, Debug)]
enum FilesAction {
    /// List files, optionally filtered
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// Tag filter; repeat for several tags
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Validate and upload a file
    Upload {
        path: PathBuf,
        /// Comma or space separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Accept validation warnings without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Replace a file, restoring the original if the upload fails
    Replace {
        name: String,
        path: PathBuf,
        /// Tags for the new file; defaults to the original's tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    Delete {
        name: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Show file info and embedding statistics
    Stats { name: String },
    Download {
        name: String,
        /// Target file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl FilesAction {
    fn assume_yes(&self) -> bool {
        match self {
            FilesAction::Upload { yes, .. }
            | FilesAction::Replace { yes, .. }
            | FilesAction::Delete { yes, .. } => *yes,
            _ => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // `.env` must be in the environment before clap reads `env = ...` defaults
    match &env_file_arg(std::env::args()) {
        Some(path) => load_env_from_path(path)?,
        None => load_env()?,
    }

    let cli = Cli::parse();
    std::env::set_var("RAGDASH_LOG_LEVEL", &cli.log_level);
    init_logging();
    if let Some(path) = &cli.env_file {
        info!("Loaded environment from {}", path.display());
    }

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(args).await,
        Command::Files(args) => files(args).await,
    }
}

/// `--env-file <path>` or `--env-file=<path>` from the raw arguments
fn env_file_arg(args: impl IntoIterator<Item = String>) -> Option<PathBuf> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--env-file" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--env-file=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = DashboardConfig::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(rag_api) = args.rag_api {
        config.rag_api_base_url = rag_api;
    }

    info!("Starting RAG file dashboard");
    let server = DashboardServer::new(config)?;
    server.run(shutdown_signal()).await?;
    Ok(())
}

async fn files(args: FilesArgs) -> Result<()> {
    let client = DashboardClient::new(args.url.as_str())?;

    let username = match args.username {
        Some(username) => username,
        None => Input::<String>::new().with_prompt("Username").interact_text()?,
    };
    let password = match args.password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };
    client
        .login(&username, &password)
        .await
        .with_context(|| format!("Could not log in to {}", args.url))?;

    let prompt: Box<dyn Prompt> = if args.action.assume_yes() {
        Box::new(AssumeYes)
    } else {
        Box::new(InteractivePrompt)
    };
    let mut console = Console::new(Arc::new(client), prompt).with_progress(true);

    let result = run_action(&mut console, args.action).await;
    for toast in console.take_toasts() {
        eprintln!("{}", render_toast(&toast));
    }
    result
}

async fn run_action(
    console: &mut Console<DashboardClient, Box<dyn Prompt>>,
    action: FilesAction,
) -> Result<()> {
    match action {
        FilesAction::List { search, tags } => {
            let tags = tags.iter().flat_map(|t| parse_tag_input(t)).collect();
            print!("{}", console.list(&search, tags).await?);
        }
        FilesAction::Upload { path, tags, .. } => {
            let tags = tags.as_deref().map(parse_tag_input).unwrap_or_default();
            let state = console.upload(&path, tags).await?;
            finish(&state)?;
        }
        FilesAction::Replace {
            name, path, tags, ..
        } => {
            let tags = tags.as_deref().map(parse_tag_input);
            let state = console.replace(&name, &path, tags).await?;
            finish(&state)?;
        }
        FilesAction::Delete { name, .. } => {
            if !console.delete(&name).await? {
                println!("Cancelled");
            }
        }
        FilesAction::Stats { name } => print!("{}", console.stats(&name).await?),
        FilesAction::Download { name, output } => {
            let saved = console.download(&name, output.as_deref()).await?;
            println!("Saved {}", saved.display());
        }
    }
    Ok(())
}

/// Outcome of an upload or replace; anything but success fails the command
fn finish(state: &FlowState) -> Result<()> {
    match state {
        FlowState::Done { .. } => Ok(()),
        FlowState::Idle => {
            println!("Cancelled");
            Ok(())
        }
        other => bail!("{}", describe_state(other)),
    }
}
