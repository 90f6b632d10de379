use anyhow::Result;
use clap::Parser;
use imagenie::commands::{self, GlobalOptions, StateAction};
use imagenie::dist::Platform;
use imagenie::state::Function;
use std::path::PathBuf;

/// imagenie - model manager for the Imagenie image toolbox
///
/// Resolves and downloads the ONNX models published as GitHub release
/// assets, and manages the application's saved state.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
///
/// Examples:
///   imagenie resolve upscaling     # Show the release asset for a model
///   imagenie fetch                 # Download every missing model
#[derive(Parser, Debug)]
#[command(author, version = env!("IMAGENIE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Application directory (defaults to ~/.imagenie; also via IMAGENIE_HOME)
    #[arg(long = "home", env = "IMAGENIE_HOME", value_name = "PATH", global = true)]
    pub home: Option<PathBuf>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Message language: en or zh (defaults to LANG)
    #[arg(long = "lang", value_name = "LANG", global = true)]
    pub lang: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Resolve a model to its release asset
    Resolve(ResolveArgs),

    /// Download models that are not installed yet
    Fetch(FetchArgs),

    /// List known models and whether they are installed
    Models,

    /// Show or change the saved application state
    #[command(subcommand)]
    State(StateCommand),

    /// Copy installer bundles into dist/
    Dist(DistArgs),
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// Model slug (e.g. "upscaling") or asset name
    #[arg(value_name = "MODEL")]
    pub model: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Models to download (defaults to all known models)
    #[arg(value_name = "MODEL")]
    pub models: Vec<String>,

    /// Download even if the model is already installed
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(clap::Subcommand, Debug)]
enum StateCommand {
    /// Print the saved state
    Show,

    /// Switch the active function
    Function {
        #[arg(value_name = "FUNCTION")]
        function: Function,
    },

    /// Append files to the selection
    Add {
        #[arg(value_name = "PATH", required = true)]
        files: Vec<PathBuf>,
    },

    /// Clear the file selection
    Clear,

    /// Update a function setting, e.g. compress.quality 70
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct DistArgs {
    /// Rust target triple the bundle was built for
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Base name of the copied files
    #[arg(value_name = "APP_NAME")]
    pub app_name: String,

    /// Project directory containing src-tauri/
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project: PathBuf,

    /// Bundle layout to collect (defaults to the current platform)
    #[arg(long, value_name = "PLATFORM")]
    pub platform: Option<Platform>,
}

impl From<StateCommand> for StateAction {
    fn from(command: StateCommand) -> Self {
        match command {
            StateCommand::Show => StateAction::Show,
            StateCommand::Function { function } => StateAction::Function(function),
            StateCommand::Add { files } => StateAction::Add(files),
            StateCommand::Clear => StateAction::Clear,
            StateCommand::Set { key, value } => StateAction::Set { key, value },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = imagenie::runtime::RealRuntime;
    let options = GlobalOptions {
        home: cli.home,
        api_url: cli.api_url,
        lang: cli.lang,
    };

    match cli.command {
        Commands::Resolve(args) => {
            commands::resolve(runtime, options, &args.model, args.json).await?
        }
        Commands::Fetch(args) => {
            commands::fetch(runtime, options, &args.models, args.force).await?
        }
        Commands::Models => commands::models(runtime, options)?,
        Commands::State(command) => commands::state(runtime, options.home, command.into())?,
        Commands::Dist(args) => commands::dist(
            runtime,
            &args.project,
            &args.target,
            &args.app_name,
            args.platform,
        )?,
    }
    Ok(())
}
