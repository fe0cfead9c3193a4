use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use work_env::config::WorkEnvConfig;
use work_env::names::{validate_container_name, validate_image_name};
use work_env::{
    builder, detect_runtime, inventory, removal, session, CliRuntime, ContainerRuntime,
    HostContext, LifecycleManager, RunOptions, RuntimeChoice, WorkEnvError, WorkEnvResult,
};

#[derive(Parser)]
#[command(name = "work-env")]
#[command(version, about = "Virtual command line working environment for developers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Config file (defaults to $XDG_CONFIG_HOME/work-env/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Container runtime to use
    #[arg(long, global = true, value_enum)]
    runtime: Option<RuntimeChoice>,
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a new environment image <image> from a Dockerfile in directory <path>
    Build {
        /// Build context directory
        path: PathBuf,
        /// Name of the environment image
        image: String,
    },
    /// List environment images
    Images,
    /// Create a new environment instance <name> from image <image> and attach to it
    Run {
        /// Image to create the environment from [default: work-env]
        image: Option<String>,
        /// Environment name [default: work-env]
        name: Option<String>,
        /// Overwrite an existing environment with the same name
        #[arg(short = 'y', long)]
        overwrite: bool,
        /// Remove the environment after the session finished
        #[arg(short, long)]
        remove: bool,
    },
    /// List environment instances
    Ps,
    /// Start an environment if it is not running and attach to it
    Enter {
        /// Environment name [default: work-env]
        name: Option<String>,
    },
    /// Remove environment instances
    Rm {
        /// Environments to remove
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Remove images built by work-env
    Rmi {
        /// Images to remove
        #[arg(required = true)]
        images: Vec<String>,
    },
}

impl Commands {
    /// Verb used in the `Failed to <verb>: ...` message
    fn verb(&self) -> &'static str {
        match self {
            Commands::Build { .. } => "build",
            Commands::Images => "list images",
            Commands::Run { .. } => "run environment",
            Commands::Ps => "list environment instances",
            Commands::Enter { .. } => "enter container",
            Commands::Rm { .. } => "remove container",
            Commands::Rmi { .. } => "remove image",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let verb = cli.command.verb();
    match run(cli) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Failed to {}: {}", verb, e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Dispatch the command; the result is the process exit code
fn run(cli: Cli) -> WorkEnvResult<i32> {
    let mut config = WorkEnvConfig::load(cli.config.as_deref())?;
    if let Some(runtime) = cli.runtime {
        config.runtime = runtime;
    }

    // Names are checked before any runtime is contacted
    match &cli.command {
        Commands::Build { image, .. } => validate_image_name(image)?,
        Commands::Run { image, name, .. } => {
            validate_image_name(image.as_deref().unwrap_or(&config.default_image))?;
            validate_container_name(name.as_deref().unwrap_or(&config.default_name))?;
        }
        Commands::Enter { name } => {
            validate_container_name(name.as_deref().unwrap_or(&config.default_name))?
        }
        Commands::Rm { names } => names.iter().try_for_each(|n| validate_container_name(n))?,
        Commands::Rmi { images } => images.iter().try_for_each(|i| validate_image_name(i))?,
        Commands::Images | Commands::Ps => {}
    }

    let runtime = CliRuntime::new(detect_runtime(config.runtime))
        .map_err(|e| WorkEnvError::runtime("detect runtime", e))?;
    debug!("Using container runtime '{}'", runtime.name());

    match cli.command {
        Commands::Build { path, image } => builder::build(&runtime, &path, &image).map(|_| 0),
        Commands::Images => inventory::list_images(&runtime, &mut io::stdout()).map(|_| 0),
        Commands::Run {
            image,
            name,
            overwrite,
            remove,
        } => {
            let options = RunOptions {
                image: image.unwrap_or_else(|| config.default_image.clone()),
                name: name.unwrap_or_else(|| config.default_name.clone()),
                overwrite,
                remove_after: remove,
                resolv_conf: config.resolv_conf.clone(),
            };
            let host = HostContext::capture(&config)?;
            LifecycleManager::new(&runtime, host).run(&options)
        }
        Commands::Ps => inventory::list_containers(&runtime, &mut io::stdout()).map(|_| 0),
        Commands::Enter { name } => {
            let name = name.unwrap_or_else(|| config.default_name.clone());
            session::enter(&runtime, &name)
        }
        Commands::Rm { names } => removal::remove_containers(&runtime, &names).map(|_| 0),
        Commands::Rmi { images } => removal::remove_images(&runtime, &images).map(|_| 0),
    }
}
