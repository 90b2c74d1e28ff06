use clap::{Parser, Subcommand};
use gitpanel::auth::hash_password;
use gitpanel::config::{ConfigOption, EnvFile, SetupError, SetupWizard, Settings, configure_global_identity};
use gitpanel::git::BinaryResolver;
use gitpanel::server::{AppState, serve};
use gitpanel::{AppResult, SystemRunner};
use std::io::{self, BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "gitpanel")]
#[command(about = "Password-gated web control panel for git", long_about = None)]
#[command(version)]
struct Cli {
    /// Environment file holding the GIT_MANAGER_* settings
    #[arg(long, env = "GIT_MANAGER_ENV_FILE", default_value = ".env", global = true)]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP panel (default)
    Serve,

    /// Interactive first-time setup
    Setup,

    /// Change a single setting after re-entering the access password
    Config {
        /// username, token, name, email, password or all
        option: Option<String>,
    },

    /// Hash a password read from stdin, for manual configuration
    HashPassword,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(&cli.env_file).await,
        Commands::Setup => run_setup(&cli.env_file),
        Commands::Config { option } => run_config(&cli.env_file, option.as_deref()),
        Commands::HashPassword => run_hash_password(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_server(env_file: &Path) -> AppResult<()> {
    let settings = Settings::load(Some(env_file))?;
    if !settings.has_access_password() {
        tracing::warn!("no access password configured; every panel route answers 503 until `gitpanel setup` is run");
    }

    let state = AppState::new(settings, Arc::new(SystemRunner::new()))?;
    serve(Arc::new(state)).await?;
    Ok(())
}

fn run_setup(env_file: &Path) -> AppResult<()> {
    let mut env = EnvFile::open(env_file)?;
    let mut wizard = terminal_wizard();

    let outcome = match wizard.run(&mut env) {
        Ok(outcome) => outcome,
        Err(SetupError::Cancelled) => {
            println!("Setup cancelled. Nothing was changed.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if outcome.configure_global_identity {
        let runner = SystemRunner::new();
        let binary = BinaryResolver::git().resolve(&runner);
        let work_dir = std::env::current_dir()?;
        let (name, email) = configure_global_identity(&runner, &binary, &work_dir, &outcome.identity);

        for (label, result) in [("user.name", name), ("user.email", email)] {
            if result.success {
                println!("✓ Global {} set", label);
            } else {
                println!("✗ Could not set global {}: {}", label, result.error.trim());
            }
        }
    }

    println!("Start the panel with `gitpanel serve`.");
    Ok(())
}

fn run_config(env_file: &Path, option: Option<&str>) -> AppResult<()> {
    let option = option.map(str::parse::<ConfigOption>).transpose()?;
    let mut env = EnvFile::open(env_file)?;
    let mut wizard = terminal_wizard();

    match wizard.update(&mut env, option) {
        Ok(()) => Ok(()),
        Err(SetupError::Cancelled) => {
            println!("Nothing was changed.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Secrets are typed without echo when a person is at the terminal
fn terminal_wizard() -> SetupWizard<io::StdinLock<'static>, io::Stdout> {
    let wizard = SetupWizard::new(io::stdin().lock(), io::stdout());
    if io::stdin().is_terminal() {
        wizard.with_hidden_secrets()
    } else {
        wizard
    }
}

fn run_hash_password() -> AppResult<()> {
    let password = if io::stdin().is_terminal() {
        rpassword::prompt_password("Password: ")?
    } else {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line
    };
    let password = password.trim_end_matches(['\r', '\n']);
    println!("{}", hash_password(password)?);
    Ok(())
}
