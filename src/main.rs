use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use ecapply::{
    find_settings_file, generate_settings_file_in, load_settings, merge_editor_settings, run,
    should_use_colors, ApplicationController, CliEditorOptions, Config, ConfigResolutionCache,
    DefaultSettings, EditorConfigResolver, EditorSettings, GenerateOutcome, InsertSpacesSetting,
    MessageLevel, OutputContext, OutputMode, SettingsToml, TabSizeSetting, Workspace,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecapply")]
#[command(version, about = "Apply .editorconfig settings to files")]
struct Cli {
    /// Target files or directories
    #[arg(required_unless_present_any = ["init", "init_settings"])]
    paths: Vec<String>,

    /// Check only (no modifications), exit 1 if problems found
    #[arg(short, long)]
    check: bool,

    /// Show changes in diff format
    #[arg(short, long)]
    diff: bool,

    /// Output only modified file names
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show checked and skipped files and the options applied to each
    #[arg(short, long)]
    verbose: bool,

    /// Editor tab size: a number or "auto"
    #[arg(long, value_name = "N|auto")]
    tab_size: Option<String>,

    /// Editor indents with spaces
    #[arg(long, conflicts_with = "tabs")]
    insert_spaces: bool,

    /// Editor indents with tabs
    #[arg(long)]
    tabs: bool,

    /// Editor trims trailing whitespace itself; leave trimming to it
    #[arg(long)]
    host_trims: bool,

    /// Generate a root .editorconfig from the editor settings in the current directory
    #[arg(long)]
    init: bool,

    /// Generate a template ecapply.toml settings file
    #[arg(long, conflicts_with = "init")]
    init_settings: bool,

    /// Specify settings file path (overrides auto-discovery)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Force colored output
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Handle --init-settings command
    if cli.init_settings {
        return handle_init_settings();
    }

    // Load settings file
    let settings_toml = load_configuration(&cli.config, cli.quiet);

    // Merge settings: CLI > TOML > defaults
    let settings =
        merge_editor_settings(&build_cli_options(&cli), settings_toml.as_ref().map(|s| &s.editor));

    // Handle --init command
    if cli.init {
        return handle_init(settings).await;
    }

    let output_mode = if cli.quiet {
        OutputMode::Quiet
    } else if cli.diff {
        OutputMode::Diff
    } else {
        OutputMode::Normal
    };

    let ctx = OutputContext::new(
        output_mode,
        should_use_colors(cli.color, cli.no_color),
        cli.verbose,
        !cli.quiet && io::stderr().is_terminal(),
    );

    let config = Config {
        check_only: cli.check,
        output_mode,
        settings,
    };

    match run(&cli.paths, &config, &ctx).await {
        Ok(result) => {
            if config.check_only && result.has_problems() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// `warn` by default, `debug` with --verbose; RUST_LOG overrides both.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn handle_init_settings() -> ExitCode {
    match generate_settings_file_in(None) {
        Ok(path) => {
            println!("Created {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Run the generate-configuration-file command against the current directory.
async fn handle_init(settings: EditorSettings) -> ExitCode {
    let workspace = Arc::new(Workspace::new(std::env::current_dir().ok(), settings));
    let cache = Arc::new(ConfigResolutionCache::new(
        Arc::new(EditorConfigResolver::new()),
        DefaultSettings::default(),
    ));
    let controller = ApplicationController::new(workspace.clone(), cache);

    let outcome = controller.generate_config_file();
    for (level, message) in workspace.messages() {
        match level {
            MessageLevel::Info => eprintln!("{message}"),
            MessageLevel::Error => eprintln!("Error: {message}"),
        }
    }

    match outcome {
        Ok(GenerateOutcome::Created(path)) => {
            println!("Created {}", path.display());
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::from(1),
    }
}

fn load_configuration(explicit_path: &Option<PathBuf>, quiet: bool) -> Option<SettingsToml> {
    let settings_path = explicit_path.clone().or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|d| find_settings_file(&d))
    });

    settings_path.and_then(|p| match load_settings(&p) {
        Ok(settings) => {
            if !quiet {
                eprintln!("Using settings: {}", p.display());
            }
            Some(settings)
        }
        Err(e) => {
            eprintln!("Warning: Failed to load {}: {}", p.display(), e);
            None
        }
    })
}

fn build_cli_options(cli: &Cli) -> CliEditorOptions {
    // Boolean flags are always present (default false), so false means
    // "not set" for merging with the settings file.
    let insert_spaces = if cli.tabs {
        Some(InsertSpacesSetting::Flag(false))
    } else {
        cli.insert_spaces.then_some(InsertSpacesSetting::Flag(true))
    };

    CliEditorOptions {
        tab_size: cli.tab_size.as_deref().map(parse_tab_size),
        insert_spaces,
        host_trims: cli.host_trims.then_some(true),
    }
}

fn parse_tab_size(value: &str) -> TabSizeSetting {
    value
        .parse::<u32>()
        .map(TabSizeSetting::Number)
        .unwrap_or_else(|_| TabSizeSetting::Keyword(value.to_string()))
}
