use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use runtime_init::commands::{inject_deployment, CommandSet};
use runtime_init::init::init_plugins;
use runtime_init::jobconfig::{JobConfig, DEFAULT_PLUGIN_NAMESPACE};
use runtime_init::{Result, RunReport};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "runtime-init")]
#[command(version = VERSION)]
#[command(about = "Resolve a job configuration into container pre/post command scripts")]
struct Cli {
    /// Path to the job configuration YAML
    jobconfig: String,

    /// Base directory holding plugins/ and runtime.d/
    base_dir: String,

    /// Task role this container runs as
    task_role: String,

    /// Key under `extras` holding the plugin reference list
    #[arg(long, default_value = DEFAULT_PLUGIN_NAMESPACE)]
    plugin_namespace: String,

    /// Also inject the selected deployment's pre/post command blocks
    #[arg(long)]
    with_deployment: bool,
}

fn run(cli: &Cli) -> Result<RunReport> {
    let base = PathBuf::from(shellexpand::tilde(&cli.base_dir).into_owned());

    info!(jobconfig = %cli.jobconfig, taskrole = %cli.task_role, "loading job configuration");
    let job = JobConfig::load(Path::new(&cli.jobconfig))?;

    let mut commands = CommandSet::new();
    let mut report = init_plugins(
        &job,
        &mut commands,
        &base,
        &cli.task_role,
        &cli.plugin_namespace,
    )?;

    if cli.with_deployment {
        inject_deployment(&job, &mut commands, &cli.task_role);
        report.pre_commands = commands.pre().len();
        report.post_commands = commands.post().len();
    }

    commands.persist(&base)?;
    info!(
        pre = report.pre_commands,
        post = report.post_commands,
        "command scripts written"
    );

    Ok(report)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(report) => {
            if let Ok(json) = serde_json::to_string_pretty(&report) {
                println!("{}", json);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(code = err.code(), "{}", err);
            let envelope = serde_json::json!({
                "error": { "code": err.code(), "message": err.to_string() }
            });
            println!("{}", envelope);
            ExitCode::FAILURE
        }
    }
}
