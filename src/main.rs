//! buildcfg CLI
//!
//! Entry point for the `buildcfg` command-line tool.

use buildcfg::env::vars;
use buildcfg::{setup, BuildEnvironments, CommandTrialCompiler, FlagProbe, SetupOptions};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "buildcfg")]
#[command(about = "Probe toolchain flags and set up build environments", version)]
struct Cli {
    /// Project root
    #[arg(long, short = 'C', global = true, default_value = ".")]
    root: PathBuf,

    /// Global config file (default: <root>/build.conf)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Clean mode: do not probe the toolchain
    #[arg(long, global = true)]
    clean: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full setup and summarize the environments
    Configure {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List every recognized configuration variable
    Vars,

    /// Show one configured environment
    Show {
        #[arg(value_enum)]
        env: EnvName,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Probe flags against the configured toolchain
    Probe {
        /// Flags to probe
        #[arg(required = true, allow_hyphen_values = true)]
        flags: Vec<String>,

        /// Environment whose toolchain to use
        #[arg(long, value_enum, default_value = "target")]
        env: EnvName,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EnvName {
    Target,
    Host,
    Kernel,
}

impl EnvName {
    fn as_str(&self) -> &'static str {
        match self {
            EnvName::Target => "target",
            EnvName::Host => "host",
            EnvName::Kernel => "kernel",
        }
    }
}

#[derive(Serialize)]
struct ConfigureReport<'a> {
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    environments: &'a BuildEnvironments,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let options = SetupOptions::new(&cli.root).clean(cli.clean);
    let options = match cli.config {
        Some(path) => options.with_global_config(path),
        None => options,
    };

    match cli.command {
        Commands::Configure { json } => run_configure(&options, json),
        Commands::Vars => {
            let envs = configure_or_exit(&options.clone().clean(true));
            print!("{}", envs.help);
        }
        Commands::Show { env, json } => run_show(&options, env, json),
        Commands::Probe { flags, env, json } => run_probe(&options, &flags, env, json),
    }
}

/// `BUILDCFG_LOG_FORMAT=json` switches to JSON lines; `RUST_LOG` filters.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "buildcfg=info,buildcfg_trial=info".into());
    let format = std::env::var("BUILDCFG_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn configure_or_exit(options: &SetupOptions) -> BuildEnvironments {
    match setup(options, &CommandTrialCompiler::new()) {
        Ok(envs) => envs,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_configure(options: &SetupOptions, json: bool) {
    let envs = configure_or_exit(options);

    if json {
        print_json(&ConfigureReport {
            created_at: Utc::now(),
            environments: &envs,
        });
        return;
    }

    for report in &envs.reports {
        for result in &report.results {
            println!("[{}] {}", report.environment, result.label);
        }
    }
    if options.clean {
        println!("Clean mode: flag probes skipped");
    }
    println!();
    for env in [&envs.target, &envs.host, &envs.kernel] {
        println!(
            "  {:<7} arch={} system={} buildroot={}",
            env.name(),
            env.get_str(vars::ARCH).unwrap_or_default(),
            env.get_str(vars::SYSTEM).unwrap_or_default(),
            env.get_str(vars::BUILDROOT).unwrap_or_default(),
        );
        println!("          CFLAGS:    {}", env.get_list(vars::CFLAGS).join(" "));
        println!("          LINKFLAGS: {}", env.get_list(vars::LINKFLAGS).join(" "));
    }
    println!();
    for source in &envs.sources {
        println!(
            "  {:?} config: {} (sha256 {})",
            source.origin,
            source.path.display(),
            source.digest
        );
    }
}

fn run_show(options: &SetupOptions, name: EnvName, json: bool) {
    let envs = configure_or_exit(options);
    let Some(env) = envs.get(name.as_str()) else {
        eprintln!("Unknown environment: {}", name.as_str());
        process::exit(1);
    };

    if json {
        print_json(env);
        return;
    }

    println!("Environment: {}", env.name());
    for (key, value) in env.iter() {
        println!("  {} = {}", key, value.render());
    }
    let steps: Vec<String> = env.steps().iter().map(|s| format!("{:?}", s)).collect();
    println!("  steps: {}", steps.join(", "));
}

fn run_probe(options: &SetupOptions, flags: &[String], name: EnvName, json: bool) {
    // Probe against the loaded configuration, not an already filtered one.
    let envs = configure_or_exit(&options.clone().clean(true));
    let Some(env) = envs.get(name.as_str()) else {
        eprintln!("Unknown environment: {}", name.as_str());
        process::exit(1);
    };

    let compiler = CommandTrialCompiler::new();
    let probe = FlagProbe::new(&compiler);
    let results: Vec<_> = flags.iter().map(|flag| probe.probe(env, flag)).collect();

    if json {
        print_json(&results);
    } else {
        for result in &results {
            println!("{}", result.label);
        }
    }

    if results.iter().any(|r| !r.passed) {
        process::exit(1);
    }
}
