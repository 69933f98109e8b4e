use chainviz::config::SimulatorConfig;
use chainviz::hash::HashAlgorithm;
use chainviz::session::{Command, Session};
use chainviz::Block;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "chainviz",
    version,
    about = "Hash-chain integrity simulator: tamper with blocks and repair the links"
)]
struct Cli {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Digest algorithm (overrides config)
    #[arg(long)]
    algorithm: Option<HashAlgorithm>,

    /// Leading zeros required when mining (overrides config)
    #[arg(long)]
    difficulty: Option<u32>,

    /// Nonces to try before mining gives up (overrides config)
    #[arg(long)]
    max_attempts: Option<u64>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add two blocks, tamper with the first, then repair
    Demo,
    /// Run controller commands from a script or stdin
    Session {
        /// Script file (default: stdin)
        #[arg(long)]
        script: Option<PathBuf>,
        /// Artificial delay before each block is appended
        #[arg(long, default_value = "0")]
        mining_delay_ms: u64,
    },
    /// Print the genesis block
    Genesis,
}

fn main() {
    let cli = Cli::parse();

    let result = load_config(&cli).and_then(|config| {
        init_logging(&config, cli.verbose);
        match &cli.command {
            Commands::Demo => cmd_demo(&config),
            Commands::Session {
                script,
                mining_delay_ms,
            } => cmd_session(&config, script.as_deref(), *mining_delay_ms),
            Commands::Genesis => cmd_genesis(&config),
        }
    });

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<SimulatorConfig, Box<dyn std::error::Error>> {
    let mut config = SimulatorConfig::load_or_default(cli.config.as_deref())?;
    if let Some(algorithm) = cli.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(difficulty) = cli.difficulty {
        config.mining.difficulty = difficulty;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.mining.max_attempts = max_attempts;
    }
    Ok(config)
}

fn init_logging(config: &SimulatorConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { config.log_level.as_str() };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn cmd_demo(config: &SimulatorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(config);
    let steps = [
        Command::Add("A".into()),
        Command::Add("B".into()),
        Command::Validate { json: false },
        Command::Tamper {
            index: 1,
            payload: "A-modified".into(),
        },
        Command::Validate { json: false },
        Command::Repair(Some(1)),
        Command::Validate { json: false },
    ];
    for step in &steps {
        println!("> {}", step);
        println!("{}", session.apply(step)?);
    }
    Ok(())
}

fn cmd_session(
    config: &SimulatorConfig,
    script: Option<&std::path::Path>,
    mining_delay_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session =
        Session::new(config).with_mining_delay(Duration::from_millis(mining_delay_ms));
    let mut stdout = io::stdout().lock();
    let summary = match script {
        Some(path) => session.run(BufReader::new(File::open(path)?), &mut stdout)?,
        None => session.run(io::stdin().lock(), &mut stdout)?,
    };
    print!("{}", summary);
    Ok(())
}

fn cmd_genesis(config: &SimulatorConfig) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", Block::genesis(config.algorithm));
    Ok(())
}
