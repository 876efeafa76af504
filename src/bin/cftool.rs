use clap::{Args, Parser, Subcommand};
use content_filter::{
    config::{self, ConfigError},
    ContentFilter, Error, Filter, FilterConfig, FilterFactory, FilterResult, MessageType,
};
use std::{
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "filter.json")]
    config: PathBuf,

    /// Enable debug mode
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate an expression and print the fields it reads
    Check(Target),
    /// Evaluate an expression against JSON messages, one per line
    Eval {
        #[command(flatten)]
        target: Target,

        /// JSON lines file with one message per line
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Args)]
struct Target {
    /// JSON file with one message type or an array of them
    #[arg(short, long)]
    types: PathBuf,

    /// Message type to bind to; optional when the file holds a single type
    #[arg(long = "type")]
    type_name: Option<String>,

    /// Filter expression
    expression: String,

    /// Parameter values for %0, %1, ...
    #[arg(short, long = "param")]
    params: Vec<String>,
}

fn load_config(path: &Path) -> FilterResult<FilterConfig> {
    if path.exists() {
        Ok(FilterConfig::from_file(path)?)
    } else {
        debug!("no config at {}, using defaults", path.display());
        Ok(FilterConfig::default())
    }
}

fn read_to_string(path: &Path) -> FilterResult<String> {
    fs::read_to_string(path).map_err(|source| {
        ConfigError::Io {
            path: path.display().to_string(),
            source,
        }
        .into()
    })
}

fn load_type(target: &Target) -> FilterResult<Arc<MessageType>> {
    let types = MessageType::library_from_json_str(&read_to_string(&target.types)?)?;
    let selected = match &target.type_name {
        Some(name) => types.into_iter().find(|t| &t.name == name),
        None if types.len() == 1 => types.into_iter().next(),
        None => None,
    };
    selected
        .map(Arc::new)
        .ok_or_else(|| Error::UnknownType(target.type_name.clone().unwrap_or_default()))
}

fn check(factory: &FilterFactory, target: &Target) -> FilterResult<()> {
    let message_type = load_type(target)?;
    let filter = factory.create(&target.expression, &message_type, target.params.as_slice())?;
    match &filter {
        Filter::Empty(_) => println!("empty filter: accepts every message"),
        Filter::Expression(expression) => {
            println!("ok: {}", expression.text());
            for field in expression.fields() {
                println!("  {} : {}", field.signature(), field.path().primitive());
            }
        }
    }
    factory.release(filter);
    Ok(())
}

fn eval(factory: Arc<FilterFactory>, target: &Target, input: &Path) -> FilterResult<()> {
    let message_type = load_type(target)?;
    let filter = ContentFilter::new(factory);
    filter.set(&message_type, &target.expression, target.params.as_slice())?;

    let file = fs::File::open(input).map_err(|source| ConfigError::Io {
        path: input.display().to_string(),
        source,
    })?;
    let mut accepted = 0;
    let mut total = 0;
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| ConfigError::Io {
            path: input.display().to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let message: serde_json::Value = config::from_str(&line)?;
        let verdict = filter.evaluate(&message);
        total += 1;
        if verdict {
            accepted += 1;
        }
        println!("{}", if verdict { "accept" } else { "reject" });
    }
    info!("{} of {} messages accepted", accepted, total);
    Ok(())
}

fn run(cli: &Cli) -> FilterResult<()> {
    let config = load_config(&cli.config)?;
    debug!("config: {:?}", config);
    let factory = Arc::new(FilterFactory::new(config));

    match &cli.command {
        Command::Check(target) => check(&factory, target),
        Command::Eval { target, input } => eval(factory, target, input),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(position) = e.position() {
                eprintln!("  {}", cli_expression(&cli));
                eprintln!("  {}^", " ".repeat(position));
            }
            ExitCode::FAILURE
        }
    }
}

fn cli_expression(cli: &Cli) -> &str {
    match &cli.command {
        Command::Check(target) | Command::Eval { target, .. } => &target.expression,
    }
}
