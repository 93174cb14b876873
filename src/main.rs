use clap::Parser;
use pql::config::EvaluatorConfig;
use pql::evaluator::cancellation::CancellationToken;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Answers PQL queries about a SIMPLE program, one query per line.
#[derive(Debug, Parser)]
#[command(name = "spa", version)]
struct Args {
    /// SIMPLE source file.
    source: PathBuf,
    /// File with one query per line. Read from stdin when absent.
    queries: Option<PathBuf>,
    /// Stop evaluating a query after this many milliseconds and print what
    /// was found so far.
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(long, default_value_t = EvaluatorConfig::DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,
    /// Print the parsed program and exit.
    #[arg(long)]
    print_ast: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let program = std::fs::read_to_string(&args.source)?;

    if args.print_ast {
        println!("{:#?}", spa::parse(&program)?);
        return Ok(());
    }

    let pkb = spa::analyze(&program)?;
    let config = EvaluatorConfig::builder()
        .with_cache_capacity(args.cache_capacity)
        .build();

    let queries = match &args.queries {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            input
        }
    };

    for query in queries.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let token = CancellationToken::new();
        if let Some(timeout) = args.timeout_ms {
            let token = token.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(timeout));
                token.cancel();
            });
        }

        match spa::answer(&pkb, query, &config, &token) {
            Ok(answer) => println!("{}", answer.join(", ")),
            Err(err) => {
                warn!(%err, query, "query.invalid");
                println!();
            }
        }
    }

    Ok(())
}
