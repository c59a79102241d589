use anyhow::Result;
use clap::{Parser, Subcommand};
use keychord::{config, keybindings, search, tui};

#[derive(Parser, Debug)]
#[command(name = "keychord")]
#[command(about = "Inspect hotkeys, fuzzy-filter lists and try out command dispatch")]
#[command(version)]
struct Args {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show how a hotkey string is parsed
    Parse {
        hotkey: String,
        /// Leader substituted for <leader> (defaults to the config's leader)
        #[arg(long)]
        leader: Option<String>,
    },
    /// Rank candidates against a fuzzy query
    Filter {
        query: String,
        #[arg(required = true)]
        candidates: Vec<String>,
    },
    /// Read keys from the terminal and report which demo command fires
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("keychord=info".parse()?),
        )
        .init();

    let config = config::load(args.config.as_deref())?;

    match args.command {
        Command::Parse { hotkey, leader } => {
            let leader = leader.or(config.leader);
            let parsed = keybindings::parse(&hotkey, leader.as_deref());
            println!("{parsed}");
            for (i, step) in parsed.steps().iter().enumerate() {
                println!(
                    "  step {}: key={:?} ctrl={} meta={} shift={} option={}",
                    i + 1,
                    step.key,
                    step.ctrl,
                    step.meta,
                    step.shift,
                    step.option
                );
            }
        }
        Command::Filter { query, candidates } => {
            for m in search::filter(&candidates, &query) {
                println!(
                    "{:>4}  {}",
                    m.score,
                    highlight(&candidates[m.index], &m.positions)
                );
            }
        }
        Command::Watch => tui::run(config).await?,
    }

    Ok(())
}

/// Wrap matched characters in brackets.
fn highlight(candidate: &str, positions: &[usize]) -> String {
    candidate
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if positions.contains(&i) {
                format!("[{c}]")
            } else {
                c.to_string()
            }
        })
        .collect()
}
