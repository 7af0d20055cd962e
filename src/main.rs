use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;

use asmlens::Request;
use asmlens::cancel::CancelToken;
use asmlens::providers::Workspace;
use asmlens::types::Position;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

/// asmlens: labels, modules and macros of assembly sources and listings,
/// found with line-oriented patterns. No assembler required.
#[derive(Parser)]
#[command(name = "asmlens", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Workspace root. Repeat for several roots; each may carry an asmlens.toml.
    #[arg(long = "root", global = true, default_value = ".")]
    roots: Vec<PathBuf>,

    /// Machine-readable JSON output.
    #[arg(long, global = true)]
    json: bool,

    /// Log search details to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Print shell completions for the given shell.
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Print the default asmlens.toml.
    #[arg(long)]
    default_config: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Outline of one file: modules, structs, macros, labels.
    Outline { file: PathBuf },
    /// Where the label at LINE:COL is declared.
    Definition {
        file: PathBuf,
        #[arg(value_parser = parse_position)]
        at: Position,
    },
    /// Every use of the label at LINE:COL.
    References {
        file: PathBuf,
        #[arg(value_parser = parse_position)]
        at: Position,
        /// Also list declarations.
        #[arg(long)]
        declarations: bool,
    },
    /// Completion candidates for the text left of LINE:COL.
    Complete {
        file: PathBuf,
        #[arg(value_parser = parse_position)]
        at: Position,
    },
    /// Fuzzy search for declarations across every root.
    Symbols { query: String },
    /// Documentation comments of the label at LINE:COL.
    Hover {
        file: PathBuf,
        #[arg(value_parser = parse_position)]
        at: Position,
    },
    /// Edits that rename the label at LINE:COL to NEW_NAME.
    Rename {
        file: PathBuf,
        #[arg(value_parser = parse_position)]
        at: Position,
        new_name: String,
    },
    /// Reference counts for every symbol declared in a file.
    Lens { file: PathBuf },
}

impl Command {
    fn into_request(self) -> Request {
        match self {
            Self::Outline { file } => Request::Outline { file },
            Self::Definition { file, at } => Request::Definition { file, position: at },
            Self::References {
                file,
                at,
                declarations,
            } => Request::References {
                file,
                position: at,
                include_declaration: declarations,
            },
            Self::Complete { file, at } => Request::Complete { file, position: at },
            Self::Symbols { query } => Request::Symbols { query },
            Self::Hover { file, at } => Request::Hover { file, position: at },
            Self::Rename { file, at, new_name } => Request::Rename {
                file,
                position: at,
                new_name,
            },
            Self::Lens { file } => Request::Lens { file },
        }
    }
}

/// `LINE:COL`, both 1-based.
fn parse_position(s: &str) -> Result<Position, String> {
    let (line, col) = s
        .split_once(':')
        .ok_or_else(|| format!("expected LINE:COL, got \"{s}\""))?;
    let line: u32 = line.trim().parse().map_err(|_| format!("bad line \"{line}\""))?;
    let col: u32 = col.trim().parse().map_err(|_| format!("bad column \"{col}\""))?;
    if line == 0 || col == 0 {
        return Err("LINE and COL start at 1".to_string());
    }
    Ok(Position::new(line - 1, col - 1))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "asmlens=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    // Shell completions
    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "asmlens", &mut io::stdout());
        return;
    }

    if cli.default_config {
        print!("{}", asmlens::config::DEFAULT_CONFIG);
        return;
    }

    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        eprintln!("usage: asmlens <outline|definition|references|complete|symbols|hover|rename|lens> ... [--root DIR]");
        process::exit(3);
    };

    let workspace = match Workspace::open(&cli.roots) {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("{e}");
            process::exit(e.exit_code());
        }
    };

    let request = command.into_request();
    match asmlens::run(&request, &workspace, cli.json, &CancelToken::new()) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("{e}");
            process::exit(e.exit_code());
        }
    }
}
