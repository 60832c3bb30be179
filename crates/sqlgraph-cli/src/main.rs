//! sqlgraph Command-Line Client
//!
//! Compiles JSON predicates against a JSON graph description and prints the
//! resulting SQL and arguments.

mod executor;
mod formatter;

use clap::{Parser, Subcommand};
use executor::Window;
use formatter::OutputFormat;
use sqlgraph_core::Dialect;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// sqlgraph Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "sqlgraph")]
#[command(version, about = "Compile graph predicates to SQL")]
pub struct Args {
    /// Graph description (JSON file, or - for stdin)
    #[arg(short, long, global = true, default_value = "graph.json")]
    pub graph: PathBuf,

    /// Target SQL dialect (postgres, mysql, sqlite)
    #[arg(short, long, global = true, default_value = "postgres")]
    pub dialect: Dialect,

    /// Output format
    #[arg(long, global = true, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a predicate into a SELECT over a node's table
    Compile {
        /// Start node type
        #[arg(short, long)]
        node: String,

        /// Predicate (JSON file, or - for stdin); no filter when omitted
        #[arg(short, long)]
        predicate: Option<PathBuf>,

        /// LIMIT clause
        #[arg(long)]
        limit: Option<u64>,

        /// OFFSET clause
        #[arg(long)]
        offset: Option<u64>,
    },

    /// Validate the graph description and summarize it
    Validate,

    /// Compile a SELECT of the rows related to one row over an edge
    Neighbors {
        /// Start node type
        #[arg(short, long)]
        node: String,

        /// Edge name on the start node
        #[arg(short, long)]
        edge: String,

        /// Primary key of the start row
        #[arg(long)]
        id: String,

        /// LIMIT clause
        #[arg(long)]
        limit: Option<u64>,

        /// OFFSET clause
        #[arg(long)]
        offset: Option<u64>,
    },
}

fn main() {
    let args = Args::parse();

    let default = if args.verbose { "sqlgraph=debug" } else { "sqlgraph=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<String, Box<dyn std::error::Error>> {
    let formatter = formatter::create_formatter(args.format);
    let graph = executor::load_graph(&args.graph)?;

    let output = match args.command {
        Command::Compile {
            node,
            predicate,
            limit,
            offset,
        } => {
            let predicate = predicate
                .map(|path| executor::read_input(&path))
                .transpose()?;
            executor::compile(
                &graph,
                &node,
                predicate.as_deref(),
                args.dialect,
                Window { limit, offset },
                &*formatter,
            )?
        }
        Command::Validate => executor::validate(&graph, &*formatter),
        Command::Neighbors {
            node,
            edge,
            id,
            limit,
            offset,
        } => executor::neighbors(
            &graph,
            &node,
            &edge,
            &id,
            args.dialect,
            Window { limit, offset },
            &*formatter,
        )?,
    };
    Ok(output)
}
