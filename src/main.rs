//! CLI entry point for the symbol graph engine.
//!
//! Provides commands for normalizing extraction facts into a graph index
//! and querying the persisted index.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use symgraph::graph::{GraphIndex, GraphKind, IndexPersistence};
use symgraph::{NormalizeError, Normalizer, SearchFilter, Settings, SymbolKind};
use tracing_subscriber::EnvFilter;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Symbol graph normalization and query engine
#[derive(Parser)]
#[command(
    name = "symgraph",
    version = env!("CARGO_PKG_VERSION"),
    about = "Normalize multi-source symbol facts into a queryable graph index",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom symgraph.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Index directory (overrides config)
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default symgraph.toml in the current directory
    #[command(about = "Set up a default symgraph.toml configuration")]
    Init {
        /// Force overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Normalize a facts file and build the graph index
    #[command(
        about = "Normalize extraction facts into a persisted graph index",
        after_help = "Examples:\n  symgraph normalize facts.json\n  symgraph normalize facts.json --index /tmp/idx --emit-symbols"
    )]
    Normalize {
        /// Path to a JSON facts payload
        facts: PathBuf,

        /// Print all normalized symbols, not just the summary
        #[arg(long)]
        emit_symbols: bool,
    },

    /// Query the persisted graph index
    Query {
        #[command(subcommand)]
        query: QueryCommand,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from symgraph.toml")]
    Config,

    /// Show statistics for the persisted index
    Info,
}

#[derive(Subcommand)]
enum QueryCommand {
    /// Look up one symbol by name or fqname
    Find { name: String },

    /// Inheritance chain upward, nearest ancestor first
    Ancestors { name: String },

    /// All transitive subclasses
    Descendants { name: String },

    /// Direct dependencies of a symbol
    Dependencies { name: String },

    /// Symbols that depend on a symbol
    Dependents { name: String },

    /// Direct callers with call frequency
    Callers { name: String },

    /// Outgoing call chains from a symbol
    Trace {
        name: String,

        /// Maximum number of hops to follow
        #[arg(long, default_value_t = 5)]
        depth: usize,
    },

    /// Substring search with optional filters
    #[command(after_help = "Examples:\n  symgraph query search user --kind class\n  symgraph query search user --namespace MyApp:: --file models/")]
    Search {
        pattern: String,

        /// Restrict to one symbol kind (class, module, method)
        #[arg(long)]
        kind: Option<String>,

        /// Restrict to an fqname prefix
        #[arg(long)]
        namespace: Option<String>,

        /// Restrict to symbols whose file path contains this fragment
        #[arg(long)]
        file: Option<String>,

        /// Match case-sensitively
        #[arg(long)]
        case_sensitive: bool,
    },

    /// Fuzzy search ranked by similarity
    Fuzzy {
        query: String,

        /// Minimum normalized score (0.0 - 1.0, overrides config)
        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Shortest path between two symbols
    Path {
        from: String,
        to: String,

        /// Graph to walk: inheritance, dependency, calls, or mixins
        #[arg(long, default_value = "dependency")]
        graph: String,
    },

    /// Symbols flagged by fan-in/fan-out/call-weight thresholds
    Hotspots,

    /// Cycles in the dependency graph
    Cycles,
}

#[derive(Debug, Serialize)]
struct NormalizeSummary {
    symbols: usize,
    classes: usize,
    modules: usize,
    methods: usize,
    method_calls: usize,
    errors: usize,
    flagged_cycles: usize,
    index_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct IndexInfo {
    symbols: usize,
    classes: usize,
    modules: usize,
    methods: usize,
    flagged_cycles: usize,
    index_path: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let index_path = cli.index.clone().unwrap_or_else(|| settings.index_path.clone());

    let outcome = match cli.command {
        Commands::Init { force } => run_init(&settings, force),
        Commands::Normalize { facts, emit_symbols } => {
            run_normalize(&settings, &facts, &index_path, emit_symbols)
        }
        Commands::Query { query } => run_query(&settings, &index_path, query),
        Commands::Config => {
            print_json(&settings);
            Ok(())
        }
        Commands::Info => run_info(&index_path),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error [{}]: {e}", e.status_code());
            for suggestion in e.recovery_suggestions() {
                eprintln!("  hint: {suggestion}");
            }
            ExitCode::FAILURE
        }
    }
}

fn load_settings(config: Option<&Path>) -> Result<Settings, Box<figment::Error>> {
    match config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
}

fn run_init(settings: &Settings, force: bool) -> Result<(), NormalizeError> {
    let path = PathBuf::from("symgraph.toml");
    if path.exists() && !force {
        return Err(NormalizeError::Config {
            reason: "symgraph.toml already exists (use --force to overwrite)".to_string(),
        });
    }
    let rendered = toml::to_string_pretty(settings).map_err(|e| NormalizeError::Config {
        reason: e.to_string(),
    })?;
    std::fs::write(&path, rendered).map_err(|e| NormalizeError::Persistence {
        path: path.clone(),
        source: Box::new(e),
    })?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn run_normalize(
    settings: &Settings,
    facts: &Path,
    index_path: &Path,
    emit_symbols: bool,
) -> Result<(), NormalizeError> {
    let raw = std::fs::read_to_string(facts).map_err(|e| NormalizeError::Load {
        path: facts.to_path_buf(),
        source: Box::new(e),
    })?;
    let payload: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| NormalizeError::Load {
            path: facts.to_path_buf(),
            source: Box::new(e),
        })?;

    let normalizer = Normalizer::new(std::sync::Arc::new(settings.clone()));
    let result = normalizer.normalize(payload)?;
    let index = GraphIndex::build(&result);

    let persistence = IndexPersistence::new(index_path);
    persistence.save(&index)?;

    let summary = NormalizeSummary {
        symbols: result.symbols.len(),
        classes: result.classes().count(),
        modules: result.modules().count(),
        methods: result.methods().count(),
        method_calls: result.method_calls.len(),
        errors: result.errors.len(),
        flagged_cycles: index.flagged_cycles().len(),
        index_path: index_path.to_path_buf(),
    };
    print_json(&summary);
    if emit_symbols {
        print_json(&result.symbols);
    }
    if !result.errors.is_empty() {
        print_json(&result.errors);
    }
    Ok(())
}

fn run_info(index_path: &Path) -> Result<(), NormalizeError> {
    let index = IndexPersistence::new(index_path).load()?;
    let info = IndexInfo {
        symbols: index.symbol_count(),
        classes: index.iter_symbols().filter(|s| s.is_class()).count(),
        modules: index.iter_symbols().filter(|s| s.is_module()).count(),
        methods: index.iter_symbols().filter(|s| s.is_method()).count(),
        flagged_cycles: index.flagged_cycles().len(),
        index_path: index_path.to_path_buf(),
    };
    print_json(&info);
    Ok(())
}

fn run_query(
    settings: &Settings,
    index_path: &Path,
    query: QueryCommand,
) -> Result<(), NormalizeError> {
    let index = IndexPersistence::new(index_path).load()?;
    match query {
        QueryCommand::Find { name } => {
            let symbol = index
                .find_symbol(&name)
                .ok_or(NormalizeError::SymbolNotFound { name })?;
            print_json(symbol);
        }
        QueryCommand::Ancestors { name } => {
            require_symbol(&index, &name)?;
            print_json(&index.ancestors_of(&name));
        }
        QueryCommand::Descendants { name } => {
            require_symbol(&index, &name)?;
            print_json(&index.descendants_of(&name));
        }
        QueryCommand::Dependencies { name } => {
            require_symbol(&index, &name)?;
            print_json(&index.dependencies_of(&name));
        }
        QueryCommand::Dependents { name } => {
            require_symbol(&index, &name)?;
            print_json(&index.dependents_of(&name));
        }
        QueryCommand::Callers { name } => {
            require_symbol(&index, &name)?;
            print_json(&index.callers_of(&name));
        }
        QueryCommand::Trace { name, depth } => {
            require_symbol(&index, &name)?;
            print_json(&index.trace_calls_from(&name, depth));
        }
        QueryCommand::Search {
            pattern,
            kind,
            namespace,
            file,
            case_sensitive,
        } => {
            let kind = kind
                .as_deref()
                .map(|k| {
                    k.parse::<SymbolKind>().map_err(|_| NormalizeError::InvalidQuery {
                        reason: format!("unknown symbol kind '{k}'"),
                    })
                })
                .transpose()?;
            let filter = SearchFilter {
                kind,
                namespace,
                file_pattern: file,
                case_sensitive,
            };
            let results: Vec<_> = index
                .search_symbols(&pattern, &filter)
                .into_iter()
                .take(settings.search.max_results)
                .collect();
            print_json(&results);
        }
        QueryCommand::Fuzzy { query, threshold } => {
            let threshold = threshold.unwrap_or(settings.search.fuzzy_threshold);
            let matches: Vec<_> = index
                .fuzzy_search(&query, threshold)?
                .into_iter()
                .take(settings.search.max_results)
                .collect();
            print_json(&matches);
        }
        QueryCommand::Path { from, to, graph } => {
            let graph = parse_graph_kind(&graph)?;
            require_symbol(&index, &from)?;
            require_symbol(&index, &to)?;
            print_json(&index.shortest_path(&from, &to, graph));
        }
        QueryCommand::Hotspots => {
            print_json(&index.hotspots(&settings.hotspots));
        }
        QueryCommand::Cycles => {
            let mut cycles = index.flagged_cycles().to_vec();
            cycles.extend(index.dependency_cycles());
            cycles.dedup();
            print_json(&cycles);
        }
    }
    Ok(())
}

fn require_symbol(index: &GraphIndex, name: &str) -> Result<(), NormalizeError> {
    if index.find_symbol(name).is_none() {
        return Err(NormalizeError::SymbolNotFound {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn parse_graph_kind(value: &str) -> Result<GraphKind, NormalizeError> {
    match value {
        "inheritance" => Ok(GraphKind::Inheritance),
        "dependency" => Ok(GraphKind::Dependency),
        "calls" => Ok(GraphKind::Calls),
        "mixins" => Ok(GraphKind::Mixins),
        other => Err(NormalizeError::InvalidQuery {
            reason: format!(
                "unknown graph '{other}', expected inheritance, dependency, calls, or mixins"
            ),
        }),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}
