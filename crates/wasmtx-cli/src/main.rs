use clap::{Args, Parser, Subcommand};
use colored::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use wasmtx_core::config::ChainConfig;
use wasmtx_core::context::{BasicEnvelopeVerifier, TxExecuteContext, ValidationState};
use wasmtx_core::engine::ScriptedEngine;
use wasmtx_core::native::NativeContracts;
use wasmtx_core::store::MemoryStore;
use wasmtx_core::{Name, WasmContractTransaction};

/// wasmtx: wasm contract transaction engine CLI
///
/// Admit, execute and inspect wasm contract transactions against a JSON
/// account/contract snapshot.
#[derive(Parser)]
#[command(name = "wasmtx", version, about, long_about = None)]
struct Cli {
    /// Print nothing on stdout; the exit code reports the outcome
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log engine activity to stderr (-v debug, -vv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Inputs {
    /// Path to the transaction JSON
    #[arg(long)]
    tx: PathBuf,
    /// Path to the account/contract snapshot JSON
    #[arg(long)]
    state: PathBuf,
    /// Path to the chain configuration JSON (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Chain height (defaults to the transaction's valid height)
    #[arg(long)]
    height: Option<u32>,
    /// Fuel price per 100 run steps
    #[arg(long, default_value_t = 100)]
    fuel_rate: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the admission checks
    Check {
        #[command(flatten)]
        inputs: Inputs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Admit, then execute with the scripted engine and print the trace
    Execute {
        #[command(flatten)]
        inputs: Inputs,
        /// Path to engine scripts keyed by "receiver::action"
        #[arg(long)]
        script: Option<PathBuf>,
    },

    /// Print a one-line summary of a transaction
    Show {
        /// Path to the transaction JSON
        #[arg(long)]
        tx: PathBuf,
        /// Path to the account/contract snapshot JSON
        #[arg(long)]
        state: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the transaction id (double SHA-256)
    Hash {
        /// Path to the transaction JSON
        #[arg(long)]
        tx: PathBuf,
    },

    /// Convert a name to its 64-bit value, or a value to its name
    Name {
        /// Name text or decimal value
        value: String,
    },

    /// Show version information
    Version,
}

// ── Loading ───────────────────────────────────────────────

struct Loaded {
    tx: WasmContractTransaction,
    store: MemoryStore,
    config: ChainConfig,
}

fn read(path: &Path, what: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {} {}: {}", what, path.display(), e))
}

fn load_tx(path: &Path) -> Result<WasmContractTransaction, String> {
    WasmContractTransaction::from_json(&read(path, "transaction")?).map_err(|e| e.to_string())
}

fn load_store(path: &Path) -> Result<MemoryStore, String> {
    MemoryStore::from_json(&read(path, "state")?).map_err(|e| e.to_string())
}

fn load(inputs: &Inputs) -> Result<Loaded, String> {
    let config = match &inputs.config {
        Some(path) => ChainConfig::from_json(&read(path, "config")?).map_err(|e| e.to_string())?,
        None => ChainConfig::default(),
    };
    let tx = load_tx(&inputs.tx)?;
    let store = load_store(&inputs.state)?;
    debug!(
        tx = %inputs.tx.display(),
        state = %inputs.state.display(),
        txid = %tx.id(),
        inline = tx.inline_transactions.len(),
        "inputs loaded"
    );
    Ok(Loaded { tx, store, config })
}

// ── Commands ──────────────────────────────────────────────

/// Run admission against `loaded`, leaving the outcome in `state`
fn admit(loaded: &mut Loaded, inputs: &Inputs, natives: &NativeContracts, state: &mut ValidationState) -> Result<bool, String> {
    let envelope = BasicEnvelopeVerifier::from_config(&loaded.config);
    let height = inputs.height.unwrap_or(loaded.tx.valid_height);
    debug!(height, fuel_rate = inputs.fuel_rate, "admitting transaction");
    let mut ctx = TxExecuteContext::new(&mut loaded.store, state, natives, &loaded.config, &envelope)
        .at_height(height)
        .with_fuel_rate(inputs.fuel_rate)
        .with_dos_level(loaded.config.dos_level);
    loaded.tx.check_tx(&mut ctx).map_err(|e| e.to_string())
}

fn print_rejection(state: &ValidationState, verb: &str) {
    if let Some(rejection) = state.rejection() {
        println!(
            "{} {} [{}] {}",
            "✗".red().bold(),
            verb.red(),
            rejection.code,
            rejection.message
        );
    }
}

fn cmd_check(inputs: Inputs, json: bool, quiet: bool) -> Result<i32, String> {
    let mut loaded = load(&inputs)?;
    let natives = NativeContracts::default();
    let mut state = ValidationState::new();
    let accepted = admit(&mut loaded, &inputs, &natives, &mut state)?;
    let txid = loaded.tx.id();

    if json {
        let mut doc = serde_json::json!({ "accepted": accepted, "txid": txid.to_string() });
        if let Some(rejection) = state.rejection() {
            doc["code"] = rejection.code.into();
            doc["kind"] = rejection.kind.into();
            doc["message"] = rejection.message.clone().into();
            doc["dos_level"] = rejection.dos_level.into();
        }
        if !quiet {
            println!("{}", doc);
        }
    } else if !quiet {
        if accepted {
            println!("{} {} {}", "✓".green().bold(), "accepted".green(), txid);
        } else {
            print_rejection(&state, "rejected");
        }
    }
    Ok(if accepted { 0 } else { 1 })
}

fn cmd_execute(inputs: Inputs, script: Option<PathBuf>, quiet: bool) -> Result<i32, String> {
    let mut loaded = load(&inputs)?;
    let engine = match &script {
        Some(path) => ScriptedEngine::from_json(&read(path, "script")?, loaded.config.max_inline_depth)
            .map_err(|e| e.to_string())?,
        None => ScriptedEngine::new(loaded.config.max_inline_depth),
    };
    let natives = NativeContracts::default();

    let mut state = ValidationState::new();
    if !admit(&mut loaded, &inputs, &natives, &mut state)? {
        if !quiet {
            print_rejection(&state, "rejected");
        }
        return Ok(1);
    }

    let envelope = BasicEnvelopeVerifier::from_config(&loaded.config);
    let height = inputs.height.unwrap_or(loaded.tx.valid_height);
    debug!(height, "executing transaction");
    let mut state = ValidationState::new();
    let executed = {
        let mut ctx = TxExecuteContext::new(&mut loaded.store, &mut state, &natives, &loaded.config, &envelope)
            .at_height(height)
            .with_fuel_rate(inputs.fuel_rate)
            .with_dos_level(loaded.config.dos_level);
        loaded.tx.execute_tx(&mut ctx, &engine)
    };

    if !quiet {
        match state.return_value() {
            Some(trace) if executed => println!("{}", trace),
            _ => print_rejection(&state, "execution failed"),
        }
    }
    Ok(if executed { 0 } else { 1 })
}

fn cmd_show(tx: &Path, state: &Path, json: bool, quiet: bool) -> Result<i32, String> {
    let tx = load_tx(tx)?;
    let store = load_store(state)?;
    if !quiet {
        if json {
            let doc = tx.to_json(&store);
            println!("{}", serde_json::to_string_pretty(&doc).map_err(|e| e.to_string())?);
        } else {
            println!("{}", tx.summary(&store));
        }
    }
    Ok(0)
}

fn cmd_name(value: &str, quiet: bool) -> Result<i32, String> {
    let converted = match value.parse::<u64>() {
        Ok(raw) => Name(raw).to_string(),
        Err(_) => Name::new(value).map_err(|e| e.to_string())?.value().to_string(),
    };
    if !quiet {
        println!("{}", converted);
    }
    Ok(0)
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    if let Err(e) = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .try_init()
    {
        eprintln!("{} cannot install logger: {}", "warning:".yellow(), e);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let quiet = cli.quiet;

    let result = match cli.command {
        Commands::Check { inputs, json } => cmd_check(inputs, json, quiet),
        Commands::Execute { inputs, script } => cmd_execute(inputs, script, quiet),
        Commands::Show { tx, state, json } => cmd_show(&tx, &state, json, quiet),
        Commands::Hash { tx } => load_tx(&tx).map(|tx| {
            if !quiet {
                println!("{}", tx.id());
            }
            0
        }),
        Commands::Name { value } => cmd_name(&value, quiet),
        Commands::Version => {
            println!("wasmtx {} (wasmtx-core {})", env!("CARGO_PKG_VERSION"), wasmtx_core::VERSION);
            Ok(0)
        }
    };

    let exit_code = result.unwrap_or_else(|message| {
        eprintln!("{} {}", "error:".red().bold(), message);
        2
    });
    process::exit(exit_code);
}
