use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use native_keychain::{
    CredentialId, ErrorKind, GetParams, GetResult, NativeKeychain, PlatformError, UpdateParams,
    UpdateResult,
};
use tracing_subscriber::EnvFilter;

mod config;
mod source;

use config::CliConfig;
use source::ValueSource;

const EXIT_NOT_FOUND: u8 = 1;
const EXIT_SYSTEM: u8 = 2;
const EXIT_PLATFORM: u8 = 3;
const EXIT_ERROR: u8 = 4;

const MASK: &str = "********";

/// native-keychain - generic-password items in the OS keychain
#[derive(Parser, Debug)]
#[command(name = "native-keychain")]
#[command(about = "Set, read and remove generic-password items in the OS keychain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.config/native-keychain/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update an item
    Set {
        /// Item key (keychain account)
        #[arg(value_parser = parse_key)]
        key: String,

        /// Secret value: literal, env://VAR, file:///path or base64://DATA
        value: String,

        /// Service namespace (defaults to the configured default_service)
        #[arg(short, long)]
        service: Option<String>,

        /// Store VALUE as given, without interpreting env://, file:// or base64://
        #[arg(long)]
        raw: bool,
    },

    /// Read an item
    Get {
        /// Item key (keychain account)
        #[arg(value_parser = parse_key)]
        key: String,

        /// Service namespace (defaults to the configured default_service)
        #[arg(short, long)]
        service: Option<String>,

        /// Print the secret instead of masking it
        #[arg(long)]
        reveal: bool,
    },

    /// Remove an item
    Remove {
        /// Item key (keychain account)
        #[arg(value_parser = parse_key)]
        key: String,

        /// Service namespace (defaults to the configured default_service)
        #[arg(short, long)]
        service: Option<String>,
    },

    /// Check that a keychain backend is available on this host
    Check,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn parse_key(s: &str) -> Result<String, String> {
    if s.is_empty() {
        Err("key must not be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            // Unsupported platform gets a full diagnostic
            if let Some(platform_err) = e.chain().find_map(|c| c.downcast_ref::<PlatformError>())
            {
                let report = miette::Report::new(platform_diagnostic(platform_err));
                eprintln!("{:?}", report);
                return ExitCode::from(EXIT_PLATFORM);
            }

            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    if let Commands::Init { force } = cli.command {
        init_logging(&CliConfig::default());
        return run_init(cli.config, force);
    }

    let config = CliConfig::load_or_default(cli.config.as_deref())?;
    init_logging(&config);

    let keychain = NativeKeychain::with_namespace(config.backend_namespace.clone());

    match cli.command {
        Commands::Set {
            key,
            value,
            service,
            raw,
        } => {
            let source = if raw {
                ValueSource::Literal(value)
            } else {
                value.parse()?
            };
            tracing::debug!(source = source.kind(), "Reading secret value");
            let secret = source.read().context("Failed to read secret value")?;

            let id = identity(key, config.service_for(service));
            let result = keychain.set_or_remove(&UpdateParams::upsert(id.clone(), secret))?;
            print_update(&id, &result, cli.json)?;
            Ok(exit_code(result.error_kind()))
        }

        Commands::Get {
            key,
            service,
            reveal,
        } => {
            let id = identity(key, config.service_for(service));
            let result = keychain.get(&GetParams::new(id.clone()))?;
            print_get(&id, &result, reveal, cli.json)?;
            Ok(exit_code(result.error_kind()))
        }

        Commands::Remove { key, service } => {
            let id = identity(key, config.service_for(service));
            let result = keychain.set_or_remove(&UpdateParams::remove(id.clone()))?;
            print_update(&id, &result, cli.json)?;
            Ok(exit_code(result.error_kind()))
        }

        Commands::Check => {
            keychain.selector().resolve()?;
            let os = std::env::consts::OS;
            let arch = std::env::consts::ARCH;
            if cli.json {
                let report = serde_json::json!({ "ready": true, "os": os, "arch": arch });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Keychain backend ready ({}/{})", os, arch);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Init { force } => run_init(cli.config, force),
    }
}

fn run_init(path: Option<PathBuf>, force: bool) -> Result<ExitCode> {
    let path = path.unwrap_or_else(CliConfig::default_path);

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    CliConfig::default().save(&path)?;
    println!("Wrote {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn init_logging(config: &CliConfig) {
    let default_filter = config
        .log_level
        .as_deref()
        .unwrap_or("native_keychain=warn");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn identity(key: String, service: Option<String>) -> CredentialId {
    match service {
        Some(service) => CredentialId::new(key).with_service(service),
        None => CredentialId::new(key),
    }
}

fn exit_status(error_kind: Option<ErrorKind>) -> u8 {
    match error_kind {
        None => 0,
        Some(ErrorKind::NotFound) => EXIT_NOT_FOUND,
        Some(ErrorKind::System) => EXIT_SYSTEM,
    }
}

fn exit_code(error_kind: Option<ErrorKind>) -> ExitCode {
    ExitCode::from(exit_status(error_kind))
}

fn label(id: &CredentialId) -> String {
    match id.service() {
        Some(service) => format!("'{}' (service '{}')", id.key(), service),
        None => format!("'{}'", id.key()),
    }
}

fn describe_update(id: &CredentialId, result: &UpdateResult) -> String {
    let action = result.action_performed().as_str();
    match (result.error_kind(), result.error()) {
        (None, _) => format!("{} {}", capitalize(action), label(id)),
        (Some(ErrorKind::NotFound), _) => format!("Not {}: {} not found", action, label(id)),
        (Some(ErrorKind::System), Some(fault)) => {
            format!("Not {}: {}: system error: {}", action, label(id), fault)
        }
        (Some(ErrorKind::System), None) => format!("Not {}: {}: system error", action, label(id)),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn print_update(id: &CredentialId, result: &UpdateResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if result.is_success() {
        println!("{}", describe_update(id, result));
    } else {
        eprintln!("{}", describe_update(id, result));
    }
    Ok(())
}

/// JSON form of a get result; the value is masked unless `reveal`
fn render_get(result: &GetResult, reveal: bool) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(result)?;
    if !reveal {
        if let Some(secret) = value.get_mut("value") {
            *secret = serde_json::Value::String(MASK.to_string());
        }
    }
    Ok(value)
}

fn print_get(id: &CredentialId, result: &GetResult, reveal: bool, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&render_get(result, reveal)?)?
        );
        return Ok(());
    }

    match (result.value(), result.error()) {
        (Some(secret), _) if reveal => println!("{}", secret),
        (Some(_), _) => println!("Found {} (use --reveal to print it)", label(id)),
        (None, Some(fault)) => eprintln!("Failed to read {}: system error: {}", label(id), fault),
        (None, None) => eprintln!("{} not found", label(id)),
    }
    Ok(())
}

/// Diagnostic for a keychain backend that cannot be used on this host
#[derive(Debug, miette::Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(native_keychain::platform), severity(error))]
struct PlatformDiagnostic {
    message: String,
    #[help]
    help: String,
}

fn platform_diagnostic(err: &PlatformError) -> PlatformDiagnostic {
    let help = match err {
        PlatformError::UnsupportedOs { expected, .. } => {
            format!("The keychain backend is only available on {}.", expected)
        }
        PlatformError::UnsupportedArch { .. } => {
            "Supported architectures are arm64 (Apple silicon) and x86_64.".to_string()
        }
        PlatformError::BackendLoad { .. } => {
            "Check that the binary was built with the `keychain` feature.".to_string()
        }
    };

    PlatformDiagnostic {
        message: err.to_string(),
        help,
    }
}
