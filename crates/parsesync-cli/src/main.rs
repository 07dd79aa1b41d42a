use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use parsesync_catalog::ParseAdapter;
use parsesync_core::{load_local_schema, Config, Namespace, SchemaSet};
use parsesync_engine::{
    export, fetch_portable, ExportLayout, Reconciler, SchemaOperation, SchemaPlan, SyncError,
};

const DEFAULT_CONFIG: &str = "parsesync.toml";

/// parsesync - keep a Parse Server schema in sync with local files
#[derive(Parser)]
#[command(name = "parsesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: parsesync.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PrefixArg {
    /// Namespace prefix for class names (overrides config)
    #[arg(short, long)]
    prefix: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, update and delete remote classes to match the local schema
    Up {
        /// Local schema file or directory
        #[arg(default_value = "schema.json")]
        path: PathBuf,

        #[command(flatten)]
        prefix: PrefixArg,

        /// Keep remote classes that are not in the local schema
        #[arg(long)]
        no_delete_classes: bool,

        /// Keep remote fields that are not in the local schema
        #[arg(long)]
        no_delete_fields: bool,

        /// Print the planned requests without sending them
        #[arg(long)]
        dry_run: bool,

        /// Write a JSON run report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Delete the remote classes named in the local schema
    Del {
        /// Local schema file or directory
        #[arg(default_value = "schema.json")]
        path: PathBuf,

        #[command(flatten)]
        prefix: PrefixArg,

        /// Print the planned requests without sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Export the remote schema to local files
    Down {
        /// Output file, or directory with --split (default: schema.json / schema/)
        path: Option<PathBuf>,

        #[command(flatten)]
        prefix: PrefixArg,

        /// Write one file per class
        #[arg(long)]
        split: bool,
    },

    /// Generate TypeScript definitions from the remote schema
    Typescript {
        /// Output file (default from config: parse-types.ts)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        prefix: PrefixArg,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let mut config = load_config(cli.config.as_deref(), cli.verbose)?;
    config.apply_env();

    match cli.command {
        Commands::Up {
            path,
            prefix,
            no_delete_classes,
            no_delete_fields,
            dry_run,
            report,
        } => {
            apply_prefix(&mut config, prefix);
            if no_delete_classes {
                config.sync.delete_classes = false;
            }
            if no_delete_fields {
                config.sync.delete_fields = false;
            }
            up_command(&config, &path, dry_run, report.as_deref(), cli.verbose).await
        }
        Commands::Del {
            path,
            prefix,
            dry_run,
        } => {
            apply_prefix(&mut config, prefix);
            del_command(&config, &path, dry_run, cli.verbose).await
        }
        Commands::Down {
            path,
            prefix,
            split,
        } => {
            apply_prefix(&mut config, prefix);
            down_command(&config, path, split, cli.verbose).await
        }
        Commands::Typescript { output, prefix } => {
            apply_prefix(&mut config, prefix);
            let output = output.unwrap_or_else(|| config.codegen.output.clone());
            typescript_command(&config, &output, cli.verbose).await
        }
    }
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    if let Some(config_path) = path {
        tracing::debug!(path = %config_path.display(), "loading config");
        return Ok(Config::from_file(config_path)?);
    }

    let default_path = Path::new(DEFAULT_CONFIG);
    if default_path.exists() {
        tracing::debug!(path = DEFAULT_CONFIG, "loading config");
        Ok(Config::from_file(default_path)?)
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults and environment".yellow());
        }
        Ok(Config::default())
    }
}

fn apply_prefix(config: &mut Config, arg: PrefixArg) {
    if let Some(prefix) = arg.prefix {
        config.sync.prefix = Some(prefix);
    }
}

fn connect(config: &Config, verbose: bool) -> Result<ParseAdapter> {
    let connection = config
        .connection
        .resolve()
        .map_err(SyncError::from)
        .context("Connection settings are incomplete. Set them in parsesync.toml or via PARSE_SERVER_URL, PARSE_SERVER_APPLICATION_ID and PARSE_SERVER_MASTER_KEY")?;

    if verbose {
        eprintln!("{} {}", "Connecting to".cyan(), connection.server_url);
    }

    Ok(ParseAdapter::new(&connection)?)
}

fn load_local(path: &Path, verbose: bool) -> Result<SchemaSet> {
    if verbose {
        eprintln!("{} {}", "Loading local schema from:".cyan(), path.display());
    }
    Ok(load_local_schema(path).map_err(SyncError::from)?)
}

/// Up command - converge the remote schema to the local one
async fn up_command(
    config: &Config,
    path: &Path,
    dry_run: bool,
    report_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let adapter = connect(config, verbose)?;
    let local = load_local(path, verbose)?;

    let reconciler = Reconciler::new(&adapter, config.sync.clone());
    let plan = reconciler.plan_converge(&local).await?;
    let outcome = if dry_run {
        Ok(())
    } else {
        reconciler.apply(&plan).await
    };

    // A failed run still gets a report of the requests that were applied.
    if let Some(report_path) = report_path {
        let report = match &outcome {
            Ok(()) => plan.to_report("up", dry_run),
            Err(err) => plan.to_failed_report("up", err),
        };
        report.save_to_file(report_path)?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), report_path.display());
        }
    }

    outcome?;
    print_plan_summary("Schema Sync Report", &plan, dry_run);
    Ok(())
}

/// Del command - delete remote classes named by the local schema
async fn del_command(config: &Config, path: &Path, dry_run: bool, verbose: bool) -> Result<()> {
    let adapter = connect(config, verbose)?;
    let local = load_local(path, verbose)?;

    let reconciler = Reconciler::new(&adapter, config.sync.clone());
    let plan = if dry_run {
        reconciler.plan_prune(&local).await?
    } else {
        reconciler.prune(&local).await?
    };

    print_plan_summary("Schema Delete Report", &plan, dry_run);
    Ok(())
}

/// Down command - export the remote schema
async fn down_command(config: &Config, path: Option<PathBuf>, split: bool, verbose: bool) -> Result<()> {
    let adapter = connect(config, verbose)?;
    let namespace = Namespace::new(config.sync.prefix.clone());

    let layout = if split {
        ExportLayout::PerClass(path.unwrap_or_else(|| PathBuf::from("schema")))
    } else {
        ExportLayout::Combined(path.unwrap_or_else(|| PathBuf::from("schema.json")))
    };

    let written = export(&adapter, &namespace, &layout).await?;

    println!("{} {} file(s)", "✓ Exported schema to".green(), written.len());
    for file in &written {
        println!("  {}", file.display());
    }
    Ok(())
}

/// Typescript command - generate type definitions from the remote schema
async fn typescript_command(config: &Config, output: &Path, verbose: bool) -> Result<()> {
    let adapter = connect(config, verbose)?;
    let namespace = Namespace::new(config.sync.prefix.clone());

    let set = fetch_portable(&adapter, &namespace).await?;
    let definitions = parsesync_codegen::generate_typescript(&set)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, definitions)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} {} classes to {}",
        "✓ Generated definitions for".green(),
        set.len(),
        output.display()
    );
    Ok(())
}

/// Print a plan (or the applied result) to stdout
fn print_plan_summary(title: &str, plan: &SchemaPlan, dry_run: bool) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", title.bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    if dry_run {
        println!("{}", "Dry run: no requests were sent".yellow());
        println!();
    }

    if plan.operations.is_empty() {
        println!("{}", "✓ Remote schema already up to date".green().bold());
    } else {
        println!("{}", "Requests:".bold());
        for operation in &plan.operations {
            let label = match operation {
                SchemaOperation::CreateClass(_) => "CREATE".green().bold(),
                SchemaOperation::UpdateClass(_) => "UPDATE".cyan().bold(),
                SchemaOperation::DeleteClass(_) => "DELETE".red().bold(),
            };
            println!("  [{}] {}", label, operation.class_name());

            if let SchemaOperation::UpdateClass(update) = operation {
                for name in update.deleted_fields() {
                    println!("      - {}", name);
                }
                for (name, field) in update.put_fields() {
                    println!("      + {}: {}", name, field.field_type);
                }
                if update.class_level_permissions.is_some() {
                    println!("      ~ classLevelPermissions");
                }
            }
        }
    }

    if !plan.diagnostics.is_empty() {
        println!();
        println!("{}", "Skipped:".bold());
        for diag in &plan.diagnostics {
            println!("  [{}] {}: {}", "WARN".yellow().bold(), diag.code, diag.message);
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsesync_engine::ErrorKind;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_up_flags() {
        let cli = Cli::parse_from([
            "parsesync",
            "up",
            "schema/",
            "--prefix",
            "app_",
            "--no-delete-fields",
            "--dry-run",
        ]);
        match cli.command {
            Commands::Up {
                path,
                prefix,
                no_delete_fields,
                no_delete_classes,
                dry_run,
                ..
            } => {
                assert_eq!(path, PathBuf::from("schema/"));
                assert_eq!(prefix.prefix.as_deref(), Some("app_"));
                assert!(no_delete_fields);
                assert!(!no_delete_classes);
                assert!(dry_run);
            }
            _ => panic!("expected up"),
        }
    }

    #[test]
    fn missing_connection_settings_are_config_invalid() {
        let Err(err) = connect(&Config::default(), false) else {
            panic!("expected connect to fail without settings");
        };
        let sync = err.downcast_ref::<SyncError>().expect("a SyncError");
        assert_eq!(sync.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn missing_local_schema_is_local_schema_invalid() {
        let err = load_local(Path::new("/definitely/not/here.json"), false).unwrap_err();
        let sync = err.downcast_ref::<SyncError>().expect("a SyncError");
        assert_eq!(sync.kind(), ErrorKind::LocalSchemaInvalid);
    }
}
