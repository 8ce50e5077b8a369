//! Application orchestrator.
//! Loads/merges config, initializes logging, installs signal handlers, validates the
//! tier roots, resolves the addressed item and runs the requested command.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use dual_tier::cli::{Args, Command};
use dual_tier::config::{load_config, load_config_from_xml_path, CONFIG_ENV};
use dual_tier::output as out;
use dual_tier::{default_config_path, shutdown, Config, DualDirectory, DualFile, DualTierError};

use crate::logging::init_tracing;

/// What a relative path resolved to across the two roots.
enum Item {
    File(DualFile),
    Dir(DualDirectory),
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handle print-config before logging init
    if args.command == Command::PrintConfig {
        print_config_location(&args);
        return Ok(());
    }

    let mut cfg = match args.config.as_deref() {
        Some(path) => load_config_from_xml_path(path)?,
        None => load_config()?.unwrap_or_default(),
    };
    args.apply_overrides(&mut cfg);

    // Initialize logging and capture the guard so we can drop it on signal
    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {}", e));
        e
    })?;

    // Guard needs to be dropped on SIGINT to flush logs
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Received interrupt; stopping after the current item...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        })
        .context("install interrupt handler")?;
    }

    debug!("Starting dual_tier: {:?}", args);

    let result = (|| -> Result<()> {
        cfg.validate()?;
        execute(&cfg, &args.command)
    })();

    if let Err(e) = &result {
        if let Some(dt) = e.downcast_ref::<DualTierError>() {
            let code = dt.code();
            let kind = dt.kind();
            match dt {
                DualTierError::NotFound { primary, secondary } => {
                    error!(code, kind, primary = %primary.display(), secondary = %secondary.display(), "Command failed")
                }
                DualTierError::Io { op, path, .. } => {
                    error!(code, kind, op = *op, path = %path.display(), error = %dt, "Command failed")
                }
                DualTierError::Interrupted => error!(code, kind, "Command aborted by user"),
                _ => error!(code, kind, error = %dt, "Command failed"),
            }
        } else {
            error!(error = %e, "Command failed");
        }
    }

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    result
}

/// Exit status for a failed run: the library's code when one is available.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<DualTierError>().map_or(1, DualTierError::code)
}

fn print_config_location(args: &Args) {
    if let Some(p) = &args.config {
        out::print_info(&format!("Using --config (explicit):\n  {}\n", p.display()));
        return;
    }
    if let Ok(cfg_env) = std::env::var(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {}\n", cfg_env));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or pass --config."));
        return;
    }
    match default_config_path() {
        Some(p) => {
            out::print_info(&format!("Default dual_tier config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info("No config file exists there; built-in defaults apply. Example:\n\n<config>\n  <primary_root>/mnt/fast/library</primary_root>\n  <secondary_root>/mnt/archive/library</secondary_root>\n  <log_level>normal</log_level>\n  <io_priority>idle</io_priority>\n</config>\n");
            }
        }
        None => out::print_error("Could not determine a default config path"),
    }
}

/// Directories win when either tier holds one; otherwise the path is a file.
/// A path that exists nowhere resolves to a file handle so `put` can create it.
fn resolve_item(cfg: &Config, rel: &Path) -> Result<Item> {
    let (primary, secondary) = cfg.locate(rel)?;
    if primary.is_dir() || secondary.is_dir() {
        let dir = DualDirectory::with_priority(primary, secondary, cfg.io_priority)?;
        return Ok(Item::Dir(dir));
    }
    Ok(Item::File(DualFile::with_priority(primary, secondary, cfg.io_priority)?))
}

fn execute(cfg: &Config, command: &Command) -> Result<()> {
    match command {
        Command::Status { path } => status(resolve_item(cfg, path)?),
        Command::Promote { path } => {
            match resolve_item(cfg, path)? {
                Item::File(f) => f.move_to_primary()?,
                Item::Dir(d) => d.move_to_primary()?,
            }
            info!(path = %path.display(), "Promoted to primary");
            out::print_success(&format!("'{}' is now in the primary tier", path.display()));
            Ok(())
        }
        Command::Demote { path } => {
            match resolve_item(cfg, path)? {
                Item::File(f) => f.move_to_secondary()?,
                Item::Dir(d) => d.move_to_secondary()?,
            }
            info!(path = %path.display(), "Demoted to secondary");
            out::print_success(&format!("'{}' is now in the secondary tier", path.display()));
            Ok(())
        }
        Command::Ls { path, recursive } => {
            let Item::Dir(dir) = resolve_item(cfg, path)? else {
                bail!(DualTierError::InvalidArgument(format!(
                    "'{}' is not a directory in either tier",
                    path.display()
                )));
            };
            let files = if *recursive { dir.all_files() } else { dir.files() };
            for f in files {
                let rel = f.primary_path().strip_prefix(dir.primary_path()).unwrap_or(f.primary_path());
                let tier = if f.is_in_primary() { "P" } else { "S" };
                out::print_user(&format!("{tier} {:>10} {}", f.human_size().to_string(), rel.display()));
            }
            Ok(())
        }
        Command::Cat { path } => {
            let Item::File(file) = resolve_item(cfg, path)? else {
                bail!(DualTierError::InvalidArgument(format!("'{}' is a directory", path.display())));
            };
            let text = file.read_text()?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes()).context("write to stdout")?;
            stdout.flush().context("flush stdout")?;
            Ok(())
        }
        Command::Put { path, text } => {
            let Item::File(file) = resolve_item(cfg, path)? else {
                bail!(DualTierError::InvalidArgument(format!("'{}' is a directory", path.display())));
            };
            file.write_text(text)?;
            let landed = file.current_path()?;
            info!(path = %landed.display(), bytes = text.len(), "Content written");
            out::print_success(&format!("wrote {} bytes to '{}'", text.len(), landed.display()));
            Ok(())
        }
        Command::Rm { path } => {
            match resolve_item(cfg, path)? {
                Item::File(f) => f.delete()?,
                Item::Dir(d) => d.delete()?,
            }
            out::print_success(&format!("removed '{}'", path.display()));
            Ok(())
        }
        Command::PrintConfig => Ok(()),
    }
}

fn status(item: Item) -> Result<()> {
    match item {
        Item::File(f) => {
            if !f.exists() {
                return Err(DualTierError::NotFound {
                    primary: f.primary_path().to_path_buf(),
                    secondary: f.secondary_path().to_path_buf(),
                }
                .into());
            }
            out::print_field("kind", "file");
            out::print_field("exists", "true");
            out::print_field("primary", &f.primary_path().display().to_string());
            out::print_field("secondary", &f.secondary_path().display().to_string());
            out::print_field("in primary", &f.is_in_primary().to_string());
            out::print_field("only in secondary", &f.is_only_in_secondary().to_string());
            out::print_field("current path", &f.current_path()?.display().to_string());
            out::print_field("size", &f.human_size().to_string());
        }
        Item::Dir(d) => {
            out::print_field("kind", "directory");
            out::print_field("exists", &d.exists().to_string());
            out::print_field("primary", &d.primary_path().display().to_string());
            out::print_field("secondary", &d.secondary_path().display().to_string());
            out::print_field("in primary", &d.is_in_primary().to_string());
            out::print_field("only in secondary", &d.is_only_in_secondary().to_string());
            out::print_field("files", &d.all_files().len().to_string());
            out::print_field("size", &d.human_size().to_string());
        }
    }
    Ok(())
}
