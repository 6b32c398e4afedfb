pub mod render;

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use render::render_tasks;
use tracing::level_filters::LevelFilter;

use crate::{
    app::{lifecycle::DEFAULT_NUDGE_THRESHOLD, start_app},
    storage::{
        kv_store::{FileStore, KeyValueStore},
        STORAGE_DIR,
    },
    tasks::TaskManager,
    utils::{
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, COMMAND_PREFIX, SESSION_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Divergify Sidekick", version, long_about = None)]
#[command(about = "For brains that zig when the world zags", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long = "log-filter", global = true, help = "Log level, overrides RUST_LOG")]
    log: Option<LevelFilter>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console", global = true)]
    log_console: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Open the task screen. This is the default")]
    Run {
        #[arg(
            long = "nudge-threshold-ms",
            default_value_t = DEFAULT_NUDGE_THRESHOLD.as_millis() as u64,
            help = "Coming back sooner than this after leaving shows a nudge"
        )]
        nudge_threshold_ms: u64,
    },
    #[command(flatten)]
    OneShot(OneShot),
}

/// Commands that load the stored state, change it once, and exit.
#[derive(Subcommand, Debug)]
enum OneShot {
    #[command(about = "Print stored tasks")]
    List {},
    #[command(about = "Add a task")]
    Add {
        #[arg(required = true, num_args = 1.., help = "Task text. Multiple words are joined with spaces")]
        text: Vec<String>,
    },
    #[command(about = "Remove a task by its number in `list`")]
    Remove {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        number: u64,
    },
    #[command(about = "Toggle Tin Foil Hat Mode. While it's on tasks aren't saved")]
    Privacy {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, ensure_dir)?;

    let command = args.commands.unwrap_or(Commands::Run {
        nudge_threshold_ms: DEFAULT_NUDGE_THRESHOLD.as_millis() as u64,
    });

    match command {
        Commands::Run { nudge_threshold_ms } => {
            enable_logging(
                SESSION_PREFIX,
                &app_dir.join("logs"),
                args.log,
                args.log_console,
            )?;
            start_app(&app_dir, Duration::from_millis(nudge_threshold_ms)).await
        }
        Commands::OneShot(command) => {
            enable_logging(
                COMMAND_PREFIX,
                &app_dir.join("logs"),
                args.log,
                args.log_console,
            )?;
            let mut manager = open_manager(&app_dir).await?;
            run_command(command, &mut manager, &mut io::stdout()).await
        }
    }
}

async fn open_manager(app_dir: &Path) -> Result<TaskManager<Arc<FileStore>>> {
    let store = Arc::new(FileStore::open(app_dir.join(STORAGE_DIR))?);
    Ok(TaskManager::load(store).await)
}

/// Runs one of the one-shot commands against an already hydrated manager.
async fn run_command<S: KeyValueStore>(
    command: OneShot,
    manager: &mut TaskManager<S>,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        OneShot::List {} => {}
        OneShot::Add { text } => {
            if !manager.add_task(&text.join(" ")).await {
                writeln!(out, "Nothing to add")?;
            }
        }
        OneShot::Remove { number } => {
            if manager.remove_task(number as usize - 1).await.is_none() {
                writeln!(out, "There is no task {number}")?;
            }
        }
        OneShot::Privacy {} => {
            let enabled = manager.toggle_privacy().await;
            writeln!(
                out,
                "Tin Foil Hat Mode: {}",
                if enabled { "ON" } else { "OFF" }
            )?;
        }
    }
    render_tasks(out, manager.tasks())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use clap::Parser;
    use tempfile::tempdir;

    use super::{open_manager, run_command, Args, Commands, OneShot};
    use crate::storage::{kv_store::KeyValueStore, PRIVACY_KEY, TASKS_KEY};

    #[test]
    fn test_args_default_to_screen() {
        let args = Args::parse_from(["sidekick"]);
        assert!(args.commands.is_none());

        let args = Args::parse_from(["sidekick", "run", "--nudge-threshold-ms", "5000"]);
        assert!(matches!(
            args.commands,
            Some(Commands::Run {
                nudge_threshold_ms: 5000
            })
        ));
    }

    #[test]
    fn test_remove_rejects_zero() {
        assert!(Args::try_parse_from(["sidekick", "remove", "0"]).is_err());
        assert!(Args::try_parse_from(["sidekick", "remove", "1"]).is_ok());
    }

    #[tokio::test]
    async fn test_one_shot_commands_share_storage() -> Result<()> {
        let dir = tempdir()?;

        let mut manager = open_manager(dir.path()).await?;
        let mut out = Vec::new();
        run_command(
            OneShot::Add {
                text: vec!["Buy".into(), "milk".into()],
            },
            &mut manager,
            &mut out,
        )
        .await?;
        run_command(
            OneShot::Add {
                text: vec!["Walk dog".into()],
            },
            &mut manager,
            &mut out,
        )
        .await?;

        let mut manager = open_manager(dir.path()).await?;
        let mut out = Vec::new();
        run_command(OneShot::Remove { number: 1 }, &mut manager, &mut out).await?;
        let printed = String::from_utf8(out)?;
        assert!(printed.contains("1. Walk dog"));
        assert!(!printed.contains("Buy milk"));

        let store = manager.store().clone();
        assert_eq!(
            store.get_item(TASKS_KEY).await?,
            Some(r#"["Walk dog"]"#.to_owned())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_privacy_command_reports_state() -> Result<()> {
        let dir = tempdir()?;
        let mut manager = open_manager(dir.path()).await?;

        let mut out = Vec::new();
        run_command(OneShot::Privacy {}, &mut manager, &mut out).await?;
        run_command(
            OneShot::Add {
                text: vec!["hidden".into()],
            },
            &mut manager,
            &mut out,
        )
        .await?;

        let printed = String::from_utf8(out)?;
        assert!(printed.contains("Tin Foil Hat Mode: ON"));

        let reloaded = open_manager(dir.path()).await?;
        assert!(reloaded.privacy_mode());
        assert!(reloaded.tasks().is_empty());
        assert_eq!(
            reloaded.store().get_item(PRIVACY_KEY).await?,
            Some("1".to_owned())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_out_of_range_remove_is_reported() -> Result<()> {
        let dir = tempdir()?;
        let mut manager = open_manager(dir.path()).await?;

        let mut out = Vec::new();
        run_command(OneShot::Remove { number: 3 }, &mut manager, &mut out).await?;

        assert!(String::from_utf8(out)?.contains("There is no task 3"));
        Ok(())
    }
}
