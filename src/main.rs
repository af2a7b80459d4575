use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use mountfs::{ChangeWatcher, ConfirmDialog, FileSystem, FsError, NativeFs};

#[derive(Parser)]
#[command(name = "mountfs")]
#[command(about = "Inspect and edit files through the mountfs contract")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a directory
    Ls { path: String },
    /// Print a file
    Cat { path: String },
    /// Write content to a file
    Write { path: String, content: String },
    /// Create a directory, parents included
    Mkdir { path: String },
    /// Remove a file or directory tree
    Rm {
        path: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Copy a single file
    Cp { src: String, dst: String },
    /// Watch a directory and print listings on change (Ctrl-C to stop)
    Watch {
        path: String,
        /// Polling interval in milliseconds
        #[arg(long = "interval-ms", default_value_t = 500)]
        interval_ms: u64,
    },
}

/// Terminal prompt standing in for the editor's confirmation dialog.
struct StdinConfirm;

#[async_trait::async_trait]
impl ConfirmDialog for StdinConfirm {
    async fn confirm(&self, message: &str, title: &str) -> bool {
        use std::io::Write;
        print!("{}: {} [y/N] ", title, message);
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim(), "y" | "Y" | "yes")
    }
}

fn print_entries(entries: &[mountfs::DirEntry]) {
    for entry in entries {
        let suffix = if entry.is_directory { "/" } else { "" };
        println!("{}{}", entry.name, suffix);
    }
}

async fn run(fs: Arc<dyn FileSystem>, command: Command) -> Result<(), FsError> {
    match command {
        Command::Ls { path } => {
            print_entries(&fs.read_dir(&path).await?);
        }
        Command::Cat { path } => {
            print!("{}", fs.read_file(&path).await?);
        }
        Command::Write { path, content } => {
            fs.write_file(&path, content.as_bytes()).await?;
        }
        Command::Mkdir { path } => {
            fs.create_directory(&path).await?;
        }
        Command::Rm { path, yes } => {
            if !yes {
                let confirmed = StdinConfirm
                    .confirm(&format!("remove '{}'", path), "mountfs")
                    .await;
                if !confirmed {
                    return Ok(());
                }
            }
            fs.remove(&path).await?;
        }
        Command::Cp { src, dst } => {
            fs.copy_file(&src, &dst).await?;
        }
        Command::Watch { path, interval_ms } => {
            let handle = ChangeWatcher::start(
                fs.clone(),
                &path,
                Duration::from_millis(interval_ms),
                Box::new(|entries| {
                    println!("-- changed ({} entries)", entries.len());
                    print_entries(&entries);
                }),
            );
            let _ = tokio::signal::ctrl_c().await;
            handle.cancel();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let fs: Arc<dyn FileSystem> = Arc::new(NativeFs::new());

    if let Err(err) = run(fs, cli.command).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
