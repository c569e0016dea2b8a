// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use bastion_relay::types::FileKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bastion-relay")]
#[command(about = "Transfer files to hosts reachable only through an SSH bastion")]
#[command(version)]
pub struct Cli {
    /// Path to the config file (default: discovered in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new bastion-relay.yml configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Register targets and store their shared credentials
    AddServer {
        /// Target identifier (repeat for several targets)
        #[arg(long = "target-id", required = true)]
        target_ids: Vec<String>,

        /// Bastion host, one per target id
        #[arg(long = "bastion-host", required = true)]
        bastion_hosts: Vec<String>,

        /// Target host as seen from the bastion, one per target id
        #[arg(long = "target-host", required = true)]
        target_hosts: Vec<String>,

        #[arg(long)]
        bastion_user: String,

        #[arg(long)]
        target_user: String,

        /// File holding the bastion private key
        #[arg(long)]
        bastion_key: PathBuf,

        /// File holding the target private key
        #[arg(long)]
        target_key: PathBuf,
    },

    /// Download a remote file and keep a copy in the store
    Download {
        target: String,
        remote_path: String,
    },

    /// Stage a local file for a later upload
    Stage {
        target: String,
        filename: String,

        /// Local file to stage
        #[arg(long)]
        file: PathBuf,
    },

    /// Write a staged file to the target
    Upload {
        target: String,
        filename: String,
        remote_path: String,
    },

    /// List stored files for a target
    List {
        kind: FileKind,
        target: String,
    },

    /// Print a stored file to stdout
    Fetch {
        kind: FileKind,
        target: String,
        filename: String,
    },

    /// List registered targets
    Targets,
}
