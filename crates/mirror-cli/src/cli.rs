//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use mirror_core::settings::env_keys;
use mirror_core::{BackendKind, SettingsLayer, Tier};

/// Package Mirror - Keep a local package directory in sync with remote storage
#[derive(Parser, Debug)]
#[command(name = "pkg-mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Settings overrides; each flag falls back to its environment variable.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsArgs {
    /// Settings file (.toml, .json, .yaml); lowest precedence after defaults
    #[arg(short, long, global = true, env = "PKG_MIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Deployment tier; `dev` selects a local directory mirror
    #[arg(long, global = true, env = env_keys::TIER)]
    pub tier: Option<String>,

    /// Remote backend (local, object-store)
    #[arg(long, global = true, env = env_keys::BACKEND)]
    pub backend: Option<BackendKind>,

    /// Local package directory
    #[arg(long, global = true, env = env_keys::LOCAL_ROOT)]
    pub local_root: Option<String>,

    /// Remote root: a directory, or a key prefix for the object-store backend
    #[arg(long, global = true, env = env_keys::REMOTE_ROOT)]
    pub remote_root: Option<String>,

    /// Bucket for the object-store backend; a directory holding the objects
    #[arg(long, global = true, env = env_keys::BUCKET)]
    pub bucket: Option<String>,
}

impl SettingsArgs {
    /// Flags and environment merged into a single settings layer.
    pub fn to_layer(&self) -> SettingsLayer {
        SettingsLayer {
            tier: self.tier.clone().map(Tier::new),
            backend: self.backend,
            local_root: self.local_root.clone(),
            remote_root: self.remote_root.clone(),
            bucket: self.bucket.clone(),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show the resolved mirror configuration
    Describe {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Copy every remote package into the local directory
    Pull,

    /// Run a command as one unit of work
    ///
    /// Pulls the remote state and snapshots the local directory, runs the
    /// command, then pushes additions and deletes removals. The child sees
    /// the local directory as PKG_MIRROR_LOCAL_ROOT and its exit status is
    /// passed through.
    ///
    /// Examples:
    ///   pkg-mirror run -- pip download requests -d ./packages
    ///   pkg-mirror run -- sh -c 'rm ./packages/old-*.whl'
    Run {
        /// Command and arguments to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   pkg-mirror completions bash > ~/.local/share/bash-completion/completions/pkg-mirror
    ///   pkg-mirror completions zsh > ~/.zfunc/_pkg-mirror
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
