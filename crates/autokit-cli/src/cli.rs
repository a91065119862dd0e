//! CLI argument parsing using clap derive

use std::path::PathBuf;

use autokit_core::executor::DEFAULT_PROGRESS_EVERY;
use clap::{Args, Parser, Subcommand};

/// autokit - Move, encrypt and watch files using named profiles
#[derive(Parser, Debug)]
#[command(name = "autokit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (.toml, .json or .yaml)
    #[arg(long, global = true, env = "AUTOKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log batch progress every N files
    #[arg(long, global = true, default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: usize,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Transfer files over SFTP
    Sftp {
        #[command(subcommand)]
        action: TransferAction,
    },

    /// Transfer files over FTP (TLS unless the profile disables it)
    Ftp {
        #[command(subcommand)]
        action: TransferAction,
    },

    /// Encrypt or decrypt files with OpenPGP
    Pgp {
        #[command(subcommand)]
        action: CipherAction,
    },

    /// List files modified since the last review of a directory
    ///
    /// Examples:
    ///   autokit monitor /data/drop
    ///   autokit monitor /data/drop --since "2024-01-31 08:00:00"
    Monitor {
        /// Directory to review
        path: PathBuf,

        /// Review against a fixed local time instead of the stored one
        #[arg(long, value_name = "YYYY-mm-dd HH:MM:SS")]
        since: Option<String>,

        /// Write MODIFIED audit lines
        #[arg(long)]
        log: bool,
    },

    /// Inspect stored profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Profile name in the secret store
    #[arg(short, long)]
    pub profile: String,

    /// Use a locally mounted share as the remote side
    #[arg(long, value_name = "DIR")]
    pub mount: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    /// File name or wildcard to process (repeatable); default is every file
    #[arg(short = 'f', long = "file", value_name = "PATTERN")]
    pub files: Vec<String>,

    /// Pattern to skip (repeatable); replaces the profile's suppression list
    #[arg(short = 's', long = "suppress", value_name = "PATTERN")]
    pub suppress: Vec<String>,

    /// Ignore the profile's suppression list
    #[arg(long, conflicts_with = "suppress")]
    pub no_suppress: bool,

    /// Write audit lines for processed files
    #[arg(long)]
    pub log: bool,
}

impl Selectors {
    /// `None` keeps the profile default.
    pub fn suppress_override(&self) -> Option<Vec<String>> {
        if self.no_suppress {
            Some(Vec::new())
        } else if self.suppress.is_empty() {
            None
        } else {
            Some(self.suppress.clone())
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TransferAction {
    /// List a remote directory
    List {
        #[command(flatten)]
        target: Target,

        /// Remote directory (default: the profile's inbound directory)
        #[arg(long)]
        remote_dir: Option<String>,
    },

    /// Fetch remote files into a local directory
    Download {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        selectors: Selectors,

        #[arg(long)]
        remote_dir: Option<String>,

        #[arg(long)]
        local_dir: Option<PathBuf>,

        /// Leave downloaded files on the server
        #[arg(long)]
        keep_remote: bool,
    },

    /// Send local files to the remote directory
    Upload {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        selectors: Selectors,

        #[arg(long)]
        remote_dir: Option<String>,

        #[arg(long)]
        local_dir: Option<PathBuf>,

        /// Leave uploaded files out of the local archive directory
        #[arg(long)]
        no_archive: bool,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CipherArgs {
    /// Profile name in the secret store
    #[arg(short, long)]
    pub profile: String,

    /// Working directory (default: the profile's directory)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    #[command(flatten)]
    pub selectors: Selectors,

    /// Leave source files out of the archive directory
    #[arg(long)]
    pub no_archive: bool,

    /// gpg executable
    #[arg(long, env = "AUTOKIT_GPG", default_value = "gpg")]
    pub gpg: PathBuf,

    /// ASCII-armor encrypted output
    #[arg(long)]
    pub armor: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CipherAction {
    /// Encrypt plaintext files
    Encrypt(CipherArgs),
    /// Decrypt encrypted files
    Decrypt(CipherArgs),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ProfileAction {
    /// Show a resolved profile with secrets redacted
    Show {
        /// Profile kind: sftp, ftp or pgp
        kind: String,

        /// Profile name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_download_with_selectors() {
        let cli = Cli::try_parse_from([
            "autokit", "sftp", "download", "-p", "Vendor", "-f", "*.csv", "-f", "a.txt", "-s",
            "*.tmp", "--keep-remote",
        ])
        .unwrap();

        let Commands::Sftp {
            action:
                TransferAction::Download {
                    target,
                    selectors,
                    keep_remote,
                    ..
                },
        } = cli.command
        else {
            panic!("expected sftp download");
        };
        assert_eq!(target.profile, "Vendor");
        assert_eq!(selectors.files, vec!["*.csv", "a.txt"]);
        assert_eq!(selectors.suppress_override(), Some(vec!["*.tmp".to_string()]));
        assert!(keep_remote);
    }

    #[test]
    fn no_suppress_clears_profile_list() {
        let cli = Cli::try_parse_from([
            "autokit", "pgp", "encrypt", "-p", "Partner", "--no-suppress",
        ])
        .unwrap();
        let Commands::Pgp {
            action: CipherAction::Encrypt(args),
        } = cli.command
        else {
            panic!("expected pgp encrypt");
        };
        assert_eq!(args.selectors.suppress_override(), Some(Vec::new()));
    }

    #[test]
    fn suppress_and_no_suppress_conflict() {
        let result = Cli::try_parse_from([
            "autokit", "pgp", "encrypt", "-p", "Partner", "-s", "*.tmp", "--no-suppress",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "autokit", "monitor", "/tmp", "--verbose", "--progress-every", "5",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.progress_every, 5);
    }
}
