use clap::Parser;

use crate::io::is_http_url;

#[derive(Parser, Debug)]
#[command(name = "runxar")]
#[command(version)]
#[command(about = "A Rust XAR reader with HTTP URL support", long_about = None)]
#[command(after_help = "Extracted files hold the archived bytes as stored, \
  still in their declared encoding.\n\n\
Examples:\n  \
  runxar -l foo.xar                  list every entry path\n  \
  runxar -v foo.xar                  list with sizes, encodings and dates\n  \
  runxar -p foo.xar Payload | more   send archived bytes of Payload to more\n  \
  runxar -l https://example.com/a.pkg   list entries of a remote archive")]
pub struct Cli {
    /// XAR file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Entries to extract, by name, path or glob (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List entry paths
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Print the decoded header
    #[arg(long = "header")]
    pub header: bool,

    /// Extract archived bytes to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude entries that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        is_http_url(&self.file)
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.is_very_quiet() {
            "error"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}
