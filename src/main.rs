//! Main entry point for the runxar CLI application.
//!
//! This binary lists XAR archives and extracts the archived bytes of their
//! entries, from both the local filesystem and remote HTTP URLs.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing_subscriber::EnvFilter;

use runxar::{Archive, Cli, Entry, HttpRangeReader, LocalFileReader, ReadAt};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to the appropriate handler
/// based on whether the input is a local file or HTTP URL.
fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.is_http_url() {
        let reader = HttpRangeReader::new(cli.file.clone())?;
        let archive = Archive::open(reader)
            .with_context(|| format!("Failed to open {}", cli.file))?;

        process_archive(&archive, &cli)?;

        // Display network transfer statistics for HTTP sources
        if !cli.is_quiet() {
            let transferred = archive.reader().transferred_bytes();
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else {
        let reader = LocalFileReader::new(Path::new(&cli.file))?;
        let archive = Archive::open(reader)
            .with_context(|| format!("Failed to open {}", cli.file))?;
        process_archive(&archive, &cli)?;
    }

    Ok(())
}

/// Process a XAR archive based on CLI options.
///
/// - Header mode (`--header`): print the decoded fixed header
/// - List mode (`-l` or `-v`): display archive contents
/// - Extract mode: write archived bytes of the selected entries
fn process_archive<R: ReadAt>(archive: &Archive<R>, cli: &Cli) -> Result<()> {
    if cli.header {
        print_header(archive);
        if !(cli.list || cli.verbose) {
            return Ok(());
        }
    }

    if cli.list || cli.verbose {
        list_entries(archive, cli.verbose);
        return Ok(());
    }

    let entries = archive.walk();
    let selected: Vec<_> = entries
        .iter()
        .filter(|(path, entry)| !entry.is_directory() && is_selected(cli, path, entry))
        .collect();

    let multiple = cli.pipe && selected.len() > 1;
    for (path, entry) in selected {
        extract_entry(archive, path, entry, cli, multiple)?;
    }

    Ok(())
}

/// Apply the positional filters and `-x` exclusions to one entry.
fn is_selected(cli: &Cli, path: &str, entry: &Entry) -> bool {
    if !cli.files.is_empty() {
        let matches = cli.files.iter().any(|f| {
            if has_glob_chars(f) {
                glob_match(f, path)
            } else {
                path == f || entry.name == *f
            }
        });
        if !matches {
            return false;
        }
    }

    !cli
        .exclude
        .iter()
        .any(|x| path.contains(x.as_str()) || glob_match(x, path))
}

fn print_header<R: ReadAt>(archive: &Archive<R>) {
    let header = archive.header();
    println!("header size:     {}", header.header_size);
    println!("version:         {}", header.version);
    println!("toc compressed:  {}", header.toc_compressed_length);
    println!("toc length:      {}", header.toc_length);
    println!("checksum:        {:?}", header.checksum_algorithm);
    if let Some(created) = archive.toc().creation_time {
        println!("created:         {}", created.to_rfc3339());
    }
}

/// List entries in the archive.
///
/// Simple format (`-l`) prints one path per line; verbose format (`-v`)
/// prints a table with size, archived length, modification time and
/// encoding.
fn list_entries<R: ReadAt>(archive: &Archive<R>, verbose: bool) {
    if verbose {
        println!(
            "{:>10}  {:>10}  {:>10}  {:>5}  {:<26}  Name",
            "Length", "Archived", "Date", "Time", "Encoding"
        );
        println!("{}", "-".repeat(80));
    }

    let mut total_size = 0u64;
    let mut total_archived = 0u64;
    let mut file_count = 0usize;

    for (path, entry) in archive.walk() {
        if !verbose {
            println!("{}", path);
            continue;
        }

        let (date, time) = entry
            .modification_time
            .map(|t| (t.format("%Y-%m-%d").to_string(), t.format("%H:%M").to_string()))
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));

        match &entry.payload {
            Some(payload) => {
                println!(
                    "{:>10}  {:>10}  {:>10}  {:>5}  {:<26}  {}",
                    payload.size, payload.length, date, time, payload.encoding_style, path
                );
                total_size += payload.size;
                total_archived += payload.length;
                file_count += 1;
            }
            None => {
                let label = if entry.is_directory() { "<dir>" } else { "" };
                println!(
                    "{:>10}  {:>10}  {:>10}  {:>5}  {:<26}  {}",
                    0, 0, date, time, label, path
                );
                if !entry.is_directory() {
                    file_count += 1;
                }
            }
        }
    }

    if verbose {
        println!("{}", "-".repeat(80));
        println!(
            "{:>10}  {:>10}  {:>46}  {} files",
            total_size, total_archived, "", file_count
        );
    }
}

/// Extract a single entry's archived bytes.
///
/// - Pipe mode (`-p`): write to stdout instead of a file
/// - Custom output directory (`-d`)
/// - Junk paths (`-j`): ignore the directory structure in the archive
/// - Overwrite control (`-n`, `-o`)
fn extract_entry<R: ReadAt>(
    archive: &Archive<R>,
    path: &str,
    entry: &Entry,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    if cli.pipe {
        let data = archive.read_archived_bytes(entry)?;
        let mut stdout = std::io::stdout().lock();
        if show_filename {
            writeln!(stdout, "--- {} ---", path)?;
        }
        stdout.write_all(&data)?;
        return Ok(());
    }

    let file_name = if cli.junk_paths {
        entry.name.as_str()
    } else {
        path
    };
    let Some(relative) = sanitize_entry_path(file_name) else {
        if !cli.is_quiet() {
            eprintln!("Skipping: {} (unsafe path)", path);
        }
        return Ok(());
    };
    let output_path = match &cli.extract_dir {
        Some(dir) => PathBuf::from(dir).join(relative),
        None => relative,
    };

    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (file exists)", path);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", path);
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", path);
    }

    let data = archive.read_archived_bytes(entry)?;
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&output_path, data)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    Ok(())
}

/// Turn an archive path into a relative output path.
///
/// Entry names come from the archive itself; any root, prefix or `..`
/// component would escape the extraction directory, so such names yield
/// `None`. `.` components are dropped.
fn sanitize_entry_path(name: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
///
/// ```ignore
/// assert!(glob_match("*.txt", "docs/readme.txt"));
/// assert!(glob_match("file?.dat", "file1.dat"));
/// assert!(!glob_match("*.txt", "readme.md"));
/// ```
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
