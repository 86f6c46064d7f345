use clap::{Parser, Subcommand};
use blobpack::archive::ArchiveCodec;
use blobpack::blob::FileBlob;
use blobpack::config::CodecOptions;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blobpack", about = "The .bpk multi-file container CLI")]
struct Cli {
    /// JSON file with codec options (separator, size limit)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack one or more files into a .bpk archive
    Pack {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
    /// Unpack a .bpk archive
    Unpack {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// List archive contents from the manifest
    List {
        input: PathBuf,
    },
    /// Exit with status 0 if the input looks like an archive, 1 otherwise
    Check {
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let codec = match &cli.config {
        Some(path) => ArchiveCodec::new(CodecOptions::from_file(path)?)?,
        None       => ArchiveCodec::default(),
    };

    match cli.command {

        // ── Pack ─────────────────────────────────────────────────────────────
        Commands::Pack { output, input } => {
            let blobs = input
                .iter()
                .map(FileBlob::open)
                .collect::<Result<Vec<_>, _>>()?;
            let packed = codec.pack_blocking(&blobs)?;
            std::fs::write(&output, &packed.bytes)?;
            for name in &packed.meta.file_names {
                println!("  packed  {name}");
            }
            println!("Created: {} ({} files, {} B payload, {} B archive)",
                output.display(), packed.meta.file_count,
                packed.meta.total_size, packed.bytes.len());
            println!("Suggested name: {}", packed.meta.suggested_filename);
        }

        // ── Unpack ───────────────────────────────────────────────────────────
        Commands::Unpack { input, output_dir } => {
            let bytes = std::fs::read(&input)?;
            let files = codec.unpack(&bytes)?;
            std::fs::create_dir_all(&output_dir)?;
            let mut taken = HashSet::new();
            for (i, file) in files.iter().enumerate() {
                let name = output_name(&file.name, i, &mut taken);
                let dest = output_dir.join(&name);
                std::fs::write(&dest, &file.bytes)?;
                println!("  unpacked  {}", dest.display());
            }
            println!("Unpacked {} file(s) to: {}", files.len(), output_dir.display());
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input } => {
            let bytes = std::fs::read(&input)?;
            let summary = codec.describe(&bytes)?;
            println!("Archive: {}  (version {}, created {})",
                input.display(), summary.format_version, format_millis(summary.created_at));
            println!("{:<32} {:>12} {:<28} Modified", "Name", "Size", "Type");
            for f in &summary.files {
                println!("{:<32} {:>12} {:<28} {}",
                    f.name, f.size, f.mime_type, format_millis(f.last_modified));
            }
            println!("{} file(s), {} B total", summary.file_count, summary.total_size);
        }

        // ── Check ────────────────────────────────────────────────────────────
        Commands::Check { input } => {
            let bytes = std::fs::read(&input)?;
            if codec.sniff(&bytes) {
                println!("{}: archive", input.display());
            } else {
                println!("{}: not an archive", input.display());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Reduce an archived name to a single path component that is unique within
/// this extraction. Archive names are untrusted.
fn output_name(name: &str, index: usize, taken: &mut HashSet<String>) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != "." && n != "..")
        .unwrap_or_else(|| format!("file_{index}"));
    let mut candidate = base.clone();
    let mut n = 0;
    while taken.contains(&candidate) {
        candidate = match n {
            0 => format!("{base}_{index}"),
            _ => format!("{base}_{index}_{n}"),
        };
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_strips_directories() {
        let mut taken = HashSet::new();
        assert_eq!(output_name("../../etc/passwd", 0, &mut taken), "passwd");
        assert_eq!(output_name("/abs/dir/x.txt", 1, &mut taken), "x.txt");
    }

    #[test]
    fn output_name_replaces_unusable_names() {
        let mut taken = HashSet::new();
        assert_eq!(output_name("", 0, &mut taken), "file_0");
        assert_eq!(output_name("..", 1, &mut taken), "file_1");
        assert_eq!(output_name("dir/", 2, &mut taken), "dir");
    }

    #[test]
    fn output_name_disambiguates_duplicates() {
        let mut taken = HashSet::new();
        assert_eq!(output_name("a.txt", 0, &mut taken), "a.txt");
        assert_eq!(output_name("a.txt", 1, &mut taken), "a.txt_1");
        assert_eq!(output_name("sub/a.txt", 2, &mut taken), "a.txt_2");
    }

    #[test]
    fn output_name_never_reuses_a_suffixed_name() {
        let mut taken = HashSet::new();
        let names: Vec<String> = ["a_2", "a", "a"]
            .iter()
            .enumerate()
            .map(|(i, n)| output_name(n, i, &mut taken))
            .collect();
        assert_eq!(names, vec!["a_2", "a", "a_2_1"]);

        let mut taken = HashSet::new();
        let names: Vec<String> = ["a_3", "a_3_1", "a", "a"]
            .iter()
            .enumerate()
            .map(|(i, n)| output_name(n, i, &mut taken))
            .collect();
        assert_eq!(names, vec!["a_3", "a_3_1", "a", "a_3_2"]);
    }
}
