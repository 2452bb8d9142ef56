//! zipline CLI - inspect, build and prune ZIP archives.
//!
//! This is the main entry point for the zipline command-line application.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::{MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use walkdir::WalkDir;

use zipline_archive::{CompressionMethod, WriteOptions, ZipArchive, ZipWriter};

/// zipline - ZIP archive tool with aligned writes and in-place deletion
#[derive(Parser)]
#[command(name = "zipline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of an archive
    List {
        /// Path to the archive
        #[arg(short, long, env = "ZIPLINE_ARCHIVE")]
        archive: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Extract entries to a directory
    Extract {
        /// Path to the archive
        #[arg(short, long, env = "ZIPLINE_ARCHIVE")]
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, env = "ZIPLINE_OUTPUT")]
        output: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Write one entry to stdout
    Cat {
        /// Path to the archive
        #[arg(short, long, env = "ZIPLINE_ARCHIVE")]
        archive: PathBuf,

        /// Entry name
        entry: String,

        /// Write the stored bytes without decompressing
        #[arg(long)]
        raw: bool,
    },

    /// Add files or directory trees
    Add {
        /// Path to the archive
        #[arg(short, long, env = "ZIPLINE_ARCHIVE")]
        archive: PathBuf,

        /// Files or directories to add
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Compression method
        #[arg(short, long, value_enum, default_value_t = Method::Deflate)]
        compression: Method,

        /// Codec level
        #[arg(short, long)]
        level: Option<i32>,

        /// Align entry data to this many bytes (power of two, 0 disables)
        #[arg(long, default_value_t = 0)]
        align: u16,

        /// Prefix prepended to every entry name
        #[arg(short, long)]
        prefix: Option<String>,

        /// Append to an existing archive instead of replacing it
        #[arg(long)]
        append: bool,
    },

    /// Add a directory entry
    Mkdir {
        /// Path to the archive
        #[arg(short, long, env = "ZIPLINE_ARCHIVE")]
        archive: PathBuf,

        /// Directory name
        name: String,
    },

    /// Delete entries
    Delete {
        /// Path to the archive
        #[arg(short, long, env = "ZIPLINE_ARCHIVE")]
        archive: PathBuf,

        /// Entry names
        #[arg(required = true)]
        names: Vec<String>,

        /// Zero entries in place instead of rebuilding the archive
        #[arg(long)]
        fill_void: bool,
    },

    /// Print or set the archive comment
    Comment {
        /// Path to the archive
        #[arg(short, long, env = "ZIPLINE_ARCHIVE")]
        archive: PathBuf,

        /// New comment
        #[arg(short, long)]
        set: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Method {
    Store,
    Deflate,
    Bzip2,
    Zstd,
}

impl From<Method> for CompressionMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Store => CompressionMethod::Store,
            Method::Deflate => CompressionMethod::Deflate,
            Method::Bzip2 => CompressionMethod::Bzip2,
            Method::Zstd => CompressionMethod::Zstd,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::List { archive, filter, detailed } => {
            cmd_list(&archive, filter.as_deref(), detailed)?;
        }
        Commands::Extract { archive, output, filter } => {
            cmd_extract(&archive, &output, filter.as_deref())?;
        }
        Commands::Cat { archive, entry, raw } => {
            cmd_cat(&archive, &entry, raw)?;
        }
        Commands::Add {
            archive,
            files,
            compression,
            level,
            align,
            prefix,
            append,
        } => {
            let mut options = WriteOptions::new(compression.into()).alignment(align);
            if let Some(level) = level {
                options = options.level(level);
            }
            cmd_add(&archive, &files, &options, prefix.as_deref(), append)?;
        }
        Commands::Mkdir { archive, name } => {
            cmd_mkdir(&archive, &name)?;
        }
        Commands::Delete { archive, names, fill_void } => {
            cmd_delete(&archive, &names, fill_void)?;
        }
        Commands::Comment { archive, set } => {
            cmd_comment(&archive, set.as_deref())?;
        }
    }

    Ok(())
}

fn cmd_list(archive_path: &Path, filter: Option<&str>, detailed: bool) -> Result<()> {
    let archive = ZipArchive::open(archive_path).context("Failed to open archive")?;

    let filter = filter.map(name_filter).transpose()?;

    let mut count = 0;
    for entry in archive.iter()? {
        let name = entry.name();
        if let Some(pattern) = &filter {
            if !pattern.matches_with(&name, FILTER_OPTIONS) {
                continue;
            }
        }

        if detailed {
            let offset = entry
                .data_offset()
                .map(|o| o.to_string())
                .unwrap_or_else(|_| "?".to_string());
            println!(
                "{:>12} {:>12} {:<8} {:08x} {:>12} {}",
                entry.compressed_size(),
                entry.uncompressed_size(),
                entry.compression(),
                entry.crc32(),
                offset,
                name
            );
        } else {
            println!("{}", name);
        }
        count += 1;
    }

    println!("\nTotal: {} entries", count);

    Ok(())
}

fn cmd_extract(archive_path: &Path, output: &Path, filter: Option<&str>) -> Result<()> {
    println!("Opening archive: {}", archive_path.display());

    let start = Instant::now();
    let archive = ZipArchive::open(archive_path).context("Failed to open archive")?;

    println!("Loaded {} entries in {:?}", archive.entry_count()?, start.elapsed());

    let filter = filter.map(name_filter).transpose()?;
    let entries: Vec<_> = archive
        .iter()?
        .filter(|e| {
            filter
                .as_ref()
                .map_or(true, |pattern| pattern.matches_with(&e.name(), FILTER_OPTIONS))
        })
        .collect();

    println!("Extracting {} entries...", entries.len());

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;

    let start = Instant::now();
    let mut skipped = 0;
    for entry in &entries {
        let name = entry.name();
        let Some(relative) = safe_relative_path(&name) else {
            pb.println(format!("Skipping unsafe entry name: {}", name));
            skipped += 1;
            pb.inc(1);
            continue;
        };
        if !entry.is_dir() && !entry.compression().is_supported() {
            pb.println(format!("Skipping {}: {} compression", name, entry.compression()));
            skipped += 1;
            pb.inc(1);
            continue;
        }
        let output_path = output.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&output_path)?;
        } else {
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let data = entry
                .read()
                .with_context(|| format!("Failed to read entry {}", name))?;
            fs::write(&output_path, data)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    println!(
        "Extraction completed in {:?} ({} skipped)",
        start.elapsed(),
        skipped
    );

    Ok(())
}

fn cmd_cat(archive_path: &Path, name: &str, raw: bool) -> Result<()> {
    let archive = ZipArchive::open(archive_path).context("Failed to open archive")?;

    let entry = if raw {
        archive.open_entry_raw_by_name(name)?
    } else {
        archive.open_entry_by_name(name)?
    };
    let entry = entry.with_context(|| format!("No entry named {}", name))?;

    let data = entry.read().with_context(|| format!("Failed to read entry {}", name))?;
    std::io::stdout()
        .lock()
        .write_all(&data)
        .context("Failed to write to stdout")?;

    Ok(())
}

fn cmd_add(
    archive_path: &Path,
    inputs: &[PathBuf],
    options: &WriteOptions,
    prefix: Option<&str>,
    append: bool,
) -> Result<()> {
    let mut writer = if append {
        ZipWriter::append(archive_path).context("Failed to open archive for appending")?
    } else {
        ZipWriter::create(archive_path).context("Failed to create archive")?
    };

    let start = Instant::now();
    let mut added = 0;
    for input in inputs {
        let base = input.parent().unwrap_or_else(|| Path::new(""));

        for item in WalkDir::new(input).sort_by_file_name() {
            let item = item.with_context(|| format!("Failed to walk {}", input.display()))?;
            let relative = item.path().strip_prefix(base).unwrap_or(item.path());
            let name = entry_name(prefix, relative);
            if name.is_empty() {
                continue;
            }

            if item.file_type().is_dir() {
                writer.write_dir(&name)?;
            } else {
                let data = fs::read(item.path())
                    .with_context(|| format!("Failed to read {}", item.path().display()))?;
                writer
                    .write_entry_with(&name, &data, options)
                    .with_context(|| format!("Failed to add {}", name))?;
            }
            debug!("added {}", name);
            added += 1;
        }
    }

    writer.finish().context("Failed to write central directory")?;
    println!("Added {} entries in {:?}", added, start.elapsed());

    Ok(())
}

fn cmd_mkdir(archive_path: &Path, name: &str) -> Result<()> {
    let mut writer = ZipWriter::append(archive_path).context("Failed to open archive for appending")?;
    writer.write_dir(name)?;
    writer.finish().context("Failed to write central directory")?;

    Ok(())
}

fn cmd_delete(archive_path: &Path, names: &[String], fill_void: bool) -> Result<()> {
    let before = fs::metadata(archive_path)
        .with_context(|| format!("Failed to stat {}", archive_path.display()))?
        .len();

    let mut writer = ZipWriter::append(archive_path).context("Failed to open archive")?;
    if fill_void {
        for name in names {
            writer
                .delete_entry_fill_void(name)
                .with_context(|| format!("Failed to delete {}", name))?;
        }
    } else {
        writer
            .delete_entries_rebuild(names)
            .context("Failed to rebuild archive")?;
    }
    writer.finish().context("Failed to write central directory")?;

    let after = fs::metadata(archive_path)?.len();
    info!("archive size {} -> {} bytes", before, after);
    println!("Deleted {} entries ({} -> {} bytes)", names.len(), before, after);

    Ok(())
}

fn cmd_comment(archive_path: &Path, comment: Option<&str>) -> Result<()> {
    match comment {
        Some(comment) => {
            let mut writer =
                ZipWriter::append(archive_path).context("Failed to open archive")?;
            writer.set_comment(comment.as_bytes())?;
            writer.finish().context("Failed to write central directory")?;
        }
        None => {
            let archive = ZipArchive::open(archive_path).context("Failed to open archive")?;
            println!("{}", String::from_utf8_lossy(archive.comment()?));
        }
    }

    Ok(())
}

/// Entry name for a path relative to the input's parent, `/`-separated.
fn entry_name(prefix: Option<&str>, relative: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(prefix) = prefix {
        parts.extend(
            prefix
                .split('/')
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        );
    }
    parts.extend(relative.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    }));
    parts.join("/")
}

/// Output path for an entry name, or `None` when the name would escape the
/// output directory.
fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for component in Path::new(&name.replace('\\', "/")).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Case-insensitive, and `*` also matches `/`.
const FILTER_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compile a `--filter` pattern. A pattern without wildcards matches any
/// name containing it.
fn name_filter(pattern: &str) -> Result<Pattern> {
    let source = if pattern.contains(['*', '?', '[']) {
        pattern.to_string()
    } else {
        format!("*{}*", Pattern::escape(pattern))
    };
    Pattern::new(&source).with_context(|| format!("Invalid glob pattern: {}", pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_filter() {
        let matches = |pattern: &str, name: &str| name_filter(pattern).unwrap().matches_with(name, FILTER_OPTIONS);

        assert!(matches("*.txt", "docs/readme.TXT"));
        assert!(matches("lib/*/*.so", "lib/arm64/libfoo.so"));
        assert!(matches("readme", "docs/README.md"));
        assert!(matches("lib/arm??/*.so", "lib/arm64/libfoo.so"));
        assert!(matches("[ab].txt", "B.txt"));
        assert!(!matches("*.txt", "image.png"));
        assert!(!matches("lib/*", "assets/lib/x"));
        assert!(matches("a*a", "aba"));
        assert!(!matches("a*a", "a"));
        assert!(name_filter("[unclosed*").is_err());
    }

    #[test]
    fn test_safe_relative_path() {
        assert_eq!(safe_relative_path("a/b.txt"), Some(PathBuf::from("a/b.txt")));
        assert_eq!(safe_relative_path("dir/"), Some(PathBuf::from("dir")));
        assert_eq!(safe_relative_path("win\\path.txt"), Some(PathBuf::from("win/path.txt")));
        assert_eq!(safe_relative_path("../escape"), None);
        assert_eq!(safe_relative_path("/etc/passwd"), None);
        assert_eq!(safe_relative_path(""), None);
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(entry_name(None, Path::new("dir/file.txt")), "dir/file.txt");
        assert_eq!(entry_name(Some("assets/"), Path::new("x.png")), "assets/x.png");
        assert_eq!(entry_name(Some("/a//b"), Path::new("./c")), "a/b/c");
    }

    #[test]
    fn test_add_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir_all(tree.join("sub")).unwrap();
        fs::write(tree.join("a.txt"), b"alpha").unwrap();
        fs::write(tree.join("sub/b.txt"), b"beta").unwrap();

        let archive = dir.path().join("out.zip");
        let options = WriteOptions::new(CompressionMethod::Deflate);
        cmd_add(&archive, &[tree], &options, None, false).unwrap();

        let names: Vec<String> = ZipArchive::open(&archive)
            .unwrap()
            .records()
            .unwrap()
            .iter()
            .map(|r| r.name().into_owned())
            .collect();
        assert_eq!(names, vec!["tree/", "tree/a.txt", "tree/sub/", "tree/sub/b.txt"]);

        cmd_delete(&archive, &["tree/a.txt".to_string()], false).unwrap();
        cmd_extract(&archive, &dir.path().join("out"), None).unwrap();

        assert!(!dir.path().join("out/tree/a.txt").exists());
        assert_eq!(fs::read(dir.path().join("out/tree/sub/b.txt")).unwrap(), b"beta");
    }
}
