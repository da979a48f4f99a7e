use anyhow::Context;
use clap::Parser;
use huffpack::{compress_with_stats, decompress as huffpack_decompress, CodecOptions, FrameFormat};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, clap::Args)]
struct CompressArgs {
    input_path: PathBuf,

    /// Directory receiving the compressed file.
    #[arg(long, default_value = "bin")]
    out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = FrameFormat::LengthPrefixed)]
    format: FrameFormat,
}

#[derive(Debug, Clone, clap::Args)]
struct DecompressArgs {
    input_path: PathBuf,

    /// Directory receiving the restored text.
    #[arg(long, default_value = "txt")]
    out_dir: PathBuf,
}

#[derive(Debug, Clone, clap::Subcommand)]
enum Operation {
    Compress(CompressArgs),
    Decompress(DecompressArgs),
}

#[derive(Debug, clap::Parser)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    op: Operation,
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    println!("Input file size: {} KB", kilobytes(data.len() as u64));
    Ok(data)
}

/// Writes `data` to `<out_dir>/<prefix>-XXXX.<extension>` and returns the path.
fn write_output(
    out_dir: &Path,
    prefix: &str,
    extension: &str,
    data: &[u8],
) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let suffix: u16 = rand::thread_rng().gen();
    let path = out_dir.join(format!("{prefix}-{suffix:04x}.{extension}"));

    fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn kilobytes(size: u64) -> String {
    format!("{:.2}", size as f64 / 1024.0)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn compress(args: CompressArgs) -> anyhow::Result<()> {
    let input = read_input(&args.input_path)?;

    let options = CodecOptions {
        format: args.format,
    };
    let (frame, stats) = compress_with_stats(&input, &options)
        .with_context(|| format!("failed to compress {}", args.input_path.display()))?;
    log::info!("{:?}", stats);

    let path = write_output(&args.out_dir, "compressed", "bin", &frame)?;
    println!(
        "Compressed binary file ({}): {} KB",
        file_name(&path),
        kilobytes(frame.len() as u64)
    );

    Ok(())
}

fn decompress(args: DecompressArgs) -> anyhow::Result<()> {
    let input = read_input(&args.input_path)?;

    let text = huffpack_decompress(&input)
        .with_context(|| format!("failed to decompress {}", args.input_path.display()))?;

    let path = write_output(&args.out_dir, "decompressed", "txt", &text)?;
    println!(
        "Decompressed txt file ({}): {} KB",
        file_name(&path),
        kilobytes(text.len() as u64)
    );

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match args.op {
        Operation::Compress(args) => compress(args),
        Operation::Decompress(args) => decompress(args),
    }
}
