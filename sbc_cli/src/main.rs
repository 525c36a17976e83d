use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use sbc_codecs::codec_by_name;
use sbc_core::chunk::FrameBlocks;
use sbc_core::frame::DEFAULT_BLOCK_SIZE;
use sbc_core::{compress_file, decompress_file, default_workers, PipelineConfig};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "sbc",
    about = "Split Block Container — parallel block compression into a length-prefixed container",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into an SBC container
    Compress {
        /// Source file to compress
        input: PathBuf,
        /// Destination container file
        output: PathBuf,
        /// Codec to use: gzip | zstd | lz4 | store
        #[arg(short, long, default_value = "gzip")]
        codec: String,
        /// Compression level (gzip 0-9, zstd 1-22)
        #[arg(long)]
        level: Option<i32>,
        /// Raw bytes per block (default: 1 MB)
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,
        /// Number of parallel workers (default: logical CPUs)
        #[arg(short, long, default_value_t = default_workers())]
        jobs: usize,
    },
    /// Decompress an SBC container back to raw bytes
    ///
    /// The container stores no codec id; pass the same --codec used to
    /// compress it.
    Decompress {
        /// Source container file
        input: PathBuf,
        /// Destination file
        output: PathBuf,
        /// Codec the container was compressed with
        #[arg(short, long, default_value = "gzip")]
        codec: String,
        /// Number of parallel workers (default: logical CPUs)
        #[arg(short, long, default_value_t = default_workers())]
        jobs: usize,
    },
    /// Walk a container's frames and print size statistics
    Inspect {
        /// Container file to inspect
        file: PathBuf,
        /// Print per-frame details
        #[arg(long)]
        blocks: bool,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(
    input: PathBuf,
    output: PathBuf,
    codec_name: &str,
    level: Option<i32>,
    block_size: usize,
    jobs: usize,
) -> anyhow::Result<()> {
    anyhow::ensure!(block_size >= 1, "block size must be at least 1 byte");
    anyhow::ensure!(jobs >= 1, "worker count must be at least 1");
    let codec = codec_by_name(codec_name, level)?;
    let config = PipelineConfig {
        block_size,
        workers: jobs,
    };

    info!(codec = codec.name(), block_size, jobs, "starting compression");
    let t0 = Instant::now();
    let summary = compress_file(&input, &output, codec.as_ref(), &config)
        .with_context(|| format!("compressing {:?} into {:?}", input, output))?;
    let elapsed = t0.elapsed();

    let ratio = if summary.bytes_out > 0 {
        summary.bytes_in as f64 / summary.bytes_out as f64
    } else {
        1.0
    };
    eprintln!("  codec       : {}", codec.name());
    eprintln!("  block size  : {}", human_bytes(block_size as u64));
    eprintln!("  workers     : {}", jobs);
    eprintln!("  blocks      : {}", summary.blocks);
    eprintln!("  raw size    : {}", human_bytes(summary.bytes_in));
    eprintln!("  compressed  : {}", human_bytes(summary.bytes_out));
    eprintln!("  ratio       : {:.2}x", ratio);
    eprintln!(
        "  throughput  : {}/s",
        human_bytes((summary.bytes_in as f64 / elapsed.as_secs_f64()) as u64)
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_decompress(
    input: PathBuf,
    output: PathBuf,
    codec_name: &str,
    jobs: usize,
) -> anyhow::Result<()> {
    anyhow::ensure!(jobs >= 1, "worker count must be at least 1");
    let codec = codec_by_name(codec_name, None)?;
    let config = PipelineConfig {
        workers: jobs,
        ..PipelineConfig::default()
    };

    info!(codec = codec.name(), jobs, "starting decompression");
    let t0 = Instant::now();
    let summary = decompress_file(&input, &output, codec.as_ref(), &config)
        .with_context(|| format!("decompressing {:?} into {:?}", input, output))?;
    let elapsed = t0.elapsed();

    eprintln!("  codec       : {}", codec.name());
    eprintln!("  workers     : {}", jobs);
    eprintln!("  blocks      : {}", summary.blocks);
    eprintln!("  compressed  : {}", human_bytes(summary.bytes_in));
    eprintln!("  raw size    : {}", human_bytes(summary.bytes_out));
    eprintln!(
        "  throughput  : {}/s",
        human_bytes((summary.bytes_out as f64 / elapsed.as_secs_f64()) as u64)
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_inspect(file: PathBuf, show_blocks: bool) -> anyhow::Result<()> {
    let src = File::open(&file).with_context(|| format!("opening container {:?}", file))?;
    let container_size = src.metadata()?.len();

    let mut frames = 0u64;
    let mut payload_total = 0u64;
    let mut min_len = u64::MAX;
    let mut max_len = 0u64;
    let mut sizes = Vec::new();

    for block in FrameBlocks::new(BufReader::new(src)) {
        let block = block.with_context(|| format!("walking frames of {:?}", file))?;
        let len = block.data.len() as u64;
        frames += 1;
        payload_total += len;
        min_len = min_len.min(len);
        max_len = max_len.max(len);
        if show_blocks {
            sizes.push(len);
        }
    }

    println!("=== SBC container: {:?} ===", file);
    println!();
    println!("  file on disk   : {}", human_bytes(container_size));
    println!("  frames         : {}", frames);
    println!("  payload total  : {}", human_bytes(payload_total));
    if frames > 0 {
        println!("  frame min      : {}", human_bytes(min_len));
        println!("  frame avg      : {}", human_bytes(payload_total / frames));
        println!("  frame max      : {}", human_bytes(max_len));
    }

    if show_blocks && frames > 0 {
        println!();
        println!("  {:>8}  {:>12}", "frame", "payload");
        println!("  {}", "-".repeat(22));
        for (i, len) in sizes.iter().enumerate() {
            println!("  {:>8}  {:>12}", i, human_bytes(*len));
        }
    }

    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compress {
            input,
            output,
            codec,
            level,
            block_size,
            jobs,
        } => run_compress(input, output, &codec, level, block_size, jobs),
        Commands::Decompress {
            input,
            output,
            codec,
            jobs,
        } => run_decompress(input, output, &codec, jobs),
        Commands::Inspect { file, blocks } => run_inspect(file, blocks),
    }
}
