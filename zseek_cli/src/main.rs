use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use zseek_codecs::codec_by_name;
use zseek_core::{Decoder, FrameCodec, FrameSource, IoSource, Reader, Writer};

/// Default raw bytes per frame: 64 KB.
const DEFAULT_FRAME_SIZE: u32 = 64 * 1024;

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "zseek",
    about = "Seekable compressed streams: compress, inspect, and randomly access",
    version
)]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a seekable stream
    Compress {
        /// Source file to compress ("-" reads stdin)
        input: PathBuf,
        /// Destination stream
        output: PathBuf,
        /// Codec to use: zstd | lz4 | passthrough
        #[arg(short, long, default_value = "zstd")]
        codec: String,
        /// Zstd compression level (1–22, only used with --codec zstd)
        #[arg(long, default_value_t = 3)]
        zstd_level: i32,
        /// Raw bytes per frame (default: 65536 = 64 KB)
        #[arg(short, long, default_value_t = DEFAULT_FRAME_SIZE)]
        frame_size: u32,
    },
    /// Fully decompress a seekable stream back to raw bytes
    Decompress {
        /// Source stream
        input: PathBuf,
        /// Destination file ("-" writes to stdout)
        output: PathBuf,
        /// Codec the stream was written with
        #[arg(short, long, default_value = "zstd")]
        codec: String,
    },
    /// Print seek table statistics
    Inspect {
        /// Seekable stream, or a bare seek table with --seek-table
        file: PathBuf,
        /// Treat FILE as a seek table extracted with `extract-footer`
        #[arg(long)]
        seek_table: bool,
        /// Print per-frame details
        #[arg(long)]
        frames: bool,
    },
    /// Decompress a byte range of the logical stream
    ///
    /// Only the frames overlapping the range are read and decompressed.
    Cat {
        /// Seekable stream
        file: PathBuf,
        /// Decompressed offset to start at
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Number of bytes to read (default: to the end)
        #[arg(long)]
        length: Option<u64>,
        /// Codec the stream was written with
        #[arg(short, long, default_value = "zstd")]
        codec: String,
        /// Write bytes to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Copy the trailing seek table into its own file
    ExtractFooter {
        /// Seekable stream
        file: PathBuf,
        /// Destination for the seek table bytes
        output: PathBuf,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn reader_codec(name: &str) -> anyhow::Result<Arc<dyn FrameCodec>> {
    // Level only matters when compressing.
    Ok(Arc::from(codec_by_name(name, 3)?))
}

fn open_stream(
    file: &Path,
    codec: &str,
) -> anyhow::Result<Reader<IoSource<BufReader<File>>>> {
    let f = File::open(file).with_context(|| format!("opening stream {:?}", file))?;
    let reader = Reader::new(BufReader::new(f), reader_codec(codec)?)
        .with_context(|| format!("reading seek table of {:?}", file))?;
    Ok(reader)
}

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

fn output_sink(output: &Path) -> anyhow::Result<Box<dyn Write>> {
    if output.to_str() == Some("-") {
        Ok(Box::new(io::stdout().lock()))
    } else {
        let f = File::create(output).with_context(|| format!("creating output file {:?}", output))?;
        Ok(Box::new(BufWriter::new(f)))
    }
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(
    input: PathBuf,
    output: PathBuf,
    codec_name: &str,
    zstd_level: i32,
    frame_size: u32,
) -> anyhow::Result<()> {
    if frame_size == 0 {
        anyhow::bail!("--frame-size must be at least 1 byte");
    }
    let codec = codec_by_name(codec_name, zstd_level)?;
    let codec_display = codec.name().to_string();

    let out = File::create(&output).with_context(|| format!("creating output file {:?}", output))?;
    let mut writer = Writer::new(BufWriter::new(out), codec);

    let mut src: Box<dyn Read> = if input.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&input).with_context(|| format!("opening input file {:?}", input))?;
        Box::new(BufReader::new(file))
    };

    let t0 = Instant::now();
    let mut bytes_read = 0u64;
    let mut chunk = Vec::with_capacity(frame_size as usize);
    loop {
        // Fill whole frames; only the last one may be short.
        chunk.clear();
        let n = src.by_ref().take(frame_size as u64).read_to_end(&mut chunk)?;
        if n == 0 {
            break;
        }
        writer.write(&chunk)?;
        bytes_read += n as u64;
    }

    let frame_count = writer.num_frames();
    writer.close()?;
    writer
        .into_sink()
        .into_inner()
        .into_inner()
        .map_err(|e| e.into_error())?
        .sync_all()?;
    let elapsed = t0.elapsed();

    let compressed_size = std::fs::metadata(&output)?.len();
    let ratio = if compressed_size == 0 {
        1.0
    } else {
        bytes_read as f64 / compressed_size as f64
    };

    eprintln!("  codec       : {}", codec_display);
    eprintln!("  frame size  : {}", human_bytes(frame_size as u64));
    eprintln!("  frames      : {}", frame_count);
    eprintln!("  raw size    : {}", human_bytes(bytes_read));
    eprintln!("  on disk     : {}", human_bytes(compressed_size));
    eprintln!("  ratio       : {:.2}x", ratio);
    eprintln!(
        "  throughput  : {}/s",
        human_bytes((bytes_read as f64 / elapsed.as_secs_f64()) as u64)
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_decompress(input: PathBuf, output: PathBuf, codec: &str) -> anyhow::Result<()> {
    let mut reader = open_stream(&input, codec)?;
    let mut dst = output_sink(&output)?;

    let t0 = Instant::now();
    let total_raw = io::copy(&mut reader, &mut dst)?;
    dst.flush()?;

    let elapsed = t0.elapsed();
    eprintln!("  frames      : {}", reader.num_frames());
    eprintln!("  raw size    : {}", human_bytes(total_raw));
    eprintln!(
        "  throughput  : {}/s",
        human_bytes((total_raw as f64 / elapsed.as_secs_f64()) as u64)
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_inspect(file: PathBuf, is_seek_table: bool, show_frames: bool) -> anyhow::Result<()> {
    let file_size = std::fs::metadata(&file)?.len();
    let seek_table = if is_seek_table {
        std::fs::read(&file)?
    } else {
        let f = File::open(&file).with_context(|| format!("opening stream {:?}", file))?;
        IoSource::new(BufReader::new(f)).read_footer()?
    };
    // Lookups only; no codec needed.
    let decoder = Decoder::from_seek_table(&seek_table)?;

    println!("=== Seekable stream: {:?} ===", file);
    println!();
    println!("  frames         : {}", decoder.num_frames());
    println!("  raw size       : {}", human_bytes(decoder.size()));
    println!("  compressed     : {}", human_bytes(decoder.compressed_size()));
    println!("  seek table     : {}", human_bytes(seek_table.len() as u64));
    println!("  file on disk   : {}", human_bytes(file_size));
    println!("  ratio          : {:.2}x", decoder.ratio());
    println!("  descriptor     : 0x{:02x}", decoder.descriptor().bits());

    if show_frames {
        println!();
        println!(
            "  {:>8}  {:>14}  {:>14}  {:>12}  {:>12}  {:>10}",
            "frame", "comp offset", "raw offset", "compressed", "raw", "checksum"
        );
        println!("  {}", "-".repeat(80));
        for e in decoder.frame_index().iter() {
            println!(
                "  {:>8}  {:>14}  {:>14}  {:>12}  {:>12}  {:08x}",
                e.id,
                e.comp_offset,
                e.decomp_offset,
                human_bytes(e.comp_size as u64),
                human_bytes(e.decomp_size as u64),
                e.checksum
            );
        }
    }

    Ok(())
}

fn run_cat(
    file: PathBuf,
    offset: u64,
    length: Option<u64>,
    codec: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut reader = open_stream(&file, codec)?;
    let length = length.unwrap_or_else(|| reader.size().saturating_sub(offset));

    if let Some(entry) = reader.index_by_decomp_offset(offset) {
        eprintln!(
            "seeking to frame {} (compressed offset {}, raw offset {})...",
            entry.id, entry.comp_offset, entry.decomp_offset
        );
    }

    let t0 = Instant::now();
    let raw = reader.read_range(offset, length)?;
    let elapsed = t0.elapsed();
    eprintln!(
        "  decoded {} in {:.3}ms",
        human_bytes(raw.len() as u64),
        elapsed.as_secs_f64() * 1000.0
    );

    match output {
        Some(path) => {
            std::fs::write(&path, &raw)?;
            eprintln!("  written to {:?}", path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&raw)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn run_extract_footer(file: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let f = File::open(&file).with_context(|| format!("opening stream {:?}", file))?;
    let seek_table = IoSource::new(BufReader::new(f)).read_footer()?;
    // Parse before writing so a broken table is never persisted.
    let decoder = Decoder::from_seek_table(&seek_table)?;
    std::fs::write(&output, &seek_table)
        .with_context(|| format!("writing seek table to {:?}", output))?;
    eprintln!(
        "  wrote {} seek table ({} frames) to {:?}",
        human_bytes(seek_table.len() as u64),
        decoder.num_frames(),
        output
    );
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Compress {
            input,
            output,
            codec,
            zstd_level,
            frame_size,
        } => run_compress(input, output, &codec, zstd_level, frame_size),
        Commands::Decompress {
            input,
            output,
            codec,
        } => run_decompress(input, output, &codec),
        Commands::Inspect {
            file,
            seek_table,
            frames,
        } => run_inspect(file, seek_table, frames),
        Commands::Cat {
            file,
            offset,
            length,
            codec,
            output,
        } => run_cat(file, offset, length, &codec, output),
        Commands::ExtractFooter { file, output } => run_extract_footer(file, output),
    }
}
