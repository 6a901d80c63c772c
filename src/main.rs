//! # charset-util CLI - Legacy Charset Converter
//!
//! Command-line front end for decoding, encoding and guessing the charset
//! of files or standard input.

#[cfg(feature = "cli")]
use std::fs::{self, File};
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use charset_util::detection::language_for;
#[cfg(feature = "cli")]
use charset_util::{Charsets, Chardetng, DEFAULT_PREFIX_LEN, Guesser, WhatwgRegistry};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// charset-util: decode, encode and guess legacy character encodings
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "charset-util")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Decode input from a legacy charset into UTF-8
    Decode(DecodeArgs),

    /// Encode UTF-8 input into a legacy charset
    Encode(EncodeArgs),

    /// Guess the charset and language of the input
    Guess(GuessArgs),

    /// List all supported charsets
    List(ListArgs),
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct DecodeArgs {
    /// Charset label of the input (e.g. Windows-31J, EUC-JP, latin1)
    #[arg(short, long)]
    charset: String,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct EncodeArgs {
    /// Charset label to encode into
    #[arg(short, long)]
    charset: String,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct GuessArgs {
    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Number of leading bytes to sample
    #[arg(long, default_value_t = DEFAULT_PREFIX_LEN, conflicts_with = "full")]
    prefix_len: usize,

    /// Sample the whole input instead of a prefix
    #[arg(long)]
    full: bool,

    /// Top-level domain the content came from (e.g. jp, ru)
    #[arg(long)]
    tld: Option<String>,

    /// Never answer UTF-8
    #[arg(long)]
    no_utf8: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ListArgs {
    /// Show language and capability details
    #[arg(long)]
    details: bool,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionResult {
    charset: String,
    bytes_read: usize,
    bytes_written: usize,
    processing_time_ms: u64,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct CharsetInfo {
    name: &'static str,
    language: &'static str,
    ascii_compatible: bool,
    single_byte: bool,
    encodable: bool,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Decode(ref args) => decode_command(args, &cli)?,
        Commands::Encode(ref args) => encode_command(args, &cli)?,
        Commands::Guess(ref args) => guess_command(args, &cli)?,
        Commands::List(ref args) => list_command(args, &cli)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(feature = "cli")]
fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "reading input file");
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Ok(Box::new(io::BufReader::new(file)))
        }
        None => {
            tracing::debug!("reading from stdin");
            Ok(Box::new(io::stdin().lock()))
        }
    }
}

#[cfg(feature = "cli")]
fn write_output(path: Option<&Path>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, data)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "wrote output file");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(data)
                .and_then(|()| stdout.flush())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Counts bytes pulled through a reader
#[cfg(feature = "cli")]
struct Counted<R> {
    inner: R,
    count: usize,
}

#[cfg(feature = "cli")]
impl<R: Read> Read for Counted<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.count += read;
        Ok(read)
    }
}

#[cfg(feature = "cli")]
fn report_conversion(cli: &Cli, result: ConversionResult, to_stdout: bool) -> Result<()> {
    match cli.format {
        OutputFormat::Json => {
            // Keep stdout clean for the converted bytes
            let json = serde_json::to_string_pretty(&result)?;
            if to_stdout {
                eprintln!("{json}");
            } else {
                println!("{json}");
            }
        }
        OutputFormat::Text => {
            if cli.verbose || !to_stdout {
                eprintln!(
                    "✓ {} bytes -> {} bytes ({}) in {} ms",
                    result.bytes_read,
                    result.bytes_written,
                    result.charset,
                    result.processing_time_ms
                );
            }
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn decode_command(args: &DecodeArgs, cli: &Cli) -> Result<()> {
    let start_time = std::time::Instant::now();
    let mut input = Counted {
        inner: open_input(args.input.as_deref())?,
        count: 0,
    };

    let text = Charsets::new()
        .decode_reader(&mut input, &args.charset)
        .with_context(|| format!("Failed to decode input as {}", args.charset))?;

    write_output(args.output.as_deref(), text.as_bytes())?;

    let result = ConversionResult {
        charset: args.charset.clone(),
        bytes_read: input.count,
        bytes_written: text.len(),
        processing_time_ms: start_time.elapsed().as_millis() as u64,
    };
    report_conversion(cli, result, args.output.is_none())
}

#[cfg(feature = "cli")]
fn encode_command(args: &EncodeArgs, cli: &Cli) -> Result<()> {
    let start_time = std::time::Instant::now();
    let mut input = Counted {
        inner: open_input(args.input.as_deref())?,
        count: 0,
    };

    let bytes = Charsets::new()
        .encode_reader(&mut input, &args.charset)
        .with_context(|| format!("Failed to encode input as {}", args.charset))?;

    write_output(args.output.as_deref(), &bytes)?;

    let result = ConversionResult {
        charset: args.charset.clone(),
        bytes_read: input.count,
        bytes_written: bytes.len(),
        processing_time_ms: start_time.elapsed().as_millis() as u64,
    };
    report_conversion(cli, result, args.output.is_none())
}

#[cfg(feature = "cli")]
fn guess_command(args: &GuessArgs, cli: &Cli) -> Result<()> {
    let mut backend = Chardetng::new().allow_utf8(!args.no_utf8);
    if let Some(ref tld) = args.tld {
        backend = backend.with_tld(tld.as_str());
    }

    let guesser = Guesser::with_backend(backend);
    let input = open_input(args.input.as_deref())?;
    let guess = if args.full {
        let mut data = Vec::new();
        let mut input = input;
        input
            .read_to_end(&mut data)
            .context("Failed to read input")?;
        guesser.guess(&data)
    } else {
        guesser.with_prefix_len(args.prefix_len).guess_reader(input)
    }
    .context("Could not guess the charset of the input")?;

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&guess)?);
        }
        OutputFormat::Text => {
            println!("Charset: {}", guess.charset());
            if !guess.language().is_empty() {
                println!("Language: {}", guess.language());
            }
            println!("Confidence: {}", guess.confidence());
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn list_command(args: &ListArgs, cli: &Cli) -> Result<()> {
    let charsets: Vec<_> = WhatwgRegistry::encodings()
        .into_iter()
        .map(|encoding| CharsetInfo {
            name: encoding.name(),
            language: language_for(encoding),
            ascii_compatible: encoding.is_ascii_compatible(),
            single_byte: encoding.is_single_byte(),
            encodable: encoding != encoding_rs::REPLACEMENT,
        })
        .collect();

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&charsets)?);
        }
        OutputFormat::Text => {
            println!("Supported Charsets ({} total):", charsets.len());
            println!();

            for info in charsets {
                if args.details {
                    println!(
                        "{:16} {:4} ascii-compatible: {:3} single-byte: {:3} encodable: {}",
                        info.name,
                        if info.language.is_empty() { "-" } else { info.language },
                        yes_no(info.ascii_compatible),
                        yes_no(info.single_byte),
                        yes_no(info.encodable)
                    );
                } else {
                    println!("{}", info.name);
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
