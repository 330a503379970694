//! esm-demo: encrypt strings and compare them without decrypting them.

use std::time::Instant;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use esm::prelude::*;

type AppResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "esm-demo")]
#[command(about = "Encrypted string equality over BFV")]
#[command(version)]
struct Args {
    /// Longest expected string, in characters
    #[arg(long, default_value_t = 256)]
    max_string_length: usize,

    /// Security level in bits (128, 192 or 256)
    #[arg(long, default_value_t = 128)]
    security: u32,

    /// Bits per character
    #[arg(long, default_value_t = 16)]
    char_length: usize,

    /// Size the ring from the string length instead of the smallest standard ring
    #[arg(long)]
    size_ring_to_length: bool,

    /// Decrypt the per-string bit sums (reveals Hamming weights)
    #[arg(long)]
    leaky_bit_sums: bool,

    /// Strings to compare against the first one
    #[arg(default_values = ["hello world", "hello world", "bye world"])]
    strings: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> AppResult<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let policy = if args.leaky_bit_sums {
        BitSumPolicy::DecryptIntermediate
    } else {
        BitSumPolicy::Homomorphic
    };
    let config = MatcherConfig::builder()
        .max_string_length(args.max_string_length)
        .security_level(SecurityLevel::try_from(args.security)?)
        .char_length(args.char_length)
        .use_minimum_ring(!args.size_ring_to_length)
        .bit_sum_policy(policy)
        .build()?;

    let start = Instant::now();
    let matcher = Matcher::ready(config)?;
    let params = matcher.parameters()?;
    info!(
        ring_dimension = params.ring_dimension,
        plaintext_modulus_bits = params.plaintext_modulus_bits,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "keys generated"
    );

    let Some((reference, others)) = args.strings.split_first() else {
        return Err("at least one string is required".into());
    };
    let encrypted_reference = matcher.encrypt_str(reference)?;

    for other in others {
        let start = Instant::now();
        let encrypted = matcher.encrypt_str(other)?;
        match matcher.equal(&encrypted_reference, &encrypted) {
            Ok(equal) => println!(
                "{reference:?} == {other:?}: {equal} ({} ms)",
                start.elapsed().as_millis()
            ),
            Err(EsmError::Shape(err)) => println!("{reference:?} vs {other:?}: {err}"),
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
