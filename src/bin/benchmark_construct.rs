//! Benchmark: digest construction (insert throughput).
//!
//! ```text
//! benchmark_construct --width {16|32|63} --threshold T --trials K -n N [--backend NAME]
//! ```
//!
//! Builds a fresh digest, inserts `N` distinct identifiers, repeats `K`
//! times, and reports the average wall-clock time per trial and per insert.

#![forbid(unsafe_code)]

use std::env;
use std::time::Instant;

use quack::{Backend, Digest, Kind};

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            env::var("RUST_LOG").unwrap_or_else(|_| "benchmark_construct=info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = env::args().collect();

    let width = parse_flag(&args, "--width").unwrap_or_else(|| "32".to_string());
    let width_backend = Backend::parse(&width)
        .ok_or_else(|| anyhow::anyhow!("--width must be one of 16, 32, 63 (got `{width}`)"))?;
    let backend = match parse_flag(&args, "--backend") {
        None => width_backend,
        Some(name) => {
            let flag_backend = Backend::parse(&name).ok_or_else(|| {
                anyhow::anyhow!(
                    "--backend must be one of precompute, barrett, montgomery (got `{name}`)"
                )
            })?;
            if flag_backend != width_backend {
                anyhow::bail!(
                    "--backend {name} does not match --width {width} (width implies backend {})",
                    width_backend.name()
                );
            }
            flag_backend
        }
    };
    let t: usize = parse_flag(&args, "--threshold")
        .and_then(|s| s.parse().ok())
        .unwrap_or(64);
    let trials: usize = parse_flag(&args, "--trials")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);
    let n: usize = parse_flag(&args, "-n")
        .and_then(|s| s.parse().ok())
        .unwrap_or(10_000);

    tracing::info!(width = backend.name(), t, trials, n, "benchmark_construct start");

    let mut total = std::time::Duration::ZERO;
    for _ in 0..trials {
        let mut d = Digest::new(Kind::PowerSum, backend, t);
        let start = Instant::now();
        for i in 0..n {
            // Identifier 0 is reserved; offset by 1 so every backend's
            // modulus (as small as 65521 for the 16-bit field) stays clear
            // of overflow concerns for realistic `n`.
            d.insert((i as u64) + 1)?;
        }
        total += start.elapsed();
    }

    let avg = total / trials as u32;
    let per_packet_ns = avg.as_nanos() as f64 / n as f64;
    println!("backend = {}", backend.name());
    println!("avg = {}µs", avg.as_micros());
    println!("avg (per-packet): {per_packet_ns:.2}ns/packet");
    Ok(())
}
