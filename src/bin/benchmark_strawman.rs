//! Benchmark: strawman digest construction (supplemented, not in spec.md's
//! CLI surface, but the same `avg = <time>µs` contract line so plotting
//! scripts can overlay it against `benchmark_construct`'s power-sum curve).
//!
//! ```text
//! benchmark_strawman --kind {a|b|c} --window W --trials K -n N
//! ```

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

fn parse_kind(s: &str) -> Option<Kind> {
    match s {
        "a" => Some(Kind::StrA),
        "b" => Some(Kind::StrB),
        "c" => Some(Kind::StrC),
        other => Kind::parse(other),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            env::var("RUST_LOG").unwrap_or_else(|_| "benchmark_strawman=info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = env::args().collect();

    let kind_str = parse_flag(&args, "--kind").unwrap_or_else(|| "a".to_string());
    let kind = parse_kind(&kind_str)
        .ok_or_else(|| anyhow::anyhow!("--kind must be one of a, b, c (got `{kind_str}`)"))?;
    let window: usize = parse_flag(&args, "--window")
        .and_then(|s| s.parse().ok())
        .unwrap_or(64);
    let trials: usize = parse_flag(&args, "--trials")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);
    let n: usize = parse_flag(&args, "-n")
        .and_then(|s| s.parse().ok())
        .unwrap_or(10_000);

    tracing::info!(kind = ?kind, window, trials, n, "benchmark_strawman start");

    let mut total = std::time::Duration::ZERO;
    for _ in 0..trials {
        // Strawmen store raw u64 identifiers regardless of declared width;
        // Backend::B32 here is only a wire-format tag, not load-bearing.
        let mut d = Digest::new(kind, Backend::B32, window);
        let start = Instant::now();
        for i in 0..n {
            d.insert((i as u64) + 1)?;
        }
        total += start.elapsed();
    }

    let avg = total / trials as u32;
    let per_packet_ns = avg.as_nanos() as f64 / n as f64;
    println!("kind = {kind_str}");
    println!("avg = {}µs", avg.as_micros());
    println!("avg (per-packet): {per_packet_ns:.2}ns/packet");
    Ok(())
}
