//! Benchmark: digest decode (set-difference recovery).
//!
//! ```text
//! benchmark_decode --width {16|32|63} --threshold T --trials K -n N -d D [--backend NAME] [--factor]
//! ```
//!
//! Builds two digests differing by exactly `D` identifiers out of `N`
//! total inserts, subtracts them, and times [`quack::decode::decode`] over
//! `K` trials. `--factor` forces `RootFinder::Factor` instead of `Auto`, to
//! measure PolyFactor's cost even below its normal crossover point.

#![forbid(unsafe_code)]

use std::env;
use std::time::Instant;

use quack::{Backend, Digest, Kind, RootFinder};

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
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "benchmark_decode=info".into()))
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
    let d: usize = parse_flag(&args, "-d")
        .and_then(|s| s.parse().ok())
        .unwrap_or(t.min(8));
    let force_factor = args.iter().any(|a| a == "--factor");

    if d > t {
        anyhow::bail!("-d ({d}) must not exceed --threshold ({t})");
    }
    if d > n {
        anyhow::bail!("-d ({d}) must not exceed -n ({n})");
    }

    let finder = if force_factor {
        RootFinder::Factor
    } else {
        RootFinder::Auto
    };

    tracing::info!(
        width = backend.name(),
        t,
        trials,
        n,
        d,
        force_factor,
        "benchmark_decode start"
    );

    let mut total = std::time::Duration::ZERO;
    for _ in 0..trials {
        let mut full = Digest::new(Kind::PowerSum, backend, t);
        let mut missing_d = Digest::new(Kind::PowerSum, backend, t);
        for i in 0..n {
            let id = (i as u64) + 1;
            full.insert(id)?;
            if i >= d {
                missing_d.insert(id)?;
            }
        }
        full.merge_subtract(&missing_d)?;

        let start = Instant::now();
        let recovered = full.decode(finder)?;
        total += start.elapsed();
        if recovered.len() != d {
            anyhow::bail!(
                "decode recovered {} identifiers, expected {d}",
                recovered.len()
            );
        }
    }

    let avg = total / trials as u32;
    println!("backend = {}", backend.name());
    if avg.as_micros() >= 1000 {
        println!("avg = {:.3}ms", avg.as_micros() as f64 / 1000.0);
    } else {
        println!("avg = {}µs", avg.as_micros());
    }
    Ok(())
}
