//! Benchmark streaming accumulation into a dense histogram.
//!
//! Run with: cargo run --release --features bench --bin bench_accumulate
//!
//! Usage:
//!   bench_accumulate                 Run default size (1M events, 128^3 bins)
//!   bench_accumulate 1m 10m          Run multiple event counts
//!   bench_accumulate --bins 256      Use a 256^3 histogram
//!   bench_accumulate --skew 0.3      Shear the bin edges to exercise the dual basis
//!   bench_accumulate -t 8 -s 16      8 worker threads, 16 page segments
//!
//! Dispatch timings are logged at debug level: RUST_LOG=debug.

use clap::Parser;
use glam::DVec3;
use qspace_histogram::{Event, Histogram3D, ProjectionBinner, RunnerConfig};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};

/// Parse an event count with an optional `k` or `m` suffix ("250k", "1.5m").
fn parse_count(s: &str) -> Result<usize, String> {
    let lower = s.trim().to_ascii_lowercase();
    let (digits, scale) = match lower.as_bytes().last() {
        Some(b'k') => (&lower[..lower.len() - 1], 1e3),
        Some(b'm') => (&lower[..lower.len() - 1], 1e6),
        _ => (lower.as_str(), 1.0),
    };
    let n: f64 = digits
        .parse()
        .map_err(|e| format!("invalid count '{s}': {e}"))?;
    if !(n >= 0.0) {
        return Err(format!("count '{s}' must be non-negative"));
    }
    Ok((n * scale).round() as usize)
}

#[derive(Parser)]
#[command(name = "bench_accumulate")]
#[command(about = "Benchmark parallel histogram accumulation")]
struct Args {
    /// Event counts to benchmark (e.g., 100k, 1m, 10M)
    #[arg(value_parser = parse_count)]
    sizes: Vec<usize>,

    /// Bins per axis
    #[arg(short, long, default_value_t = 128)]
    bins: usize,

    /// Events per accumulate call
    #[arg(short, long, value_parser = parse_count, default_value = "256k")]
    chunk: usize,

    /// Worker threads (defaults to the QSPACE_HIST_THREADS environment setting)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Page segments per bulk operation
    #[arg(short, long)]
    segments: Option<usize>,

    /// Shear of the y and z edges toward x (0 = orthonormal)
    #[arg(long, default_value_t = 0.0)]
    skew: f64,

    /// Random seed
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Number of iterations to run (useful for profiling)
    #[arg(short = 'n', long, default_value_t = 1)]
    repeat: usize,
}

/// Events clustered around a few Gaussian-ish peaks on a flat background.
fn generate_events(n: usize, extent: f64, seed: u64) -> Vec<Event> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let peaks: Vec<DVec3> = (0..8)
        .map(|_| {
            DVec3::new(
                rng.gen_range(0.2..0.8),
                rng.gen_range(0.2..0.8),
                rng.gen_range(0.2..0.8),
            ) * extent
        })
        .collect();
    let width = extent * 0.02;

    (0..n)
        .map(|i| {
            let p = if i % 4 == 0 {
                DVec3::new(
                    rng.gen_range(0.0..extent),
                    rng.gen_range(0.0..extent),
                    rng.gen_range(0.0..extent),
                )
            } else {
                let peak = peaks[rng.gen_range(0..peaks.len())];
                // Sum of uniforms is close enough to a normal for a benchmark.
                let jitter = DVec3::new(
                    rng.gen_range(-1.0..1.0) + rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0) + rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0) + rng.gen_range(-1.0..1.0),
                );
                peak + jitter * width
            };
            Event::at(p, rng.gen_range(0.5..1.5))
        })
        .collect()
}

/// Short SI form: `950`, `12.5k`, `3.20M`.
fn si(value: f64) -> String {
    if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.1}k", value / 1e3)
    } else {
        format!("{value:.0}")
    }
}

fn format_rate(count: usize, ms: f64) -> String {
    if ms <= 0.0 {
        return "N/A".to_string();
    }
    format!("{}/s", si(count as f64 * 1000.0 / ms))
}

fn si_count(n: usize) -> String {
    si(n as f64)
}

struct BenchResult {
    n: usize,
    time_ms: f64,
    sum: f64,
}

fn run_benchmark(histogram: &mut Histogram3D, events: &[Event], chunk: usize) -> BenchResult {
    histogram.clear().expect("clear should succeed");

    let t0 = Instant::now();
    for batch in events.chunks(chunk.max(1)) {
        histogram
            .accumulate(batch, true)
            .expect("accumulate should succeed");
    }
    let time_ms = t0.elapsed().as_secs_f64() * 1000.0;

    BenchResult {
        n: events.len(),
        time_ms,
        sum: histogram.sum(),
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    println!("qspace-histogram Accumulate Benchmark");
    println!("=====================================\n");

    let sizes: Vec<usize> = if args.sizes.is_empty() {
        vec![1_000_000]
    } else {
        args.sizes
    };

    let mut config = RunnerConfig::from_env();
    if let Some(t) = args.threads {
        config.num_threads = t;
    }
    if let Some(s) = args.segments {
        config.num_segments = s;
    }
    config.timeout = config.timeout.max(Duration::from_secs(60));

    let extent = args.bins as f64;
    let directions = [
        DVec3::X,
        DVec3::new(args.skew, 1.0, 0.0),
        DVec3::new(args.skew, 0.0, 1.0),
    ];
    let edges = directions.map(|d| {
        ProjectionBinner::uniform(d, 0.0, extent, args.bins).expect("valid binner")
    });
    let mut histogram =
        Histogram3D::with_config(edges, config.clone()).expect("histogram should build");

    println!("Configuration:");
    println!("  seed = {}", args.seed);
    println!("  bins = {0}x{0}x{0}", args.bins);
    println!("  chunk = {}", si_count(args.chunk));
    println!(
        "  threads = {}, segments = {}",
        config.num_threads, config.num_segments
    );
    if args.skew != 0.0 {
        println!("  skew = {}", args.skew);
    }
    println!(
        "  sizes = {:?}",
        sizes.iter().map(|&n| si_count(n)).collect::<Vec<_>>()
    );
    if args.repeat > 1 {
        println!("  repeat = {}", args.repeat);
    }

    let mut results: Vec<BenchResult> = Vec::new();

    for n in &sizes {
        println!("\n{}", "=".repeat(60));
        println!("Benchmarking n = {}", si_count(*n));
        println!("{}", "=".repeat(60));

        let t_gen = Instant::now();
        let events = generate_events(*n, extent, args.seed);
        println!(
            "Event generation: {:.1}ms",
            t_gen.elapsed().as_secs_f64() * 1000.0
        );

        let mut times: Vec<f64> = Vec::with_capacity(args.repeat);
        let mut last_result: Option<BenchResult> = None;
        for iter in 0..args.repeat.max(1) {
            let result = run_benchmark(&mut histogram, &events, args.chunk);
            if args.repeat > 1 {
                println!("  Iteration {}/{}: {:.1}ms", iter + 1, args.repeat, result.time_ms);
            }
            times.push(result.time_ms);
            last_result = Some(result);
        }
        let result = last_result.expect("at least one iteration");

        let t_scan = Instant::now();
        histogram.scan_histogram().expect("scan should succeed");
        let scan_ms = t_scan.elapsed().as_secs_f64() * 1000.0;

        println!("\nResults:");
        if times.len() > 1 {
            let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let avg = times.iter().sum::<f64>() / times.len() as f64;
            println!("  Min time:      {:>8.1}ms", min);
            println!("  Max time:      {:>8.1}ms", max);
            println!("  Avg time:      {:>8.1}ms", avg);
            println!("  Throughput:    {:>8} (avg)", format_rate(result.n, avg));
        } else {
            println!("  Total time:    {:>8.1}ms", result.time_ms);
            println!(
                "  Throughput:    {:>8}",
                format_rate(result.n, result.time_ms)
            );
        }
        println!("  Scan time:     {:>8.1}ms", scan_ms);
        println!("  Binned weight: {:>8.1}", result.sum);
        println!("  Peak cell:     {:>8.1}", histogram.max());

        results.push(result);
    }

    if results.len() > 1 {
        println!("\n\n{}", "=".repeat(60));
        println!("SUMMARY");
        println!("{}", "=".repeat(60));
        println!("{:>10} | {:>10} | {:>12}", "n", "time", "throughput");
        println!("{:-<10}-+-{:-<10}-+-{:-<12}", "", "", "");

        for r in &results {
            println!(
                "{:>10} | {:>9.1}ms | {:>12}",
                si_count(r.n),
                r.time_ms,
                format_rate(r.n, r.time_ms)
            );
        }
    }

    println!("\nBenchmark complete.");
}
