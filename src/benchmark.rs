use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::executor::errors::{self, ErrorInfo};
use crate::executor::{Flow, ResumeFn, Val, resume_fn, stdlib};
use crate::programs;
use crate::runtime::Runtime;

pub struct BenchmarkParams {
    pub threads: usize,
    pub depth: u32,
    pub suspensions: u32,
    pub sleep_ms: u64,
    pub duration: Option<String>,
}

struct BenchmarkMetrics {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    launched: usize,
    completed: usize,
    failed: usize,
    pending: usize,
    latency_total_ms: f64,
}

pub async fn run_benchmark(params: BenchmarkParams) -> Result<()> {
    println!("🚀 Starting Strand Benchmark");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Validate parameters
    validate_params(&params)?;

    let timeout = if let Some(duration_str) = &params.duration {
        parse_duration(duration_str)?
    } else {
        Duration::from_secs(300) // 5 minute default timeout
    };

    println!("\n📋 Configuration:");
    println!("   Threads: {}", params.threads);
    println!("   Call depth: {}", params.depth);
    println!("   Suspensions/thread: {}", params.suspensions);
    if params.suspensions > 0 {
        println!("   Sleep per suspension: {}ms", params.sleep_ms);
    }

    let config = Config::load()?;
    let runtime = Runtime::new(config);

    let start_time = Utc::now();
    let bench_start = Instant::now();

    // Step 1: Launch one root program per thread
    println!("\n🔧 Launching {} threads...", params.threads);
    let mut handles = Vec::with_capacity(params.threads);
    for _ in 0..params.threads {
        let rt = runtime.clone();
        let program = bench_program(params.depth, params.suspensions, params.sleep_ms);
        handles.push(tokio::spawn(async move {
            let started = Instant::now();
            let outcome = rt.execute(program).await;
            (outcome.is_ok(), started.elapsed().as_secs_f64() * 1000.0)
        }));
    }

    // Step 2: Wait for completion or timeout
    println!("\n⏳ Waiting for threads to complete...");
    let mut completed = 0;
    let mut failed = 0;
    let mut pending = 0;
    let mut latency_total_ms = 0.0;

    for handle in handles {
        let remaining = timeout.saturating_sub(bench_start.elapsed());
        match tokio::time::timeout(remaining, handle).await {
            Ok(Ok((true, ms))) => {
                completed += 1;
                latency_total_ms += ms;
            }
            Ok(Ok((false, ms))) => {
                failed += 1;
                latency_total_ms += ms;
            }
            Ok(Err(_)) => failed += 1,
            Err(_) => pending += 1,
        }
    }

    if pending > 0 {
        println!("⚠️  Timeout reached with {} threads outstanding", pending);
    } else {
        println!("✓ All threads completed");
    }

    let end_time = Utc::now();
    runtime.shutdown();

    let metrics = BenchmarkMetrics {
        start_time,
        end_time,
        launched: params.threads,
        completed,
        failed,
        pending,
        latency_total_ms,
    };

    // Step 3: Display report
    display_report(&metrics);

    Ok(())
}

/// Program each benchmark thread runs: a call chain followed by timer yields
fn bench_program(depth: u32, suspensions: u32, sleep_ms: u64) -> ResumeFn {
    resume_fn(move |thread| match thread.pos() {
        0 => {
            let next = thread.jump(1).call(programs::chain(depth), "chained");
            Ok(Flow::Next(next))
        }
        1 => {
            let next = thread
                .set_var("left", Val::Num(f64::from(suspensions)))
                .jump(2);
            Ok(Flow::Next(next))
        }
        2 => {
            let left = thread.get_var("left").as_num().unwrap_or(0.0);
            if left <= 0.0 {
                let chained = thread.get_var("chained");
                Ok(Flow::Next(thread.ret(chained)))
            } else {
                let next = thread
                    .set_var("left", Val::Num(left - 1.0))
                    .call(stdlib::sleep(sleep_ms), "nap");
                Ok(Flow::Next(next))
            }
        }
        pos => Err(ErrorInfo::new(
            errors::UNKNOWN_POS,
            format!("benchmark program has no position {pos}"),
        )),
    })
}

fn validate_params(params: &BenchmarkParams) -> Result<()> {
    if params.threads == 0 {
        return Err(anyhow!("Must have at least 1 thread"));
    }

    if params.depth == 0 && params.suspensions == 0 {
        return Err(anyhow!("Must specify --depth or --suspensions (or both)"));
    }

    Ok(())
}

fn parse_duration(duration_str: &str) -> Result<Duration> {
    let duration_str = duration_str.trim();

    if duration_str.ends_with("ms") {
        let ms: u64 = duration_str.trim_end_matches("ms").parse()?;
        Ok(Duration::from_millis(ms))
    } else if duration_str.ends_with('s') {
        let secs: u64 = duration_str.trim_end_matches('s').parse()?;
        Ok(Duration::from_secs(secs))
    } else if duration_str.ends_with('m') {
        let mins: u64 = duration_str.trim_end_matches('m').parse()?;
        Ok(Duration::from_secs(mins * 60))
    } else {
        Err(anyhow!("Invalid duration format. Use '60s', '5m', etc."))
    }
}

fn display_report(metrics: &BenchmarkMetrics) {
    let duration_secs = (metrics.end_time - metrics.start_time).num_milliseconds() as f64 / 1000.0;
    let finished = metrics.completed + metrics.failed;
    let throughput = if duration_secs > 0.0 {
        finished as f64 / duration_secs
    } else {
        0.0
    };
    let avg_latency = if finished > 0 {
        metrics.latency_total_ms / finished as f64
    } else {
        0.0
    };

    println!("\n");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📊 Benchmark Results");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("⏱️  Duration: {:.2}s", duration_secs);
    println!();
    println!("📋 Work:");
    println!("   Launched: {}", metrics.launched);
    println!("   Completed: {}", metrics.completed);
    println!("   Failed: {}", metrics.failed);
    println!("   Pending: {}", metrics.pending);
    println!();
    println!("🚀 Throughput: {:.1} threads/sec", throughput);
    println!();
    println!("📈 Average Latency: {:.1}ms", avg_latency);
    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
