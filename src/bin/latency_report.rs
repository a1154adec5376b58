use clap::Parser;
use hdrhistogram::Histogram;
use std::time::Instant;
use tandem_lob::{Command, Engine, Order};

#[derive(Parser, Debug)]
#[command(name = "latency-report", about = "Per-command latency histogram")]
struct Args {
    /// Commands to time
    #[arg(short, long, default_value_t = 1_000_000)]
    iterations: u64,

    /// Pre-allocated order slots
    #[arg(long, default_value_t = 100_000)]
    capacity: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    println!("Preparing Latency Benchmark...");

    let mut engine = Engine::new(args.capacity);
    engine.warm_up();

    let mut histogram = Histogram::<u64>::new_with_bounds(1, 100_000, 3)?;

    println!("Running {} iterations...", args.iterations);

    let mut total_duration = std::time::Duration::new(0, 0);

    for order_id in 1..=args.iterations {
        // Every tenth command cancels an older order; the rest alternate
        // sides over a 100-tick band so roughly half of them cross.
        let cmd = if order_id % 10 == 0 {
            Command::CancelOrder(order_id - 5)
        } else if order_id % 2 == 0 {
            Command::AddOrder(Order::buy(order_id, 10_000 + (order_id % 100), 10))
        } else {
            Command::AddOrder(Order::sell(order_id, 10_000 + (order_id % 100), 10))
        };

        let start = Instant::now();
        std::hint::black_box(engine.process_command(cmd));
        let elapsed = start.elapsed();

        // Outliers above the histogram bound are dropped rather than panicking
        histogram.record(elapsed.as_nanos() as u64).unwrap_or(());
        total_duration += elapsed;
    }

    println!("\n=== Latency Report (ns) ===");
    println!("Total Ops:  {}", args.iterations);
    println!("Throughput: {:.2} ops/sec", args.iterations as f64 / total_duration.as_secs_f64());
    println!("---------------------------");
    println!("Min:    {:6} ns", histogram.min());
    println!("P50:    {:6} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:6} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:6} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:6} ns", histogram.value_at_quantile(0.999));
    println!("P99.99: {:6} ns", histogram.value_at_quantile(0.9999));
    println!("Max:    {:6} ns", histogram.max());
    println!("---------------------------");
    println!("Live orders: {}", engine.order_count());
    println!("Trades:      {}", engine.trades().total_recorded());

    println!("\nDistribution:");
    for v in histogram.iter_log(100_000, 2.0) {
        let count = v.count_since_last_iteration();
        if count > 0 {
            println!("<= {:6} ns: {:10} count", v.value_iterated_to(), count);
        }
    }

    Ok(())
}
