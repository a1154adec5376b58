//! Two-thread stress run: a producer floods the channel with resting buys,
//! cancels every even ID, then sends one large sell that sweeps the rest.

use std::thread;

use clap::Parser;
use tandem_lob::{channel, Command, Engine, EngineConfig, Order, TradePricing};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stress", about = "Producer/consumer stress run of the matching engine")]
struct Args {
    /// Number of resting buy orders
    #[arg(short, long, default_value_t = 1000)]
    orders: u64,

    /// Price for every order
    #[arg(long, default_value_t = 100)]
    price: u64,

    /// Quantity of each buy order
    #[arg(long, default_value_t = 10)]
    qty: u32,

    /// Skip the cancel pass over even IDs
    #[arg(long, default_value_t = false)]
    no_cancel: bool,

    /// Command channel capacity
    #[arg(long, default_value_t = 2048)]
    channel_capacity: usize,

    /// Trade log capacity
    #[arg(long, default_value_t = 2048)]
    trade_log_capacity: usize,

    /// Price trades at the earlier-resting order instead of the ask
    #[arg(long, default_value_t = false)]
    passive_pricing: bool,

    /// Pin the engine thread to the last CPU core
    #[arg(long, default_value_t = false)]
    pin: bool,

    /// Log level
    #[arg(short = 'l', long, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = EngineConfig {
        channel_capacity: args.channel_capacity,
        trade_log_capacity: args.trade_log_capacity,
        pricing: if args.passive_pricing {
            TradePricing::Passive
        } else {
            TradePricing::AskPrice
        },
        pin_to_core: args.pin,
        ..EngineConfig::default()
    };
    config.validate()?;
    tracing::info!(?config, "starting stress run");

    let (mut tx, mut rx) = channel::<Command>(config.channel_capacity);
    let (orders, price, qty, cancel) = (args.orders, args.price, args.qty, !args.no_cancel);

    let producer = thread::spawn(move || {
        for id in 1..=orders {
            tx.push_spin(Command::AddOrder(Order::buy(id, price, qty)));
        }
        if cancel {
            for id in (2..=orders).step_by(2) {
                tx.push_spin(Command::CancelOrder(id));
            }
        }
        let sweep_qty = u32::try_from(orders.div_ceil(2) * qty as u64).unwrap_or(u32::MAX);
        tx.push_spin(Command::AddOrder(Order::sell(u64::MAX, price, sweep_qty)));
        tracing::info!("producer finished");
    });

    let consumer = thread::spawn(move || {
        let mut engine = Engine::with_config(&config);
        let summary = engine.run(&mut rx);
        (engine, summary)
    });

    producer.join().map_err(|_| "producer thread panicked")?;
    let (engine, summary) = consumer.join().map_err(|_| "engine thread panicked")?;

    let stats = engine.stats();
    println!("\n--- Final Order Book State ---");
    println!("==============================");
    println!(" Bid Levels:  {}", stats.bid_levels);
    println!(" Ask Levels:  {}", stats.ask_levels);
    println!(" Live Orders: {}", stats.live_orders);
    println!(" Trades:      {}", engine.trades().total_recorded());
    println!("==============================");
    println!("Processed {} commands in {:?}", summary.commands, summary.elapsed);
    if let Some(avg) = summary.avg_latency_ns() {
        println!("Avg latency: {} ns/command", avg);
    }
    println!("Throughput:  {:.0} commands/sec", summary.throughput());

    Ok(())
}
