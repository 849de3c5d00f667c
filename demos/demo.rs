//! Demo application: a simulated gateway reporting its counters periodically.
//!
//! Run with:
//! ```bash
//! cargo run --example demo --features demo -- --help
//! ```

use clap::{Parser, ValueEnum};
use categorie::category::{Category, CounterDescriptor, CounterSet};
use categorie::counters::composite::CompositeCounter;
use categorie::counters::delta::Delta;
use categorie::counters::elapsed_time::{ElapsedTime, ElapsedTimeUnit};
use categorie::counters::mean_average::MeanAverage;
use categorie::counters::median_average::MedianAverage;
use categorie::counters::moving_average::MovingAverage;
use categorie::counters::observed_value::{ObservationType, ObservedValue};
use categorie::counters::rate_per_second::RatePerSecond;
use categorie::counters::sum_total::SumTotal;
use categorie::counters::{Counter, Increment, SyncRoot};
use categorie::factory::CategoryFactory;
use categorie::monitor::Observer;
use categorie::observers::json::JsonObserver;
use categorie::observers::table::{CompactSeparator, TableObserver, TableStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Output format for snapshots.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Pretty table (standard two-column format)
    Table,
    /// Compact table with multiple columns
    Compact,
    /// JSON lines
    Json,
}

/// Table style selection.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum StyleChoice {
    Ascii,
    #[default]
    Rounded,
    Sharp,
    Modern,
    Markdown,
    Blank,
}

impl From<StyleChoice> for TableStyle {
    fn from(choice: StyleChoice) -> Self {
        match choice {
            StyleChoice::Ascii => TableStyle::Ascii,
            StyleChoice::Rounded => TableStyle::Rounded,
            StyleChoice::Sharp => TableStyle::Sharp,
            StyleChoice::Modern => TableStyle::Modern,
            StyleChoice::Markdown => TableStyle::Markdown,
            StyleChoice::Blank => TableStyle::Blank,
        }
    }
}

/// Separator style for compact table format.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum SeparatorChoice {
    #[default]
    Colon,
    Equals,
    Arrow,
}

impl From<SeparatorChoice> for CompactSeparator {
    fn from(choice: SeparatorChoice) -> Self {
        match choice {
            SeparatorChoice::Colon => CompactSeparator::Colon,
            SeparatorChoice::Equals => CompactSeparator::Equals,
            SeparatorChoice::Arrow => CompactSeparator::Arrow,
        }
    }
}

/// Demo application for categorie - counters grouped into monitored categories.
///
/// Simulates gateway traffic on a few threads while the category monitor
/// prints a snapshot at every interval.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Table style (for table/compact formats)
    #[arg(short, long, value_enum, default_value = "rounded")]
    style: StyleChoice,

    /// Number of columns (for compact format)
    #[arg(short, long, default_value = "3")]
    columns: usize,

    /// Separator style (for compact format)
    #[arg(long, value_enum, default_value = "colon")]
    separator: SeparatorChoice,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Include category name and timestamp in JSON output
    #[arg(long)]
    timestamp: bool,

    /// Add a title to the output (table formats)
    #[arg(long)]
    title: Option<String>,

    /// Hide header in standard table mode
    #[arg(long)]
    no_header: bool,

    /// Category instance name
    #[arg(long, default_value = "Demo.Gateway")]
    name: String,

    /// Number of threads generating traffic
    #[arg(long, default_value = "4")]
    threads: usize,

    /// Snapshot interval in milliseconds
    #[arg(short, long, default_value = "1000")]
    interval: u64,

    /// How long to run, in seconds
    #[arg(short, long, default_value = "5")]
    duration: u64,

    /// Reset the category after every snapshot
    #[arg(long)]
    reset: bool,
}

/// Counters of the simulated gateway.
struct Gateway {
    in_total: Arc<SumTotal>,
    in_per_sec: RatePerSecond,
    out_total: Arc<SumTotal>,
    pending: Delta,
    errors_total: Arc<SumTotal>,
    calls_per_error: MeanAverage,
    latency: CompositeCounter,
    latency_ms: Arc<MovingAverage>,
    peak_latency_ms: Arc<ObservedValue>,
    payload_median: MedianAverage,
    uptime: ElapsedTime,
}

impl CounterSet for Gateway {
    fn create(_name: &str) -> Self {
        let lock = SyncRoot::new();
        let in_total = Arc::new(SumTotal::with_lock(lock.clone()));
        let out_total = Arc::new(SumTotal::with_lock(lock.clone()));
        let errors_total = Arc::new(SumTotal::with_lock(lock.clone()));
        let latency_ms = Arc::new(MovingAverage::with_capacity(32));
        let peak_latency_ms = Arc::new(ObservedValue::new(ObservationType::Maximum));

        Gateway {
            in_per_sec: RatePerSecond::with_numerator(in_total.clone(), lock.clone()),
            pending: Delta::from_counters(in_total.clone(), out_total.clone(), lock.clone()),
            calls_per_error: MeanAverage::from_counters(in_total.clone(), errors_total.clone(), lock),
            latency: CompositeCounter::with_counters([
                latency_ms.clone() as Arc<dyn Counter>,
                peak_latency_ms.clone() as Arc<dyn Counter>,
            ]),
            payload_median: MedianAverage::new(),
            uptime: ElapsedTime::with_unit(ElapsedTimeUnit::Seconds),
            in_total,
            out_total,
            errors_total,
            latency_ms,
            peak_latency_ms,
        }
    }

    fn descriptors() -> Vec<CounterDescriptor<Self>> {
        vec![
            CounterDescriptor::new("InTotal", |g| &*g.in_total),
            CounterDescriptor::new("InPerSec", |g| &g.in_per_sec),
            CounterDescriptor::new("OutTotal", |g| &*g.out_total),
            CounterDescriptor::new("PendingCount", |g| &g.pending),
            CounterDescriptor::new("ErrorsTotal", |g| &*g.errors_total),
            CounterDescriptor::new("CallsPerError", |g| &g.calls_per_error),
            CounterDescriptor::new("LatencyMs", |g| &*g.latency_ms),
            CounterDescriptor::new("PeakLatencyMs", |g| &*g.peak_latency_ms),
            CounterDescriptor::new("PayloadMedian", |g| &g.payload_median),
            CounterDescriptor::new("UptimeSec", |g| &g.uptime),
        ]
    }
}

impl Gateway {
    fn handle(&self, payload: i64, fail: bool) {
        let started = Instant::now();
        self.in_total.increment_one();
        self.payload_median.increment(payload);

        // pretend to do some work
        thread::sleep(Duration::from_millis((payload % 7) as u64));

        if fail {
            self.errors_total.increment_one();
        } else {
            self.out_total.increment_one();
        }
        self.latency.increment_elapsed(started);
    }
}

/// Simulates traffic until `stop` is raised.
fn simulate_traffic(
    gateway: &Arc<Category<Gateway>>,
    num_threads: usize,
    stop: &Arc<AtomicBool>,
) -> Vec<thread::JoinHandle<()>> {
    (0..num_threads)
        .map(|i| {
            let gateway = Arc::clone(gateway);
            let stop = Arc::clone(stop);
            thread::spawn(move || {
                let mut j: i64 = 0;
                while !stop.load(Ordering::Relaxed) {
                    let payload = 64 + (j * 37 + i as i64 * 11) % 960;
                    // ~5% error rate
                    gateway.handle(payload, j % 20 == 0);
                    j += 1;
                }
            })
        })
        .collect()
}

/// Builds the observer for the requested output format.
fn build_observer(args: &Args) -> Observer {
    match args.format {
        OutputFormat::Table => {
            let mut observer = TableObserver::new()
                .with_style(args.style.into())
                .with_header(!args.no_header);

            if let Some(ref title) = args.title {
                observer = observer.with_title(title.clone());
            }
            observer.into_observer(std::io::stdout())
        }

        OutputFormat::Compact => {
            let mut observer = TableObserver::new()
                .compact(true)
                .columns(args.columns)
                .separator(args.separator.into())
                .with_style(args.style.into());

            if let Some(ref title) = args.title {
                observer = observer.with_title(title.clone());
            }
            observer.into_observer(std::io::stdout())
        }

        OutputFormat::Json => JsonObserver::new()
            .pretty(args.pretty)
            .wrap_in_snapshot(args.timestamp)
            .include_timestamp(args.timestamp)
            .into_observer(std::io::stdout()),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let gateway = match CategoryFactory::global().get_instance::<Gateway>(&args.name) {
        Ok(gateway) => gateway,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let observer = build_observer(&args);
    if let Err(e) = gateway
        .monitor()
        .add_observer(&observer, Duration::from_millis(args.interval))
    {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let resetter = args.reset.then(|| {
        let weak = Arc::downgrade(&gateway);
        let resetter = Observer::new(move |_| {
            if let Some(gateway) = weak.upgrade() {
                gateway.reset();
            }
        });
        // registered after the printer, so it runs once the snapshot is out
        if let Err(e) = gateway
            .monitor()
            .add_observer(&resetter, Duration::from_millis(args.interval))
        {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        resetter
    });

    eprintln!(
        "Simulating {} threads for {}s, reporting every {}ms...",
        args.threads, args.duration, args.interval
    );
    let stop = Arc::new(AtomicBool::new(false));
    let workers = simulate_traffic(&gateway, args.threads, &stop);

    thread::sleep(Duration::from_secs(args.duration));
    stop.store(true, Ordering::Relaxed);
    for worker in workers {
        let _ = worker.join();
    }

    gateway.monitor().shutdown();
    drop(resetter);
    eprintln!("Simulation complete.");
}
