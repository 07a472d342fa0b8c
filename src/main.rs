//! Toroidal Life CLI - Stream generations from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use toroidal_life::{
    ChangeSet,
    schema::{LifeConfig, Seed},
    worker::{ModelInWorker, ProxyError},
};

const WAIT: Duration = Duration::from_secs(30);

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [generations] [randomize_every]", args[0]);
        eprintln!();
        eprintln!("Stream Game of Life generations from a worker thread.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json      Path to life configuration file");
        eprintln!("  generations      Number of generations to pull (default: 100)");
        eprintln!("  randomize_every  Re-randomize every N generations (default: never)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let generations: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let randomize_every: Option<u64> = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .filter(|&n| n > 0);

    let config = LifeConfig::from_path(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    // Load or create seed
    let seed_path = config_path.with_extension("seed.json");
    let seed: Seed = if seed_path.exists() {
        let seed_str = std::fs::read_to_string(&seed_path).unwrap_or_else(|e| {
            eprintln!("Error reading seed file: {}", e);
            std::process::exit(1);
        });
        serde_json::from_str(&seed_str).unwrap_or_else(|e| {
            eprintln!("Error parsing seed: {}", e);
            std::process::exit(1);
        })
    } else {
        Seed::default()
    };

    println!("Toroidal Life");
    println!("=============");
    println!("Grid: {}x{} ({} cells)", config.cols, config.rows, config.size());
    println!(
        "Batching: prefetch {}, low water {}",
        config.prefetch, config.low_water
    );
    println!("Generations: {}", generations);
    println!();

    let values = seed.generate(config.cols, config.rows).unwrap_or_else(|e| {
        eprintln!("Error in seed: {}", e);
        std::process::exit(1);
    });
    let mut proxy = ModelInWorker::new(&config, values).unwrap_or_else(|e| {
        eprintln!("Error starting worker: {}", e);
        std::process::exit(1);
    });

    let tally = Rc::new(Tally::default());
    let t = Rc::clone(&tally);
    proxy.changed().tap(move |changes: &ChangeSet| t.record(changes));

    // Pull the initial population first so progress counts generations only.
    if let Err(e) = proxy.next_blocking(WAIT) {
        worker_failed(&proxy, e);
    }
    println!("Initial population: {}", tally.population.get());
    println!();

    println!("Streaming...");
    let start = Instant::now();

    for i in 0..generations {
        if let Err(e) = proxy.next_blocking(WAIT) {
            worker_failed(&proxy, e);
        }

        // Print progress every 10%
        if (i + 1) % (generations / 10).max(1) == 0 {
            let elapsed = start.elapsed().as_secs_f32();
            println!(
                "  Generation {}/{}: population={}, born={}, died={}, buffered={}, {:.1} gen/s",
                i + 1,
                generations,
                tally.population.get(),
                tally.born.get(),
                tally.died.get(),
                proxy.buffered(),
                (i + 1) as f32 / elapsed
            );
        }

        if let Some(every) = randomize_every {
            if (i + 1) % every == 0 && i + 1 < generations {
                println!("  Randomizing (epoch {})", proxy.epoch() + 1);
                if let Err(e) = proxy.randomize() {
                    worker_failed(&proxy, e);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("Final population: {}", tally.population.get());
    println!(
        "Totals: born={}, died={}, still generations={}",
        tally.born.get(),
        tally.died.get(),
        tally.still.get()
    );
    println!(
        "Time: {:.2}s ({:.1} gen/s)",
        elapsed.as_secs_f32(),
        generations as f32 / elapsed.as_secs_f32()
    );
}

/// Running totals over every delivered change-set.
#[derive(Default)]
struct Tally {
    population: Cell<i64>,
    born: Cell<u64>,
    died: Cell<u64>,
    still: Cell<u64>,
}

impl Tally {
    fn record(&self, changes: &ChangeSet) {
        self.population
            .set(self.population.get() + changes.population_delta());
        self.born.set(self.born.get() + changes.born.len() as u64);
        self.died.set(self.died.get() + changes.died.len() as u64);
        if changes.is_still() {
            self.still.set(self.still.get() + 1);
        }
    }
}

fn worker_failed(proxy: &ModelInWorker, e: ProxyError) -> ! {
    eprintln!("Worker failed: {}", e);
    if proxy.is_closed() {
        eprintln!("Compute host stopped (run with RUST_LOG=error for details)");
    }
    std::process::exit(1);
}

fn print_example_config() {
    let config = LifeConfig::default();
    let seed = Seed::default();

    println!("Example configuration (config.json):");
    println!("{}", serde_json::to_string_pretty(&config).unwrap());
    println!();
    println!("Example seed (config.seed.json):");
    println!("{}", serde_json::to_string_pretty(&seed).unwrap());
}
