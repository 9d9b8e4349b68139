#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::cast_precision_loss)]

use std::sync::Once;

use chainmap::{DEFAULT_CAPACITY, HashTable};
use env_logger::Builder;
use log::{LevelFilter, info};
use plotters::prelude::*;
use rand::Rng;

// Fill levels to profile, as multiples of the entries a table needs for its first rehash
const FILL_STEPS: usize = 12;
const ENTRIES_PER_STEP: usize = 2_500;

static INIT: Once = Once::new();

fn initialize_logger() {
    INIT.call_once_force(|_| {
        let mut builder = Builder::new();

        builder
            .filter_level(LevelFilter::Info)
            .filter_module("chainmap", LevelFilter::Info)
            .format_timestamp_millis()
            .parse_default_env();

        if builder.try_init().is_err() {
            eprintln!("logger already initialized");
        }
    });
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    entries: usize,
    capacity: usize,
    longest_chain: usize,
    mean_chain: f64,
    empty_ratio: f64,
}

fn profile(table: &HashTable<u64, u64>) -> Sample {
    let lengths: Vec<usize> = table.chain_lengths().collect();
    let occupied = lengths.iter().filter(|&&len| len > 0).count();
    let empty = lengths.len().saturating_sub(occupied);

    Sample {
        entries: table.len(),
        capacity: table.capacity(),
        longest_chain: table.longest_chain(),
        mean_chain: if occupied == 0 { 0.0 } else { table.len() as f64 / occupied as f64 },
        empty_ratio: empty as f64 / lengths.len().max(1) as f64,
    }
}

fn plot(samples: &[Sample], path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_entries = samples.iter().map(|s| s.entries).max().unwrap_or(1);
    let max_chain = samples.iter().map(|s| s.longest_chain).max().unwrap_or(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption("Chain lengths while filling a table", ("sans-serif", 35))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0..max_entries, 0.0..max_chain)?;

    chart
        .configure_mesh()
        .x_desc("Entries inserted")
        .y_desc("Chain length")
        .draw()?;

    let longest = ShapeStyle::from(&RGBColor(220, 50, 50)).stroke_width(2);
    let mean = ShapeStyle::from(&RGBColor(50, 90, 220)).stroke_width(2);

    chart.draw_series(LineSeries::new(
        samples.iter().map(|s| (s.entries, s.longest_chain as f64)),
        longest,
    ))?;
    chart.draw_series(LineSeries::new(samples.iter().map(|s| (s.entries, s.mean_chain)), mean))?;
    chart.draw_series(
        samples.iter().map(|s| Circle::new((s.entries, s.longest_chain as f64), 4, longest.filled())),
    )?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    initialize_logger();

    let mut rng = rand::rng();
    let mut table = HashTable::new(DEFAULT_CAPACITY);
    let mut samples = Vec::with_capacity(FILL_STEPS);

    for step in 1..=FILL_STEPS {
        let target = step.saturating_mul(ENTRIES_PER_STEP);
        while table.len() < target {
            let key: u64 = rng.random();
            table.insert((key, key));
        }

        let sample = profile(&table);
        info!(
            "{} entries: {} buckets, longest chain {}, mean chain {:.2}, {:.1}% buckets empty",
            sample.entries,
            sample.capacity,
            sample.longest_chain,
            sample.mean_chain,
            sample.empty_ratio * 100.0
        );
        samples.push(sample);
    }

    plot(&samples, "chain_profile.svg")?;
    info!("Generated plot image: chain_profile.svg");

    Ok(())
}
