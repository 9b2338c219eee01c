//! Benchmarks for attribution table rendering.
//! Run with: cargo bench

use funnel_core::config::ExportFormat;
use funnel_core::types::{AttributionRow, StageKey};
use funnel_reporting::export::export;
use funnel_reporting::{AttributionTable, RowAccessors, TableProps};

fn create_dataset(rows: usize) -> Vec<AttributionRow> {
    (0..rows)
        .map(|i| {
            let scale = (i % 97) as f64;
            AttributionRow::new(format!("campaign-{:05}", i))
                .with_cost(250.0 + scale * 40.0)
                .with_metric("webVisits", scale * 30.0)
                .with_metric("MCL", scale * 3.0)
                .with_metric("influencedMCL", scale * 7.0)
                .with_metric("MQL", scale)
                .with_metric("SQL", (scale / 2.0).floor())
                .with_metric("opps", (scale / 5.0).floor())
                .with_metric("pipeline", scale * 1_500.0)
                .with_metric("users", (scale / 10.0).floor())
                .with_metric("revenue", scale * 900.0)
                .with_metric("LTV", scale * 2_700.0)
        })
        .collect()
}

fn main() {
    let data = create_dataset(10_000);
    let props = TableProps::new("Campaign", RowAccessors).default_stage(StageKey::Opps);
    let mut table = AttributionTable::new(&data, props);

    // Warmup
    for _ in 0..3 {
        table.render().unwrap();
    }

    let iterations: u32 = 50;
    let start = std::time::Instant::now();
    let mut rendered_rows = 0;

    for i in 0..iterations {
        table.select_stage(StageKey::ALL[i as usize % StageKey::ALL.len()]);
        rendered_rows += table.render().unwrap().rows.len();
    }

    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations;

    println!("=== Table Render Benchmark ===");
    println!("Dataset rows: {}", data.len());
    println!("Iterations:   {}", iterations);
    println!("Total time:   {:?}", elapsed);
    println!("Per render:   {:?}", per_iter);
    println!("Rows/sec:     {:.0}", rendered_rows as f64 / elapsed.as_secs_f64());

    let view = table.render().unwrap();
    let start = std::time::Instant::now();
    let csv = export(&view, ExportFormat::Csv, true).unwrap();
    println!("CSV export:   {:?} ({} bytes)", start.elapsed(), csv.len());
}
