use std::time::Instant;

use crate::config::{Config, EmptyQueryPolicy};
use crate::model::{Catalog, Entry};
use crate::search::MatchPipeline;

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

#[test]
fn warm_prefix_match_p95_under_15ms() {
    let mut entries: Vec<Entry> = (0..10_000)
        .map(|i| Entry::new(vec![format!("Document {i:05}"), format!("doc{i:05}")]).unwrap())
        .collect();
    entries.push(Entry::new(vec!["Quarterly Report", "q4"]).unwrap());
    let catalog = Catalog::new(entries, Vec::new());

    let cfg = Config {
        max_results: 20,
        empty_query: EmptyQueryPolicy::ShowNone,
        ..Config::default()
    };
    let mut pipeline = MatchPipeline::from_config(&cfg);

    for _ in 0..30 {
        let _ = pipeline.match_local("q4", &catalog);
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(80);
        for _ in 0..80 {
            let start = Instant::now();
            let matches = pipeline.match_local("q4", &catalog);
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
            assert_eq!(matches.len(), 1);
        }
        batch_p95.push(p95_ms(&mut samples));
    }

    batch_p95.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_p95 = batch_p95[batch_p95.len() / 2];

    assert!(
        median_p95 <= 15.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 15.0ms); batches={batch_p95:?}",
    );
}
