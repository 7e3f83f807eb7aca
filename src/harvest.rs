use std::collections::BTreeMap;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::fetcher::DocumentSource;
use crate::parser::{self, ident::IdRegistry};
use crate::store::Record;
use crate::targets::Target;

pub struct HarvestOptions {
    /// Stop once this many new records were accepted.
    pub limit: Option<usize>,
    /// Pause after each processed document.
    pub throttle: Duration,
    /// Pause after a failed fetch.
    pub error_pause: Duration,
}

/// Harvest stats returned after completion.
#[derive(Debug, Default)]
pub struct HarvestStats {
    pub targets: usize,
    pub fetched: usize,
    pub failed: usize,
    pub tables: usize,
    pub rows: usize,
    pub rejected: BTreeMap<&'static str, usize>,
    pub limit_reached: bool,
}

pub struct HarvestRun {
    pub records: Vec<Record>,
    pub stats: HarvestStats,
}

/// Fetch and process targets one at a time, in order.
///
/// A failed fetch is reported and skipped. `ids` must hold every id already
/// in the dataset; accepted ids are added to it as the run goes.
pub async fn harvest<S: DocumentSource>(
    source: &S,
    targets: &[Target],
    ids: &mut IdRegistry,
    opts: &HarvestOptions,
) -> HarvestRun {
    let limit = opts.limit.filter(|&n| n > 0);
    let mut records: Vec<Record> = Vec::new();
    let mut stats = HarvestStats {
        targets: targets.len(),
        ..Default::default()
    };

    let pb = ProgressBar::new(targets.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }

    for target in targets {
        pb.set_message(target.title.clone());

        let markup = match source.fetch_markup(&target.title).await {
            Ok(markup) => markup,
            Err(e) => {
                warn!("Fetch failed for {}: {}", target.title, e);
                stats.failed += 1;
                pb.inc(1);
                tokio::time::sleep(opts.error_pause).await;
                continue;
            }
        };
        stats.fetched += 1;

        let budget = limit.map(|n| n.saturating_sub(records.len()));
        let doc = parser::process_document(&markup, &target.classifier_hint(), ids, budget);
        info!(
            "{}: {} table(s), {} row(s), {} new",
            target.title,
            doc.tables,
            doc.rows,
            doc.records.len()
        );

        stats.tables += doc.tables;
        stats.rows += doc.rows;
        for reason in &doc.rejections {
            *stats.rejected.entry(reason.kind()).or_default() += 1;
        }
        records.extend(doc.records);
        pb.inc(1);

        tokio::time::sleep(opts.throttle).await;

        if limit.is_some_and(|n| records.len() >= n) {
            stats.limit_reached = true;
            break;
        }
    }

    pb.finish_and_clear();
    info!(
        "Harvested {} record(s) from {} document(s) ({} failed)",
        records.len(),
        stats.fetched,
        stats.failed
    );

    HarvestRun { records, stats }
}
