use lexi_hub::ImportProgress;

/// Ceiling of the indeterminate estimate; only success reports 100
pub const INDETERMINATE_CEILING: f32 = 95.0;

/// Entries after which the indeterminate estimate is half way to the ceiling
const HALF_WAY_ENTRIES: f64 = 10_000.0;

/// Turns import snapshots into a single monotone percentage.
///
/// With a known total, network and parser fractions weigh half each.
/// Without one, the estimate creeps toward [`INDETERMINATE_CEILING`] as
/// entries are committed.
#[derive(Debug, Default)]
pub struct ProgressBlender {
    last: f32,
}

impl ProgressBlender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, progress: &ImportProgress) -> f32 {
        let estimate = match progress.total_bytes.filter(|t| *t > 0) {
            Some(total) => {
                let network = (progress.bytes_read as f64 / total as f64).min(1.0);
                let parsed = (progress.bytes_parsed as f64 / total as f64).min(1.0);
                // the last step to 100 is reserved for the committed end
                ((network * 0.5 + parsed * 0.5) * 100.0).min(99.0) as f32
            }
            None => {
                let committed = progress.entries_committed as f64;
                (INDETERMINATE_CEILING as f64 * committed / (committed + HALF_WAY_ENTRIES)) as f32
            }
        };
        self.last = self.last.max(estimate);
        self.last
    }
}

/// Status line shown next to the percentage
pub fn status_message(progress: &ImportProgress) -> String {
    match progress.total_bytes {
        Some(total) if progress.bytes_read < total => format!(
            "Downloading {} / {} KiB, {} words imported",
            progress.bytes_read / 1024,
            total / 1024,
            progress.entries_committed
        ),
        Some(_) => format!("Importing, {} words so far", progress.entries_committed),
        None => format!(
            "Downloading {} KiB, {} words imported",
            progress.bytes_read / 1024,
            progress.entries_committed
        ),
    }
}
