//! 📊 progress.rs: "Are we there yet?" for full syncs, plus the end-of-run scoreboard.
//!
//! A full sync walks every service id. [`SyncProgress`] draws an indicatif bar with a
//! comfy-table message (rate, elapsed, remaining, the counters so far).
//! [`metrics_table`] renders a [`MetricsSnapshot`] on its own for the CLI to print.
//!
//! ⚠️ Watching the bar will not make it go faster. 🦆

use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING, presets::UTF8_FULL};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::metrics::MetricsSnapshot;

/// 🔢 `1234567` → `1,234,567`.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ MM:SS, or HH:MM:SS for the long hauls.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// 🍽️ Two-column scoreboard of every counter.
pub fn metrics_table(snapshot: &MetricsSnapshot) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["metric", "records"]);
    for (name, value) in snapshot.rows() {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format_number(value)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// 📊 Progress bar for a full sync over a known number of records.
pub struct SyncProgress {
    total: u64,
    done: u64,
    progress_bar: ProgressBar,
    start_time: Instant,
}

impl std::fmt::Debug for SyncProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 🎭 ProgressBar doesn't derive Debug
        f.debug_struct("SyncProgress")
            .field("total", &self.total)
            .field("done", &self.done)
            .finish()
    }
}

impl SyncProgress {
    pub fn new(total: u64) -> Self {
        let progress_bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar().template("{msg}\n| [{bar:40.cyan/blue}] {pos}/{len}") {
            progress_bar.set_style(style.progress_chars("=>-"));
        }
        Self {
            total,
            done: 0,
            progress_bar,
            start_time: Instant::now(),
        }
    }

    /// 🙈 Same bookkeeping, nothing drawn. For tests and `--json-logs` runs.
    pub fn hidden(total: u64) -> Self {
        let progress = Self::new(total);
        progress.progress_bar.set_draw_target(ProgressDrawTarget::hidden());
        progress
    }

    pub fn done(&self) -> u64 {
        self.done
    }

    /// 🔄 One more record through the pipe.
    pub fn advance(&mut self, snapshot: &MetricsSnapshot) {
        self.done += 1;
        self.render(snapshot);
        self.progress_bar.set_position(self.done);
    }

    pub fn finish(&self) {
        self.progress_bar.finish();
    }

    fn render(&self, snapshot: &MetricsSnapshot) {
        let elapsed = self.start_time.elapsed();
        let per_sec = if elapsed.as_secs_f64() > 0.0 {
            self.done as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let remaining = if per_sec > 0.0 && self.total > self.done {
            format_duration(Duration::from_secs_f64((self.total - self.done) as f64 / per_sec))
        } else {
            "--:--".to_string()
        };

        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.add_row(vec![
            Cell::new(format!("{:.1} records/s", per_sec)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} records", format_number(self.done))).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} inserted", format_number(snapshot.inserted))).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} updated", format_number(snapshot.updated))).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} skipped", format_number(snapshot.skipped))).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} errored", format_number(snapshot.errored))).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} elapsed", format_duration(elapsed))).set_alignment(CellAlignment::Right),
            Cell::new(format!("{remaining} remaining")).set_alignment(CellAlignment::Right),
        ]);
        self.progress_bar.set_message(format!("full sync\n{table}"));
    }
}
