use comfy_table::{Table, presets::UTF8_FULL};

use crate::response::OptimizeResponse;

/// Renders an [`OptimizeResponse`] as two tables: the per-hour schedule and
/// the horizon totals.
///
/// Grounded on `fennec-cli/src/core/solution/summary.rs` /
/// `core/solution/metrics.rs`'s `comfy_table::Table` construction style.
#[must_use]
pub fn render_schedule(response: &OptimizeResponse) -> String {
    let mut schedule = Table::new();
    schedule.load_preset(UTF8_FULL);
    schedule.set_header(vec!["hour", "pv", "load", "grid import", "grid export", "battery soc"]);

    for (hour, trace) in response.trace.hours.iter().enumerate() {
        schedule.add_row(vec![
            hour.to_string(),
            trace.pv_wh.to_string(),
            trace.load_wh.to_string(),
            trace.grid_import_wh.to_string(),
            trace.grid_export_wh.to_string(),
            trace.soc_after_pct.to_string(),
        ]);
    }

    let mut totals = Table::new();
    totals.load_preset(UTF8_FULL);
    totals.set_header(vec!["metric", "value"]);
    totals.add_row(vec!["status".to_owned(), format!("{:?}", response.status)]);
    totals.add_row(vec!["generations run".to_owned(), response.generations_run.to_string()]);
    totals.add_row(vec!["grid import".to_owned(), response.trace.totals.grid_import_wh.to_string()]);
    totals.add_row(vec!["grid export".to_owned(), response.trace.totals.grid_export_wh.to_string()]);
    totals.add_row(vec!["conversion loss".to_owned(), response.trace.totals.conversion_loss_wh.to_string()]);
    totals.add_row(vec!["total cost".to_owned(), response.total_cost.to_string()]);

    format!("{schedule}\n{totals}")
}
