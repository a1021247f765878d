// src/export.rs
use std::io::Write;

use rust_decimal::Decimal;

use crate::grid::GridState;

/// Writes the displayed week as CSV: one record per non-blank task row with
/// the seven day columns and a row total, then a per-day totals footer.
pub fn write_week_csv<W: Write>(grid: &GridState, out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["Task".to_string()];
    header.extend(grid.week.dates().map(|date| date.to_string()));
    header.push("Total".to_string());
    writer.write_record(&header)?;

    for row in &grid.rows {
        if row.is_blank() {
            continue;
        }
        let mut record = vec![row.task_name.clone()];
        let mut row_total = Decimal::ZERO;
        for date in grid.week.dates() {
            let hours = row.hours_on(date);
            row_total += hours;
            record.push(hours.to_string());
        }
        record.push(row_total.to_string());
        writer.write_record(&record)?;
    }

    let mut footer = vec!["Daily total".to_string()];
    let mut week_total = Decimal::ZERO;
    for date in grid.week.dates() {
        let total = grid.day_total(date);
        week_total += total;
        footer.push(total.to_string());
    }
    footer.push(week_total.to_string());
    writer.write_record(&footer)?;

    writer.flush()?;
    Ok(())
}
