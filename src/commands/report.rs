use crate::commands::Out;
use crate::store::Store;
use crate::view::{view_of, DashboardView};
use crate::{Config, Result};
use std::fmt::Write;

/// Reads the data file and computes the dashboard. The message holds the summary cards and the
/// structure holds the whole view.
pub async fn report(config: Config) -> Result<Out<DashboardView>> {
    let records = config.store().read_all().await?;
    let view = view_of(&records);
    Ok(Out::new(summary_text(&view), view))
}

fn summary_text(view: &DashboardView) -> String {
    let mut s = format!("{} records", view.rows.len());
    if view.dropped_rows > 0 {
        let _ = write!(s, " ({} unreadable rows skipped)", view.dropped_rows);
    }
    let summary = &view.summary;
    let _ = write!(
        s,
        "\n  Total sales:    {}\n  Total expenses: {}\n  Net profit:     {}\n  Profit margin:  {}",
        summary.total_sales, summary.total_expenses, summary.net_profit, summary.profit_margin
    );
    for point in &view.monthly {
        let _ = write!(
            s,
            "\n  {}: sales {}, expenses {}, profit {}",
            point.month.format("%Y-%m"),
            point.sales,
            point.expenses,
            point.profit
        );
    }
    s
}
