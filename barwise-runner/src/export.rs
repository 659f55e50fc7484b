//! Export — CSV and JSON artifacts for a finished run.
//!
//! - **Table CSV**: the annotated bar table in the column naming convention
//! - **Trades CSV**: every executed action, symbol by symbol
//! - **Overview JSON**: the report overview including histories

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use barwise_core::domain::Trade;
use barwise_core::report::ReportOverview;
use barwise_core::table::BarTable;
use chrono::NaiveDateTime;

use crate::runner::BacktestResult;

fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.time() == chrono::NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Export the table with a leading `Date` column. Missing cells are empty.
pub fn export_table_csv(table: &BarTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["Date".to_string()];
    header.extend(table.keys().iter().map(ToString::to_string));
    wtr.write_record(&header)?;

    let columns: Vec<&[f64]> = table
        .keys()
        .iter()
        .filter_map(|key| table.column(key))
        .collect();
    for (row, ts) in table.index().iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(format_timestamp(ts));
        record.extend(columns.iter().map(|col| format_cell(col[row])));
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush table CSV writer")?;
    String::from_utf8(data).context("table CSV is not valid UTF-8")
}

/// Export the trade history.
///
/// Columns: timestamp, symbol, action, price, shares, money, fee, slippage
pub fn export_trades_csv(history: &BTreeMap<String, Vec<Trade>>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "timestamp",
        "symbol",
        "action",
        "price",
        "shares",
        "money",
        "fee",
        "slippage",
    ])?;

    for trades in history.values() {
        for t in trades {
            wtr.write_record([
                &format_timestamp(&t.timestamp),
                &t.symbol,
                &t.action.to_string(),
                &format!("{:.4}", t.price),
                &t.shares.to_string(),
                &format!("{:.4}", t.money),
                &format!("{:.4}", t.fee),
                &format!("{:.4}", t.slippage),
            ])?;
        }
    }

    let data = wtr.into_inner().context("failed to flush trades CSV writer")?;
    String::from_utf8(data).context("trades CSV is not valid UTF-8")
}

/// Serialize the overview to pretty JSON.
///
/// NaN statistics (e.g. an undefined Sharpe ratio) serialize as `null`.
pub fn export_overview_json(overview: &ReportOverview) -> Result<String> {
    serde_json::to_string_pretty(overview).context("failed to serialize report overview to JSON")
}

/// Write all artifacts of `result` to `dir/<fingerprint prefix>/`.
///
/// Files: `overview.json`, `report.txt`, `table.csv`, `trades.csv`.
/// Returns the artifact directory.
pub fn save_artifacts(result: &BacktestResult, dir: &Path) -> Result<PathBuf> {
    let prefix = &result.fingerprint[..result.fingerprint.len().min(16)];
    let out = dir.join(prefix);
    std::fs::create_dir_all(&out)
        .with_context(|| format!("failed to create artifact dir {}", out.display()))?;

    let files = [
        ("overview.json", export_overview_json(&result.overview)?),
        ("report.txt", result.report_text.clone()),
        ("table.csv", export_table_csv(&result.table)?),
        ("trades.csv", export_trades_csv(&result.overview.trade_history)?),
    ];
    for (name, content) in files {
        let path = out.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    tracing::info!(dir = %out.display(), "artifacts_saved");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use barwise_core::domain::Action;
    use barwise_core::table::ColumnKey;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn table_csv_uses_column_names_and_blank_nan() {
        let close = ColumnKey::close("X");
        let sma = ColumnKey::custom("SMA_X_Close_2");
        let mut table = BarTable::new();
        table.append_row(ts(2), [(&close, 10.0)]).unwrap();
        table.append_row(ts(3), [(&close, 11.0), (&sma, 10.5)]).unwrap();

        let csv = export_table_csv(&table).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Date,X_Close,SMA_X_Close_2");
        assert_eq!(lines[1], "2024-01-02,10,");
        assert_eq!(lines[2], "2024-01-03,11,10.5");
    }

    #[test]
    fn intraday_timestamps_keep_time() {
        let stamp = ts(2).date().and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(format_timestamp(&stamp), "2024-01-02 09:30:00");
        assert_eq!(format_timestamp(&ts(2)), "2024-01-02");
    }

    #[test]
    fn trades_csv_lists_every_fill() {
        let trade = |action, day, price: f64| Trade {
            timestamp: ts(day),
            action,
            symbol: "X".into(),
            price,
            shares: 10.0,
            money: price * 10.0,
            fee: 1.0,
            slippage: 0.0,
        };
        let mut history = BTreeMap::new();
        history.insert(
            "X".to_string(),
            vec![trade(Action::Long, 2, 10.0), trade(Action::LongExit, 3, 11.0)],
        );

        let csv = export_trades_csv(&history).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "timestamp,symbol,action,price,shares,money,fee,slippage"
        );
        assert_eq!(
            lines[2],
            "2024-01-03,X,LONG_EXIT,11.0000,10,110.0000,1.0000,0.0000"
        );
    }
}
