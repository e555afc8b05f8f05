//! Output formatting utilities for CLI commands

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    println!("{}", build_table(headers, rows));
}

fn build_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }
    table
}

/// Format a money amount with two decimals
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Format a percentage, dropping a zero fraction
///
/// Examples:
/// - 19.0 -> "19%"
/// - 7.5 -> "7.5%"
pub fn format_rate(rate: f64) -> String {
    if rate.fract() == 0.0 {
        format!("{}%", rate as i64)
    } else {
        format!("{}%", rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(100.0), "100.00");
        assert_eq!(format_amount(84.033613), "84.03");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(19.0), "19%");
        assert_eq!(format_rate(7.5), "7.5%");
    }

    #[test]
    fn test_build_table_contains_cells() {
        let table = build_table(&["Key", "Value"], vec![vec!["vat_standard".into(), "19".into()]]);
        let rendered = table.to_string();
        assert!(rendered.contains("vat_standard"));
        assert!(rendered.contains("Key"));
    }
}
