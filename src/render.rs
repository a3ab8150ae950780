//! Plain-text table rendering for terminal output

use crate::export::Grid;
use unicode_truncate::UnicodeTruncateStr;
use unicode_width::UnicodeWidthStr;

/// Widest a rendered column may get
const MAX_COL_WIDTH: usize = 40;

/// Render a grid as an aligned text table with a header separator.
pub fn to_table(grid: &impl Grid) -> String {
    let widths = compute_column_widths(grid);
    let mut out = String::new();

    let header: Vec<String> = grid.column_names().to_vec();
    push_line(&mut out, &header, &widths);

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&separator.join("-+-"));
    out.push('\n');

    for row in grid.grid_rows() {
        let cells: Vec<String> = row.iter().map(|c| c.display_string(MAX_COL_WIDTH)).collect();
        push_line(&mut out, &cells, &widths);
    }

    let n = grid.grid_rows().len();
    out.push_str(&format!("({} row{})\n", n, if n == 1 { "" } else { "s" }));
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &w)| pad(cells.get(i).map(String::as_str).unwrap_or(""), w))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

/// Truncate to `width` display columns, then pad with spaces
fn pad(s: &str, width: usize) -> String {
    let (truncated, used) = s.unicode_truncate(width);
    format!("{}{}", truncated, " ".repeat(width - used))
}

fn compute_column_widths(grid: &impl Grid) -> Vec<usize> {
    let mut widths: Vec<usize> = grid.column_names().iter().map(|c| c.width()).collect();

    // Sample first 100 rows to determine widths
    for row in grid.grid_rows().iter().take(100) {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.display_string(MAX_COL_WIDTH).width());
            }
        }
    }

    for w in &mut widths {
        *w = (*w).clamp(1, MAX_COL_WIDTH);
    }

    widths
}
