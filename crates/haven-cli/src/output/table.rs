#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

/// Column widths never shrink below this.
const MIN_COLUMN_WIDTH: usize = 4;

/// Render an aligned plain-text table.
#[must_use]
pub fn render_table(headers: &[&str], rows: &[Vec<String>], options: TableOptions) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
                .max(MIN_COLUMN_WIDTH)
        })
        .collect();

    if let Some(max_width) = options.max_width {
        shrink_to_fit(&mut widths, headers, max_width);
    }

    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(&truncate(header, *width), *width, 0))
        .collect::<Vec<_>>()
        .join("  ");

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(header_line.trim_end().to_string());
    lines.push("-".repeat(header_line.trim_end().chars().count()));

    for row in rows {
        let line = widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                let cell = truncate(row.get(index).map_or("-", String::as_str), *width);
                let visible = cell.chars().count();
                let cell = if options.color { colorize_state(&cell) } else { cell };
                pad(&cell, *width, visible)
            })
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

/// Take one column at a time from the widest column until the row fits.
fn shrink_to_fit(widths: &mut [usize], headers: &[&str], max_width: usize) {
    let separators = widths.len().saturating_sub(1) * 2;
    while widths.iter().sum::<usize>() + separators > max_width {
        let widest = widths
            .iter()
            .enumerate()
            .filter(|(idx, width)| **width > headers[*idx].len().max(MIN_COLUMN_WIDTH))
            .max_by_key(|(_, width)| **width)
            .map(|(idx, _)| idx);
        let Some(idx) = widest else {
            break;
        };
        widths[idx] -= 1;
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Left-align `value` in `width` columns. `visible` is the printable length
/// when `value` carries escape codes, 0 to measure `value` itself.
fn pad(value: &str, width: usize, visible: usize) -> String {
    let len = if visible == 0 { value.chars().count() } else { visible };
    format!("{value}{}", " ".repeat(width.saturating_sub(len)))
}

fn colorize_state(value: &str) -> String {
    let code = match value {
        "resolved_safe" | "resolved" | "high" | "true" => "32",
        "active" | "medium" | "deadline_extended" => "33",
        "escalated" | "moved_significantly" | "low" => "31",
        "cancelled" => "2",
        _ => return value.to_string(),
    };
    format!("\u{1b}[{code}m{value}\u{1b}[0m")
}
