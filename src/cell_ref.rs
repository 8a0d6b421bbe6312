//! Utilities for Excel-style column letters and cell addresses.
//!
//! Report builders address cells the way spreadsheet users read them:
//! columns and rows are both 1-based (`A1` is column 1, row 1).

/// Convert a 1-based column index into its letter form (1 -> "A", 27 -> "AA").
///
/// Column 0 has no letter form and yields an empty string.
pub fn column_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;
    while n > 0 {
        n -= 1;
        let offset = u8::try_from(n % 26).unwrap_or(0);
        result.insert(0, char::from(b'A' + offset));
        n /= 26;
    }
    result
}

/// Parse column letters ("A", "aa", "XFD") into a 1-based column index.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let upper = ch.to_ascii_uppercase();
        col = col.checked_mul(26)?.checked_add(upper as u32 - 'A' as u32 + 1)?;
    }
    Some(col)
}

/// Format a 1-based (column, row) pair as an A1 address.
pub fn cell_address(col: u32, row: u32) -> String {
    format!("{}{}", column_letter(col), row)
}

/// Format an inclusive range on a single row, e.g. `B1:D1`.
pub fn row_range(row: u32, start_col: u32, end_col: u32) -> String {
    format!("{}:{}", cell_address(start_col, row), cell_address(end_col, row))
}

/// Parse a cell reference like "B12" into a 1-based (column, row) pair.
///
/// `$` absolute markers are ignored. Returns `None` when either the
/// column letters or the row digits are missing, or letters follow digits.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let trimmed: String = cell_ref.trim().chars().filter(|&c| c != '$').collect();
    let split = trimmed.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = trimmed.split_at(split);
    let col = column_index(letters)?;
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((col, row))
}

/// Parse a range like "B1:D1" into ((start_col, start_row), (end_col, end_row)).
pub fn parse_range(range: &str) -> Option<((u32, u32), (u32, u32))> {
    match range.split_once(':') {
        Some((start, end)) => Some((parse_cell_ref(start)?, parse_cell_ref(end)?)),
        None => {
            let single = parse_cell_ref(range)?;
            Some((single, single))
        }
    }
}
