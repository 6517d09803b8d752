use std::ops::RangeInclusive;

/// Zero-based `(column, row)` for an A1-style reference such as `B10`.
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.trim().trim_start_matches('$');
    let split = reference.find(|ch: char| ch.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    let letters = letters.trim_end_matches('$');
    if letters.is_empty() || !letters.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return None;
    }

    let mut column = 0_u32;
    for ch in letters.chars() {
        let value = ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        column = column.checked_mul(26)?.checked_add(value)?;
    }

    let row = digits.parse::<u32>().ok()?;
    if row == 0 {
        return None;
    }

    Some((column - 1, row - 1))
}

/// Zero-based bounds of `B10` or `B10:C12`. Kept as bounds so a
/// whole-sheet range like `A1:XFD1048576` costs nothing to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub columns: RangeInclusive<u32>,
    pub rows: RangeInclusive<u32>,
}

pub fn parse_range(reference: &str) -> Option<CellRange> {
    let ((first_col, first_row), (last_col, last_row)) = match reference.split_once(':') {
        Some((start, end)) => (parse_cell_ref(start)?, parse_cell_ref(end)?),
        None => {
            let single = parse_cell_ref(reference)?;
            (single, single)
        }
    };

    Some(CellRange {
        columns: first_col.min(last_col)..=first_col.max(last_col),
        rows: first_row.min(last_row)..=first_row.max(last_row),
    })
}
