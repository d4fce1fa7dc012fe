//! Directive scanning and range matching.
//!
//! Directives are transient classifications of a template row:
//!
//! - `{{ range <ident> }}` in cell 0 opens a range block over `<ident>`.
//! - `{{ end }}` in cell 0 closes the innermost open range block.
//! - `{{ <ident>.<field> }}` in any cell marks a list row bound to `<ident>`.
//!
//! Detection runs on the raw cell text, before any escaping for the evaluator.

use lazy_static::lazy_static;
use regex::Regex;

use crate::document::Row;

lazy_static! {
    static ref LIST_FIELD: Regex = Regex::new(r"\{\{\s*(\w+)\.\w+\s*\}\}").unwrap();
    static ref RANGE_START: Regex = Regex::new(r"\{\{\s*range\s+(\w+)\s*\}\}").unwrap();
    static ref RANGE_END: Regex = Regex::new(r"\{\{\s*end\s*\}\}").unwrap();
}

/// Classification of a single template row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    RangeStart(&'a str),
    RangeEnd,
    ListField(&'a str),
}

/// Classifies a row, checking range markers before list fields.
pub fn classify(row: &Row) -> Option<Directive<'_>> {
    if let Some(property) = range_start(row) {
        return Some(Directive::RangeStart(property));
    }
    if is_range_end(row) {
        return Some(Directive::RangeEnd);
    }
    list_field(row).map(Directive::ListField)
}

fn first_value(row: &Row) -> Option<&str> {
    row.cell(0).map(|c| c.value.as_str())
}

/// Property named by a `{{ range <ident> }}` directive in cell 0.
pub fn range_start(row: &Row) -> Option<&str> {
    let caps = RANGE_START.captures(first_value(row)?)?;
    caps.get(1).map(|m| m.as_str())
}

/// True when cell 0 holds `{{ end }}`.
pub fn is_range_end(row: &Row) -> bool {
    first_value(row).is_some_and(|v| RANGE_END.is_match(v))
}

/// Property of the first `{{ <ident>.<field> }}` placeholder, scanning cells left to right.
pub fn list_field(row: &Row) -> Option<&str> {
    row.cells
        .iter()
        .filter(|c| !c.value.is_empty())
        .find_map(|c| LIST_FIELD.captures(&c.value))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Index of the `{{ end }}` row closing a range whose body starts at `rows[0]`.
///
/// Nested ranges are skipped with a nesting counter. Rows without cells never affect the
/// count. Returns `None` when the range is never closed.
pub fn find_range_end(rows: &[Row]) -> Option<usize> {
    let mut nesting = 0usize;
    for (idx, row) in rows.iter().enumerate() {
        if row.is_empty() {
            continue;
        }
        if is_range_end(row) {
            if nesting == 0 {
                return Some(idx);
            }
            nesting -= 1;
            continue;
        }
        if range_start(row).is_some() {
            nesting += 1;
        }
    }
    None
}

/// First range in `rows` that is never closed, as `(row index, property)`.
///
/// Walks range blocks the way the engine does, including ranges nested in bodies, without
/// needing any data.
pub fn first_unclosed_range(rows: &[Row]) -> Option<(usize, &str)> {
    let mut ri = 0;
    while ri < rows.len() {
        let Some(property) = range_start(&rows[ri]) else {
            ri += 1;
            continue;
        };
        let body = ri + 1;
        let Some(end) = find_range_end(&rows[body..]) else {
            return Some((ri, property));
        };
        if let Some((inner, prop)) = first_unclosed_range(&rows[body..body + end]) {
            return Some((body + inner, prop));
        }
        ri = body + end + 1;
    }
    None
}

#[cfg(test)]
mod directive_unit_tests {
    use super::*;

    #[test]
    fn test_whitespace_tolerant_patterns() {
        assert_eq!(range_start(&Row::from_values(["{{range items}}"])), Some("items"));
        assert_eq!(
            range_start(&Row::from_values(["{{   range   items  }}"])),
            Some("items")
        );
        assert!(is_range_end(&Row::from_values(["{{ end }}"])));
        assert!(is_range_end(&Row::from_values(["{{end}}"])));
        assert_eq!(list_field(&Row::from_values(["{{ a.b }}"])), Some("a"));
    }

    #[test]
    fn test_range_markers_only_in_first_cell() {
        let row = Row::from_values(["plain", "{{range items}}", "{{end}}"]);
        assert_eq!(range_start(&row), None);
        assert!(!is_range_end(&row));
        assert_eq!(classify(&row), None);
    }

    #[test]
    fn test_list_field_skips_empty_and_takes_first() {
        let row = Row::from_values(["", "total", "{{ rows.name }}", "{{ other.x }}"]);
        assert_eq!(list_field(&row), Some("rows"));
        assert_eq!(classify(&row), Some(Directive::ListField("rows")));
    }

    #[test]
    fn test_empty_row_has_no_directive() {
        assert_eq!(classify(&Row::new()), None);
    }

    #[test]
    fn test_unicode_property_names() {
        assert_eq!(
            range_start(&Row::from_values(["{{range сотрудники}}"])),
            Some("сотрудники")
        );
    }
}
