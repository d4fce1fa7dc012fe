//! Directive scanning and range matching tests on synthetic row lists.

use sheetforge::document::Row;
use sheetforge::render::directive::{
    classify, find_range_end, first_unclosed_range, is_range_end, list_field, range_start,
    Directive,
};

fn rows(values: &[&str]) -> Vec<Row> {
    values
        .iter()
        .map(|v| {
            if v.is_empty() {
                Row::new()
            } else {
                Row::from_values([*v])
            }
        })
        .collect()
}

#[cfg(test)]
mod range_end_tests {
    use super::*;

    #[test]
    fn test_nested_range_skips_inner_end() {
        // Body of an outer range that contains one nested range.
        let body = rows(&[
            "Dept {{dept}}",
            "{{range staff}}",
            "{{name}}",
            "{{end}}",
            "Subtotal",
            "{{end}}",
            "after",
        ]);
        assert_eq!(find_range_end(&body), Some(5));
    }

    #[test]
    fn test_sibling_ranges_stop_at_first_end() {
        // Body of the first of two sibling ranges.
        let body = rows(&["{{a}}", "{{ end }}", "{{range b}}", "{{b}}", "{{end}}"]);
        assert_eq!(find_range_end(&body), Some(1));
        // Body of the second sibling.
        assert_eq!(find_range_end(&body[3..]), Some(1));
    }

    #[test]
    fn test_deeply_nested_ranges() {
        let body = rows(&[
            "{{range a}}",
            "{{range b}}",
            "{{range c}}",
            "{{end}}",
            "{{end}}",
            "{{end}}",
            "{{end}}",
        ]);
        assert_eq!(find_range_end(&body), Some(6));
    }

    #[test]
    fn test_unclosed_range_is_not_found() {
        let body = rows(&["{{x}}", "{{range inner}}", "{{end}}"]);
        assert_eq!(find_range_end(&body), None);
        assert_eq!(find_range_end(&[]), None);
    }

    #[test]
    fn test_rows_without_cells_are_skipped() {
        let body = rows(&["", "{{x}}", "", "{{end}}"]);
        assert_eq!(find_range_end(&body), Some(3));
    }

    #[test]
    fn test_end_marker_in_later_cell_is_ignored() {
        let mut body = vec![Row::from_values(["text", "{{end}}"])];
        body.extend(rows(&["{{end}}"]));
        assert_eq!(find_range_end(&body), Some(1));
    }
}

#[cfg(test)]
mod unclosed_range_tests {
    use super::*;

    #[test]
    fn test_reports_outer_unclosed_range() {
        let sheet = rows(&["title", "{{range items}}", "{{name}}"]);
        assert_eq!(first_unclosed_range(&sheet), Some((1, "items")));
    }

    #[test]
    fn test_reports_inner_unclosed_range() {
        // The inner start consumes the only end, leaving the outer open.
        let sheet = rows(&["{{range outer}}", "{{range inner}}", "{{end}}"]);
        assert_eq!(first_unclosed_range(&sheet), Some((0, "outer")));
    }

    #[test]
    fn test_balanced_template_has_no_unclosed_range() {
        let sheet = rows(&[
            "{{range a}}",
            "{{range b}}",
            "{{end}}",
            "{{end}}",
            "{{range c}}",
            "{{end}}",
        ]);
        assert_eq!(first_unclosed_range(&sheet), None);
    }
}

#[cfg(test)]
mod scanner_tests {
    use super::*;

    #[test]
    fn test_classify_each_kind() {
        assert_eq!(
            classify(&Row::from_values(["Name: {{range employees}}"])),
            Some(Directive::RangeStart("employees"))
        );
        assert_eq!(
            classify(&Row::from_values(["{{end}}"])),
            Some(Directive::RangeEnd)
        );
        assert_eq!(
            classify(&Row::from_values(["{{ items.name }}", "{{ items.qty }}"])),
            Some(Directive::ListField("items"))
        );
        assert_eq!(classify(&Row::from_values(["{{ total }}"])), None);
    }

    #[test]
    fn test_range_start_is_not_a_list_field() {
        let row = Row::from_values(["{{range employees}}"]);
        assert_eq!(range_start(&row), Some("employees"));
        assert_eq!(list_field(&row), None);
        assert!(!is_range_end(&row));
    }

    #[test]
    fn test_range_keyword_needs_a_property() {
        assert_eq!(range_start(&Row::from_values(["{{range}}"])), None);
        assert_eq!(range_start(&Row::from_values(["{{ ranges }}"])), None);
    }
}
