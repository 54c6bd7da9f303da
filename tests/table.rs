use workbook_diff::table::TextTable;

#[test]
fn text_table_aligns_columns() {
    let mut table = TextTable::new(["id", "name"]);
    table.push_row(vec!["1".to_string(), "Alice".to_string()]);
    table.push_row(vec!["2".to_string(), "Bob".to_string()]);

    let rendered = table.to_string();
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines, vec!["id   name", "---  -----", "1    Alice", "2    Bob"]);
}

#[test]
fn text_table_normalizes_control_characters() {
    let mut table = TextTable::new(["note"]);
    table.push_row(vec!["line1\nline2\tvalue".to_string()]);

    let rendered = table.to_string();
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "line1 line2 value");
}

#[test]
fn text_table_counts_unicode_by_character() {
    let mut table = TextTable::new(["résumé", "status"]);
    table.push_row(vec!["café".to_string(), "ok".to_string()]);

    let rendered = table.to_string();
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "résumé  status");
    assert_eq!(lines[2], "café    ok");
}

#[test]
fn right_aligned_columns_pad_on_the_left() {
    let mut table = TextTable::new(["sheet", "rows"]).align_right([1]);
    table.push_row(vec!["Inputs".to_string(), "7".to_string()]);
    table.push_row(vec!["History".to_string(), "120".to_string()]);

    let rendered = table.to_string();
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[2], "Inputs      7");
    assert_eq!(lines[3], "History   120");
}
