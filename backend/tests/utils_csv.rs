use attendance_backend::utils::csv::{guard_formula, write_csv};

fn render(headers: &[&str], rows: Vec<Vec<&str>>) -> String {
    String::from_utf8(write_csv(headers, rows).expect("csv")).expect("utf8")
}

#[test]
fn csv_escapes_double_quotes() {
    let output = render(&["Name"], vec![vec!["say \"hello\""]]);
    assert_eq!(output, "\"Name\"\n\"say \"\"hello\"\"\"\n");
}

#[test]
fn csv_handles_newlines_in_fields() {
    let output = render(&["Address"], vec![vec!["line1\nline2"]]);
    assert_eq!(output, "\"Address\"\n\"line1\nline2\"\n");
}

#[test]
fn csv_handles_comma_in_fields() {
    let output = render(&["Team"], vec![vec!["a, b, c"]]);
    assert_eq!(output, "\"Team\"\n\"a, b, c\"\n");
}

#[test]
fn csv_formula_guard_with_equals() {
    let output = render(&["Name"], vec![vec!["=cmd|' /C calc'!A0"]]);
    assert_eq!(output, "\"Name\"\n\"'=cmd|' /C calc'!A0\"\n");
}

#[test]
fn csv_formula_guard_with_plus() {
    assert_eq!(guard_formula("+1+2"), "'+1+2");
}

#[test]
fn csv_formula_guard_with_at() {
    assert_eq!(guard_formula("@SUM(A1)"), "'@SUM(A1)");
}

#[test]
fn csv_formula_guard_with_minus() {
    assert_eq!(guard_formula("-2+3"), "'-2+3");
}

#[test]
fn csv_lone_dash_placeholder_is_not_guarded() {
    let output = render(&["Clock Out"], vec![vec!["-"]]);
    assert_eq!(output, "\"Clock Out\"\n\"-\"\n");
}

#[test]
fn csv_keeps_unicode_names() {
    let output = render(&["Name", "Department"], vec![vec!["Zoë Ünal", "Ingeniería"]]);
    assert_eq!(output, "\"Name\",\"Department\"\n\"Zoë Ünal\",\"Ingeniería\"\n");
}
