// A1 notation helpers.

/// Convert a 1-based column number to its letter form: 1 → A, 26 → Z, 27 → AA.
pub fn column_letter(mut n: u32) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        let r = (n - 1) % 26;
        letters.push(b'A' + r as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Quote a tab name for use in a range. Always quoted; embedded quotes are doubled.
pub fn quote_tab(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

/// Range covering columns `first_col..=last_col` of a single 1-based row.
pub fn row_range(tab: &str, first_col: u32, last_col: u32, row: u32) -> String {
    format!(
        "{}!{}{row}:{}{row}",
        quote_tab(tab),
        column_letter(first_col),
        column_letter(last_col)
    )
}
