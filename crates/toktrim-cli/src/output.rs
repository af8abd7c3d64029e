/// Print a Serialize value as pretty JSON, logging errors to stderr.
pub fn print_json(value: &(impl serde::Serialize + ?Sized)) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("[toktrim] JSON serialization error: {e}"),
    }
}

/// Write pipeline output to stdout, ending with exactly one newline.
pub fn print_output(text: &str) {
    print!("{}", terminated(text));
}

/// `text` with its trailing line breaks replaced by a single `\n`. Empty
/// text stays empty.
fn terminated(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let body = text.trim_end_matches(['\n', '\r']);
    format!("{body}\n")
}
