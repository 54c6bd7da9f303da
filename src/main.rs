fn main() {
    if let Err(err) = workbook_diff::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
