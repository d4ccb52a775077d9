fn main() {
    if let Err(err) = book_charts::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
