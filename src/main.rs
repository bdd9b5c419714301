fn main() {
    if let Err(err) = vizgraph::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
