fn main() {
    if let Err(err) = csv_probe::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
