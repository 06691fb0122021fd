fn main() {
    if let Err(e) = bundlehost_cli::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
