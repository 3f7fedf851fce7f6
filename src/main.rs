fn main() {
    if let Err(e) = medicare_core::run() {
        eprintln!("medicare: {e}");
        std::process::exit(1);
    }
}
