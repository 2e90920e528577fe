fn main() {
    if let Err(err) = rowsmith::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
