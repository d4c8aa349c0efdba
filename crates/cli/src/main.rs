fn main() {
    if let Err(err) = unrealscope_cli::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
