fn main() -> Result<(), Box<dyn std::error::Error>> {
    vscmirror_cli::run()
}
