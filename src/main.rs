use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    crawl_batches::cli::run(std::env::args().skip(1))
}
