use std::fs::File;

use anyhow::{Context, Result};
use token_ledger::{
    app::AppError,
    bin_utils::Service,
    storage::{Storage, in_memory::MemoryStorage, json_file::FileStorage},
};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let filename = std::env::args()
        .nth(1)
        .context("Expected an actions file as the first argument")?;
    let file = File::open(&filename).with_context(|| format!("Failed to open `{filename}`"))?;

    // with a state file the run picks up where the previous one left off
    match std::env::args().nth(2) {
        Some(state) => run(file, FileStorage::open(state)?),
        None => run(file, MemoryStorage::new()),
    }
}

fn run<S: Storage>(file: File, storage: S) -> Result<()> {
    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        storage,
        error_printer: Box::new(|line, err| match err {
            AppError::Storage(err) => eprintln!("Storage error at line {line}: {err}"),
            err => eprintln!("Error at line {line}: {err}"),
        }),
    };
    service.run()
}
