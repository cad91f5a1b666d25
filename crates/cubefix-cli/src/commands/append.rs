use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use super::Session;

pub fn append(session: &Session, table: &str, file: Option<&Path>) -> Result<()> {
    let content = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading rows from stdin")?;
            buf
        }
    };

    let outcome = session.fixture.appender().append(&content, table)?;
    println!(
        "✓ Appended {} bytes to {} ({} bytes before)",
        outcome.appended_bytes, outcome.path, outcome.previous_bytes
    );
    Ok(())
}
