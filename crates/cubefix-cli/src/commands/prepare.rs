use std::ops::Range;
use std::path::Path;

use anyhow::Result;
use cubefix_deploy::FileStreamLoader;

use super::Session;
use super::deploy::print_report;

pub fn normal(session: &Session, model: &str, provided_data: bool) -> Result<()> {
    let report = session
        .fixture
        .prepare_test_data_for_normal_cubes(model, provided_data)?;
    print_report(&report);
    Ok(())
}

pub fn streaming(
    session: &Session,
    cube: &str,
    window: Range<u64>,
    records: usize,
    topic_dir: &Path,
    topic: Option<&str>,
) -> Result<()> {
    let mut loader = FileStreamLoader::new(topic_dir, topic.unwrap_or(cube))?;
    let outcome = session.fixture.prepare_test_data_for_streaming_cube(
        window.start,
        window.end,
        records,
        cube,
        &mut loader,
    )?;

    println!("✓ Streamed {records} records to {}", loader.path().display());
    println!(
        "  Appended {} bytes to {}",
        outcome.appended_bytes, outcome.path
    );
    Ok(())
}
