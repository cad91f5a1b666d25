use anyhow::Result;

use super::Session;

pub fn init_workdir(session: &Session) -> Result<()> {
    session.fixture.environment().init_cli_work_dir()?;
    let env = &session.fixture.config().env;
    println!("✓ Working directory reset: {}", env.cli_working_dir.display());
    println!("  Job logs: {}", env.job_log_dir.display());
    Ok(())
}

pub fn deploy_metadata(session: &Session) -> Result<()> {
    let report = session.fixture.environment().deploy_metadata()?;
    println!(
        "✓ Metadata deployed ({} removed, {} copied)",
        report.removed, report.copied
    );
    for cube in &report.resigned_cubes {
        println!("  Re-signed {cube}");
    }
    Ok(())
}
