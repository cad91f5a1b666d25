use anyhow::Result;
use cubefix_deploy::DeployReport;

use super::Session;

pub fn deploy(session: &Session) -> Result<()> {
    let report = session.fixture.deployer().deploy()?;
    print_report(&report);
    Ok(())
}

pub(crate) fn print_report(report: &DeployReport) {
    println!(
        "✓ Deployed {} tables ({:.1} KB staged)",
        report.tables.len(),
        report.staged_bytes as f64 / 1024.0
    );
    for table in &report.tables {
        println!("  table {table}");
    }
    for view in &report.views {
        println!("  view  {view}");
    }
}
