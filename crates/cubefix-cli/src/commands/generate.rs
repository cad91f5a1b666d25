use anyhow::Result;

use super::Session;

pub fn generate(session: &Session, model: &str, rows: Option<u32>) -> Result<()> {
    let rows = rows.unwrap_or(session.fixture.config().fixture.generated_rows);
    let model = session.fixture.metadata().get_data_model_desc(model)?;
    let generated = session
        .fixture
        .data_generator()
        .generate_and_store(&model, rows)?;

    println!("✓ Generated data for model {}", model.name);
    for table in &generated.tables {
        println!("  {:<40} {:>8} rows", table.table, table.rows.len());
    }
    Ok(())
}
