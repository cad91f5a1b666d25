use std::path::Path;

use anyhow::{bail, Result};
use cubefix_core::FixtureConfig;

use super::CONFIG_FILE;

pub fn init(path: &str, force: bool) -> Result<()> {
    let base = Path::new(path);
    let output = base.join(CONFIG_FILE);
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }

    let base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    let config = FixtureConfig::scaffold(&base);
    std::fs::create_dir_all(output.parent().unwrap_or(Path::new(".")))?;
    std::fs::write(&output, config.to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}
