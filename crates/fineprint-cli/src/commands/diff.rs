//! Diff command

use clap::Args;
use fineprint_core::diff::unified_diff;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    pub before: PathBuf,

    pub after: PathBuf,

    /// Unchanged lines shown around each change
    #[arg(long, default_value_t = 20)]
    pub context: usize,
}

pub fn execute(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    let before = fs::read_to_string(&args.before)
        .map_err(|e| format!("cannot read {}: {e}", args.before.display()))?;
    let after = fs::read_to_string(&args.after)
        .map_err(|e| format!("cannot read {}: {e}", args.after.display()))?;

    let rendered = unified_diff(
        &args.before.display().to_string(),
        &args.after.display().to_string(),
        &before,
        &after,
        args.context,
    )?;
    print!("{rendered}");
    Ok(())
}
