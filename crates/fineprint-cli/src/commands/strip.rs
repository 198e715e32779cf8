//! Strip command

use clap::Args;
use fineprint_core::strip::{MarkupStripper, WAYBACK_BEGIN_MARKER, WAYBACK_END_MARKER};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct StripArgs {
    /// Marker opening a region to drop
    #[arg(long, default_value = WAYBACK_BEGIN_MARKER)]
    pub begin: String,

    /// Marker closing a region to drop
    #[arg(long, default_value = WAYBACK_END_MARKER)]
    pub end: String,

    /// Input file; stdin when omitted
    pub file: Option<PathBuf>,
}

pub fn execute(args: StripArgs) -> Result<(), Box<dyn std::error::Error>> {
    let input: Box<dyn Read> = match &args.file {
        Some(path) => Box::new(
            File::open(path).map_err(|e| format!("cannot open {}: {e}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };

    let mut stripper = MarkupStripper::new(input, args.begin, args.end)?;
    let mut out = BufWriter::new(io::stdout().lock());
    io::copy(&mut stripper, &mut out)?;
    out.flush()?;
    Ok(())
}
