//! Submission export command

use super::helpers::{open_gate, GlobalOptions};
use std::path::PathBuf;
use storygate_core::{analytics::write_submissions, error::Result, ExportFormat};
use tracing::debug;

/// Handle submission export command
pub async fn handle(
    options: &GlobalOptions,
    output: Option<PathBuf>,
    format: String,
) -> Result<()> {
    if let Some(ref out_path) = output {
        debug!("Exporting submissions to {}...", out_path.display());
    } else {
        debug!("Exporting submissions to stdout...");
    }

    let gate = open_gate(options).await?;
    let submissions = gate.submissions().await;

    match output {
        Some(path) => {
            let format = ExportFormat::from_path(&path);
            let mut file = std::io::BufWriter::new(std::fs::File::create(&path)?);
            write_submissions(&mut file, &submissions, format)?;
            std::io::Write::flush(&mut file)?;
            eprintln!(
                "Exported {} submissions to {}",
                submissions.len(),
                path.display()
            );
        }
        None => {
            let format: ExportFormat = format.parse()?;
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            write_submissions(&mut handle, &submissions, format)?;
        }
    }
    Ok(())
}
