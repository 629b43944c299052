use crate::etl::Transformer;
use crate::storage::{Checkpoint, Snapshot};
use crate::transform::CleaningPlan;
use eyre::{Result, bail};
use owo_colors::OwoColorize;

/// Clean stage: apply `plan` to an extracted snapshot
///
/// The cleaned table replaces the file in place; the returned handle carries
/// the cleaned schema.
pub fn run_clean(snapshot: &Snapshot, plan: &CleaningPlan) -> Result<Snapshot> {
    if snapshot.checkpoint() != Checkpoint::Extracted {
        bail!(
            "Clean stage needs an extracted snapshot, {} is {}",
            snapshot.path().display(),
            snapshot.checkpoint()
        );
    }

    let table = snapshot.read()?;
    let before = table.len();
    let cleaned = plan.transform(table)?;
    let output = Snapshot::write(snapshot.path(), &cleaned, Checkpoint::Cleaned)?;

    log::info!(
        "✓ Cleaned {} row(s) down to {} in {}",
        before.cyan(),
        output.rows().cyan(),
        output.path().display().bright_black()
    );
    Ok(output)
}
