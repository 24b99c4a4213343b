//! Guard against writing the store over one of the inputs.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that the store path is safe to open for writing.
///
/// Checks:
/// - Store cannot be the same file as any input (compared after
///   canonicalisation when both exist)
/// - Store cannot carry a `.csv` extension
pub fn validate_store_path(store: &Path, inputs: &[&Path]) -> Result<()> {
    let is_csv = store
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        bail!(
            "Safety check failed: store '{}' looks like a CSV input",
            store.display()
        );
    }

    let store_real = store.canonicalize().ok();
    for input in inputs {
        let same = store == *input
            || match (&store_real, input.canonicalize().ok()) {
                (Some(a), Some(b)) => *a == b,
                _ => false,
            };
        if same {
            bail!(
                "Safety check failed: store '{}' cannot be the same as input '{}'",
                store.display(),
                input.display()
            );
        }
    }

    Ok(())
}
