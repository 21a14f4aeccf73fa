//! Shared pieces of the chipprompt demos.

use anyhow::Result;

/// Stand-in for a call to the extraction model: answers the first question and reports how many prompt lines it read.
pub fn fake_completion(prompt: &str) -> Result<String> {
    let line_count = prompt.lines().count();
    Ok(format!("1. Cell line name: N/A ({} prompt lines read)", line_count))
}
