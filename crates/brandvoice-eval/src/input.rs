use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Read one prompt per line; lines are trimmed and blank ones dropped.
pub fn load_prompts(path: &Path) -> Result<Vec<String>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("read prompts {:?}", path))?;
    let prompts = parse_prompts(&content);
    debug!(path = %path.display(), prompts = prompts.len(), "prompts loaded");
    Ok(prompts)
}

pub fn parse_prompts(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_lines_and_trims() {
        let prompts = parse_prompts("  Where is my order?  \n\n\t\nCan I return shoes?\r\n");
        assert_eq!(prompts, vec!["Where is my order?", "Can I return shoes?"]);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.txt");
        std::fs::write(&path, "a\nb\n").unwrap();
        assert_eq!(load_prompts(&path).unwrap().len(), 2);
        assert!(load_prompts(&dir.path().join("missing.txt")).is_err());
    }
}
