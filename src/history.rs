use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::to_string_pretty;

use crate::models::GradeRecord;

// f64 has no Eq/Hash; compare grades by their bit pattern instead.
fn key(grade: &GradeRecord) -> (u64, String, u32) {
    (grade.value.to_bits(), grade.subject.clone(), grade.weight)
}

// Compares the freshly scraped grades with the snapshot left by the previous
// run, returns the ones that were not there before, then rewrites the
// snapshot. The first run has nothing to compare against and reports nothing.
pub fn diff_grades(path: &Path, fetched: &[GradeRecord]) -> Result<Vec<GradeRecord>> {
    let has_previous =
        path.exists() && fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);

    let previous: Vec<GradeRecord> = if has_previous {
        let contents = fs::read_to_string(path).context("Failed to read previous grades")?;
        serde_json::from_str(&contents).context("Failed to parse previous grades")?
    } else {
        Vec::new()
    };

    // The same grade can legitimately appear twice, so count occurrences
    // instead of testing membership.
    let mut seen: HashMap<(u64, String, u32), usize> = HashMap::new();
    for grade in &previous {
        *seen.entry(key(grade)).or_insert(0) += 1;
    }

    let mut new_grades = Vec::new();
    for grade in fetched {
        match seen.get_mut(&key(grade)) {
            Some(count) if *count > 0 => *count -= 1,
            _ => new_grades.push(grade.clone()),
        }
    }

    fs::write(path, to_string_pretty(&fetched)?).context("Failed to write grades snapshot")?;

    Ok(if has_previous { new_grades } else { Vec::new() })
}
