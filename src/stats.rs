use regex::Regex;

use crate::models::GradeRecord;

// Weighted mean of all grades, weights being percentages. None when nothing
// carries any weight.
pub fn weighted_average(grades: &[GradeRecord]) -> Option<f64> {
    let mut total = 0.0;
    let mut weight = 0.0;
    for grade in grades {
        total += grade.value * (grade.weight as f64 / 100.0);
        weight += grade.weight as f64 / 100.0;
    }
    if weight == 0.0 {
        None
    } else {
        Some(total / weight)
    }
}

// The cumulative weighted average after each grade, oldest first. This is the
// "andamento media" series the desktop app used to plot.
pub fn running_averages(grades: &[GradeRecord]) -> Vec<f64> {
    let mut series = Vec::with_capacity(grades.len());
    let mut total = 0.0;
    let mut weight = 0.0;
    for grade in grades {
        total += grade.value * (grade.weight as f64 / 100.0);
        weight += grade.weight as f64 / 100.0;
        series.push(if weight == 0.0 { 0.0 } else { total / weight });
    }
    series
}

// Per-subject weighted averages, subjects in order of first appearance.
pub fn subject_averages(grades: &[GradeRecord]) -> Vec<(String, f64)> {
    let mut subjects: Vec<(String, f64, f64)> = Vec::new();
    for grade in grades {
        let index = match subjects.iter().position(|(name, _, _)| *name == grade.subject) {
            Some(index) => index,
            None => {
                subjects.push((grade.subject.clone(), 0.0, 0.0));
                subjects.len() - 1
            }
        };
        subjects[index].1 += grade.value * (grade.weight as f64 / 100.0);
        subjects[index].2 += grade.weight as f64 / 100.0;
    }
    subjects
        .into_iter()
        .map(|(name, total, weight)| {
            let average = if weight == 0.0 { 0.0 } else { total / weight };
            (name, average)
        })
        .collect()
}

// The register pads some subject names with punctuation; replace it with
// spaces before grouping so the same subject does not show up twice.
pub fn tidy_subject(raw: &str) -> String {
    let punctuation = Regex::new(r"[^\w\s]").unwrap();
    punctuation.replace_all(raw, " ").trim().to_string()
}
