use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{Assignment, ModuleAverageEntry, ScoreEntry, Student};

/// Fixed pass mark on the 0-10 scale, applied with `>=` at module and
/// global level.
pub const PASS_MARK: f64 = 7.0;

/// Point budget of a module; category weights (or, without categories,
/// assignment weights) must stay within it.
pub const MODULE_POINT_BUDGET: f64 = 10.0;

// Absorbs float noise at the budget boundary only; any real overflow,
// however small, is rejected.
const WEIGHT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Aprobado,
    Reprobado,
}

pub fn classify(average: f64) -> Classification {
    if average >= PASS_MARK {
        Classification::Aprobado
    } else {
        Classification::Reprobado
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLight {
    Green,
    Amber,
    Red,
}

/// Assignment-level color split: >= 70% green, >= 50% amber, else red.
pub fn traffic_light(score: f64, max_score: f64) -> TrafficLight {
    if max_score <= 0.0 {
        return TrafficLight::Red;
    }
    let ratio = score / max_score;
    if ratio >= 0.70 {
        TrafficLight::Green
    } else if ratio >= 0.50 {
        TrafficLight::Amber
    } else {
        TrafficLight::Red
    }
}

/// Dense score resolution: an absent or non-finite recorded score counts
/// as a literal zero, not an exclusion from the denominator.
pub fn resolve_score(raw: Option<f64>) -> f64 {
    match raw {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Clamp an already-stored score into `[0, max]` for display. Grade entry
/// never clamps; it rejects (see the grading handler).
pub fn clamp_display(score: f64, max_score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    score.max(0.0).min(max_score.max(0.0))
}

/// Display policy for 0-10 averages: a positive value renders with two
/// decimals, zero renders as a placeholder dash. The dash deliberately
/// covers true zeroes as well; "no data" and "confirmed zero" must not be
/// distinguishable here.
pub fn display_average(value: f64) -> String {
    if value > 0.0 {
        format!("{:.2}", value)
    } else {
        "-".to_string()
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Budget gate for adding weight `proposed` next to siblings summing
/// `existing_sum`. Equality with the budget is permitted.
pub fn weight_budget_allows(existing_sum: f64, proposed: f64, budget: f64) -> bool {
    existing_sum + proposed <= budget + WEIGHT_EPSILON
}

/// Collation key for Spanish names: lowercased with diacritics folded so
/// accented surnames sort adjacent to their unaccented forms.
pub fn collation_key(s: &str) -> String {
    s.chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Roster ordering contract: surname first, then name, case-insensitive
/// and accent-folded, stable. Applied after every filter or search.
pub fn sort_students(students: &mut [Student]) {
    students.sort_by(|a, b| {
        (collation_key(&a.surname), collation_key(&a.name))
            .cmp(&(collation_key(&b.surname), collation_key(&b.name)))
    });
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterFilter {
    pub search: Option<String>,
    pub course: Option<String>,
    pub status: Option<String>,
}

impl RosterFilter {
    /// Blank selectors mean "all".
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        RosterFilter {
            search: clean(self.search),
            course: clean(self.course),
            status: clean(self.status),
        }
    }

    pub fn matches(&self, student: &Student) -> bool {
        if let Some(term) = &self.search {
            let needle = term.to_lowercase();
            let haystacks = [
                Some(student.name.as_str()),
                Some(student.surname.as_str()),
                Some(student.national_id.as_str()),
                student.course_name.as_deref(),
            ];
            let hit = haystacks
                .iter()
                .flatten()
                .any(|h| h.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if let Some(code) = &self.course {
            if student.course_code.as_deref() != Some(code.as_str()) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if student.enrollment_state.as_deref() != Some(status.as_str()) {
                return false;
            }
        }
        true
    }

    /// Pure narrowing over a fetched roster; the input is never mutated.
    pub fn apply(&self, students: &[Student]) -> Vec<Student> {
        students
            .iter()
            .filter(|s| self.matches(s))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleCell {
    pub module_id: String,
    pub value: f64,
    pub display: String,
    pub classification: Classification,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGradeRow {
    pub student_id: String,
    pub name: String,
    pub surname: String,
    pub national_id: String,
    pub raw_average: f64,
    pub modules: Vec<ModuleCell>,
    pub global_average: f64,
    pub global_display: String,
    pub classification: Classification,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CourseStats {
    pub total: usize,
    #[serde(rename = "aprobados")]
    pub approved: usize,
    #[serde(rename = "reprobados")]
    pub reprobated: usize,
    #[serde(rename = "promedio")]
    pub average: f64,
}

pub fn score_map(entries: &[ScoreEntry]) -> HashMap<(String, String), f64> {
    entries
        .iter()
        .map(|e| {
            (
                (e.student_id.clone(), e.assignment_id.clone()),
                resolve_score(e.score),
            )
        })
        .collect()
}

pub fn module_average_map(entries: &[ModuleAverageEntry]) -> HashMap<(String, String), f64> {
    entries
        .iter()
        .map(|e| {
            (
                (e.student_id.clone(), e.module_id.clone()),
                resolve_score(Some(e.average)),
            )
        })
        .collect()
}

/// Secondary display statistic: arithmetic mean of the student's resolved
/// scores across ALL assignments, graded or not. Never used for pass/fail.
pub fn raw_average(
    student_id: &str,
    assignments: &[Assignment],
    scores: &HashMap<(String, String), f64>,
) -> f64 {
    if assignments.is_empty() {
        return 0.0;
    }
    let sum: f64 = assignments
        .iter()
        .map(|a| {
            scores
                .get(&(student_id.to_string(), a.id.clone()))
                .copied()
                .unwrap_or(0.0)
        })
        .sum();
    sum / assignments.len() as f64
}

/// Build the per-student grade rows for a course, ordered by surname.
///
/// `module_order` fixes the column order; per-module averages come
/// pre-computed from the snapshot (absent => 0) and the global average is
/// their equal-weight mean, independent of assignment counts per module.
pub fn aggregate_rows(
    students: &[Student],
    assignments: &[Assignment],
    scores: &HashMap<(String, String), f64>,
    module_averages: &HashMap<(String, String), f64>,
    module_order: &[String],
) -> Vec<StudentGradeRow> {
    let mut ordered: Vec<Student> = students.to_vec();
    sort_students(&mut ordered);

    ordered
        .into_iter()
        .map(|s| {
            let cells: Vec<ModuleCell> = module_order
                .iter()
                .map(|module_id| {
                    let value = module_averages
                        .get(&(s.id.clone(), module_id.clone()))
                        .copied()
                        .unwrap_or(0.0);
                    ModuleCell {
                        module_id: module_id.clone(),
                        value,
                        display: display_average(value),
                        classification: classify(value),
                    }
                })
                .collect();
            let module_values: Vec<f64> = cells.iter().map(|c| c.value).collect();
            let global = mean(&module_values);
            StudentGradeRow {
                raw_average: raw_average(&s.id, assignments, scores),
                global_average: global,
                global_display: display_average(global),
                classification: classify(global),
                modules: cells,
                student_id: s.id,
                name: s.name,
                surname: s.surname,
                national_id: s.national_id,
            }
        })
        .collect()
}

/// Reductions over the currently visible rows; recomputed on every filter
/// or search change, never cached.
pub fn course_stats(rows: &[StudentGradeRow]) -> CourseStats {
    let globals: Vec<f64> = rows.iter().map(|r| r.global_average).collect();
    let approved = rows
        .iter()
        .filter(|r| r.classification == Classification::Aprobado)
        .count();
    CourseStats {
        total: rows.len(),
        approved,
        reprobated: rows.len() - approved,
        average: mean(&globals),
    }
}

/// Derive the module column order for a snapshot: assignment tagging order
/// first, then any module seen only in the pre-computed averages.
pub fn module_order_from(
    assignments: &[Assignment],
    module_averages: &[ModuleAverageEntry],
) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    for a in assignments {
        if !order.contains(&a.module_id) {
            order.push(a.module_id.clone());
        }
    }
    let mut extras: Vec<String> = module_averages
        .iter()
        .map(|e| e.module_id.clone())
        .filter(|id| !order.contains(id))
        .collect();
    extras.sort();
    extras.dedup();
    order.extend(extras);
    order
}
