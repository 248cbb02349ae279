use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context};
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::calc::{clamp_display, Classification, StudentGradeRow};
use crate::models::{Assignment, Course, Module};

const MANIFEST_ENTRY: &str = "manifest.json";
pub const BUNDLE_FORMAT_V1: &str = "aulad-gradebook-v1";

/// One exported sheet: a named grid of display strings. Document
/// formatting (spreadsheet styling, PDF layout) is the shell's concern;
/// this is the data it renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetModel {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub name: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSummary {
    pub entry_count: usize,
    pub entries: Vec<BundleEntry>,
}

fn fmt_score(value: f64) -> String {
    format!("{:.2}", value)
}

fn classification_label(c: Classification) -> &'static str {
    match c {
        Classification::Aprobado => "Aprobado",
        Classification::Reprobado => "Reprobado",
    }
}

/// The three-sheet gradebook model: detail by assignment, per-module
/// averages, and summary statistics. Rows arrive already ordered by
/// surname; sheets preserve that order.
pub fn gradebook_sheets(
    course: &Course,
    modules: &[Module],
    assignments: &[Assignment],
    scores: &HashMap<(String, String), f64>,
    rows: &[StudentGradeRow],
) -> Vec<SheetModel> {
    let module_name: HashMap<&str, &str> = modules
        .iter()
        .map(|m| (m.id.as_str(), m.name.as_str()))
        .collect();

    let mut detail_headers = vec![
        "Apellido".to_string(),
        "Nombre".to_string(),
        "Cédula".to_string(),
    ];
    detail_headers.extend(assignments.iter().map(|a| a.title.clone()));
    detail_headers.push("Promedio simple".to_string());

    let detail_rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            let mut row = vec![r.surname.clone(), r.name.clone(), r.national_id.clone()];
            for a in assignments {
                let resolved = scores
                    .get(&(r.student_id.clone(), a.id.clone()))
                    .copied()
                    .unwrap_or(0.0);
                row.push(fmt_score(clamp_display(resolved, a.max_score)));
            }
            row.push(fmt_score(r.raw_average));
            row
        })
        .collect();

    let mut averages_headers = vec![
        "Apellido".to_string(),
        "Nombre".to_string(),
        "Cédula".to_string(),
    ];
    if let Some(first) = rows.first() {
        for cell in &first.modules {
            let label = module_name
                .get(cell.module_id.as_str())
                .map(|n| n.to_string())
                .unwrap_or_else(|| cell.module_id.clone());
            averages_headers.push(label);
        }
    } else {
        averages_headers.extend(modules.iter().map(|m| m.name.clone()));
    }
    averages_headers.push("Promedio global".to_string());
    averages_headers.push("Estado".to_string());

    let averages_rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            let mut row = vec![r.surname.clone(), r.name.clone(), r.national_id.clone()];
            row.extend(r.modules.iter().map(|c| c.display.clone()));
            row.push(r.global_display.clone());
            row.push(classification_label(r.classification).to_string());
            row
        })
        .collect();

    let stats = crate::calc::course_stats(rows);
    let mut summary_rows = vec![
        vec!["Curso".to_string(), course.name.clone()],
        vec!["Total estudiantes".to_string(), stats.total.to_string()],
        vec!["Aprobados".to_string(), stats.approved.to_string()],
        vec!["Reprobados".to_string(), stats.reprobated.to_string()],
        vec!["Promedio del curso".to_string(), fmt_score(stats.average)],
    ];
    // Per-module course means over the same visible rows.
    if let Some(first) = rows.first() {
        for (idx, cell) in first.modules.iter().enumerate() {
            let values: Vec<f64> = rows.iter().map(|r| r.modules[idx].value).collect();
            let label = module_name
                .get(cell.module_id.as_str())
                .map(|n| n.to_string())
                .unwrap_or_else(|| cell.module_id.clone());
            summary_rows.push(vec![
                format!("Promedio {}", label),
                fmt_score(crate::calc::mean(&values)),
            ]);
        }
    }

    vec![
        SheetModel {
            name: "detalle".to_string(),
            headers: detail_headers,
            rows: detail_rows,
        },
        SheetModel {
            name: "promedios_modulos".to_string(),
            headers: averages_headers,
            rows: averages_rows,
        },
        SheetModel {
            name: "resumen".to_string(),
            headers: vec!["Concepto".to_string(), "Valor".to_string()],
            rows: summary_rows,
        },
    ]
}

fn sheet_csv_bytes(sheet: &SheetModel) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&sheet.headers)
        .context("failed to write csv header")?;
    for row in &sheet.rows {
        writer.write_record(row).context("failed to write csv row")?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow!("failed to flush csv sheet: {}", e))
}

/// Write the sheets as CSV entries inside a zip bundle, with a manifest
/// carrying a sha-256 checksum per entry.
pub fn write_bundle(
    out_path: &Path,
    course_label: &str,
    sheets: &[SheetModel],
) -> anyhow::Result<BundleSummary> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.display())
            })?;
        }
    }
    let out_file = File::create(out_path)
        .with_context(|| format!("failed to create output file {}", out_path.display()))?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries: Vec<BundleEntry> = Vec::new();
    let mut manifest_entries: Vec<serde_json::Value> = Vec::new();
    for sheet in sheets {
        let bytes = sheet_csv_bytes(sheet)?;
        let digest = Sha256::digest(&bytes);
        let sha256 = format!("{:x}", digest);
        let entry_name = format!("hojas/{}.csv", sheet.name);

        zip.start_file(entry_name.clone(), opts)
            .with_context(|| format!("failed to start entry {}", entry_name))?;
        zip.write_all(&bytes)
            .with_context(|| format!("failed to write entry {}", entry_name))?;

        manifest_entries.push(json!({
            "name": entry_name,
            "sha256": sha256,
            "rows": sheet.rows.len(),
        }));
        entries.push(BundleEntry {
            name: entry_name,
            sha256,
        });
    }

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "course": course_label,
        "exportedAt": exported_at,
        "entries": manifest_entries,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.finish().context("failed to finalize bundle")?;
    Ok(BundleSummary {
        entry_count: entries.len() + 1,
        entries,
    })
}
