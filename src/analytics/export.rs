//! Submission log export

use crate::error::{GateError, Result};
use crate::types::SubmissionRecord;
use std::io::Write;
use std::path::Path;

/// Export format, normally picked from the output file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Pretty-printed JSON array
    Json,
    /// One JSON object per line
    Jsonl,
    /// Spreadsheet-friendly rows, including contact addresses
    Csv,
    Markdown,
}

impl ExportFormat {
    /// Format for `path`, JSON when the extension is not recognised
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jsonl") => ExportFormat::Jsonl,
            Some("csv") => ExportFormat::Csv,
            Some("md") | Some("markdown") => ExportFormat::Markdown,
            _ => ExportFormat::Json,
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "jsonl" => Ok(ExportFormat::Jsonl),
            "csv" => Ok(ExportFormat::Csv),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(GateError::Validation(format!(
                "Unsupported export format: {}",
                other
            ))),
        }
    }
}

const CSV_HEADER: &str =
    "id,timestamp,user_id,score,tier,code,source,sentiment,category,contact_address,text";

/// Write `records` to `writer` in `format`
pub fn write_submissions(
    writer: &mut dyn Write,
    records: &[SubmissionRecord],
    format: ExportFormat,
) -> Result<()> {
    match format {
        ExportFormat::Json => {
            let json = serde_json::to_string_pretty(records)?;
            writer.write_all(json.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        ExportFormat::Jsonl => {
            for record in records {
                let json = serde_json::to_string(record)?;
                writeln!(writer, "{}", json)?;
            }
        }
        ExportFormat::Csv => {
            writeln!(writer, "{}", CSV_HEADER)?;
            for r in records {
                let row = [
                    r.id.to_string(),
                    r.timestamp.to_rfc3339(),
                    r.user_id.clone(),
                    r.score.to_string(),
                    r.tier.clone(),
                    r.code.clone(),
                    r.source.to_string(),
                    r.sentiment.to_string(),
                    r.category.to_string(),
                    r.contact_address.clone().unwrap_or_default(),
                    r.submitted_text.clone(),
                ];
                let fields: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
                writeln!(writer, "{}", fields.join(","))?;
            }
        }
        ExportFormat::Markdown => {
            writeln!(writer, "# Submission Export\n")?;
            writeln!(writer, "Exported {} submissions\n", records.len())?;
            writeln!(writer, "---\n")?;
            for (i, r) in records.iter().enumerate() {
                writeln!(writer, "## {}. {} ({}/10)\n", i + 1, r.tier, r.score)?;
                writeln!(writer, "**Code**: {}", r.code)?;
                writeln!(writer, "**User**: {}", r.user_id)?;
                writeln!(
                    writer,
                    "**Submitted**: {}",
                    r.timestamp.format("%Y-%m-%d %H:%M:%S")
                )?;
                writeln!(writer, "**Scored by**: {}", r.source)?;
                writeln!(writer, "**Tagged**: {} / {}", r.category, r.sentiment)?;
                writeln!(writer, "**Rationale**: {}", r.rationale)?;
                writeln!(writer, "\n{}\n", r.submitted_text)?;
                writeln!(writer, "---\n")?;
            }
        }
    }
    Ok(())
}

/// Quote a CSV field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, EvaluationSource, Sentiment, SubmissionId};
    use chrono::Utc;

    fn record(text: &str) -> SubmissionRecord {
        SubmissionRecord {
            id: SubmissionId::new(),
            user_id: "bob".into(),
            submitted_text: text.into(),
            score: 8,
            tier: "PREMIUM".into(),
            code: "PIZZA-CONF24-PREMIUM-0A1B2C3D-1415".into(),
            rationale: "great".into(),
            source: EvaluationSource::Remote,
            timestamp: Utc::now(),
            contact_address: Some("bob@corp.io".into()),
            sentiment: Sentiment::Positive,
            category: Category::Technical,
            keywords: vec!["pizza".into()],
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("out.JSONL")), ExportFormat::Jsonl);
        assert_eq!(ExportFormat::from_path(Path::new("emails.csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("r.md")), ExportFormat::Markdown);
        assert_eq!(ExportFormat::from_path(Path::new("dump")), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_csv_quotes_fields() {
        let mut out = Vec::new();
        write_submissions(
            &mut out,
            &[record("Cheese, crust and \"sauce\"\nwow")],
            ExportFormat::Csv,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(CSV_HEADER));
        assert!(text.contains("bob@corp.io"));
        assert!(text.contains(",remote,positive,TECHNICAL,"));
        assert!(text.contains("\"Cheese, crust and \"\"sauce\"\"\nwow\""));
    }

    #[test]
    fn test_jsonl_one_line_per_record() {
        let mut out = Vec::new();
        write_submissions(&mut out, &[record("a"), record("b")], ExportFormat::Jsonl).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        for line in text.lines() {
            let _: SubmissionRecord = serde_json::from_str(line).unwrap();
        }
    }
}
