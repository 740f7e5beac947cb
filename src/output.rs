use crate::aggregator::Summary;
use crate::config::OutputFormat;
use crate::errors::OutputError;
use crate::models::ValidationResult;
use crate::token::Token;
use std::fs;
use std::io::Write;
use std::path::Path;

const CSV_HEADER: [&str; 13] = [
    "index",
    "token",
    "valid",
    "status",
    "http_status",
    "login",
    "user_id",
    "scopes",
    "meets_required_scopes",
    "rate_limit_remaining",
    "rate_limit_reset",
    "attempts",
    "error",
];

/// Renders `results` in the requested format.
pub fn render(results: &[ValidationResult], format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => Ok(render_table(results)),
        OutputFormat::Json => render_json(results),
        OutputFormat::Csv => Ok(render_csv(results)),
    }
}

/// Human-readable table followed by a summary line.
pub fn render_table(results: &[ValidationResult]) -> String {
    let headers = [
        "#", "Token", "Status", "HTTP", "User", "Scopes", "Remaining", "Detail",
    ];
    let rows: Vec<[String; 8]> = results
        .iter()
        .map(|r| {
            [
                (r.index + 1).to_string(),
                r.token.clone(),
                r.status.as_str().to_string(),
                optional(r.http_status),
                r.login.clone().unwrap_or_else(|| "-".to_string()),
                if r.scopes.is_empty() {
                    "none".to_string()
                } else {
                    r.scopes.join(",")
                },
                optional(r.rate_limit_remaining),
                r.error.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &headers.map(str::to_string), &widths);
    let separator = widths.map(|w| "-".repeat(w));
    push_row(&mut out, &separator, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }

    let summary = Summary::from_results(results);
    out.push('\n');
    out.push_str(&format!(
        "Total: {}, Valid: {}, Invalid: {}, Errors: {}, Meeting required scopes: {}\n",
        summary.total,
        summary.valid,
        summary.invalid,
        summary.errors,
        summary.meeting_requirements
    ));
    out
}

fn push_row(out: &mut String, cells: &[String; 8], widths: &[usize; 8]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// JSON array of result objects.
pub fn render_json(results: &[ValidationResult]) -> Result<String, OutputError> {
    let mut json = serde_json::to_string_pretty(results)?;
    json.push('\n');
    Ok(json)
}

/// CSV with a header row; every field is quoted.
pub fn render_csv(results: &[ValidationResult]) -> String {
    let mut out = String::new();
    push_csv_record(&mut out, CSV_HEADER.iter().map(|h| h.to_string()));
    for r in results {
        push_csv_record(
            &mut out,
            [
                r.index.to_string(),
                r.token.clone(),
                r.valid.to_string(),
                r.status.as_str().to_string(),
                csv_optional(r.http_status),
                r.login.clone().unwrap_or_default(),
                csv_optional(r.user_id),
                r.scopes.join(","),
                r.meets_required_scopes.to_string(),
                csv_optional(r.rate_limit_remaining),
                csv_optional(r.rate_limit_reset),
                r.attempts.to_string(),
                r.error.clone().unwrap_or_default(),
            ]
            .into_iter(),
        );
    }
    out
}

fn csv_optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn push_csv_record(out: &mut String, fields: impl Iterator<Item = String>) {
    let fields: Vec<String> = fields
        .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
        .collect();
    out.push_str(&fields.join(","));
    out.push_str("\r\n");
}

/// Writes the report to `output_file`, or stdout when none is given.
pub fn emit(
    results: &[ValidationResult],
    format: OutputFormat,
    output_file: Option<&Path>,
) -> Result<(), OutputError> {
    let rendered = render(results, format)?;
    match output_file {
        Some(path) => {
            fs::write(path, rendered).map_err(|e| OutputError::Write {
                path: path.to_path_buf(),
                source: e,
            })?;
            tracing::info!("Wrote output to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|e| OutputError::Stdout { source: e })?;
        }
    }
    Ok(())
}

/// Writes the full value of every token that is valid and meets the required
/// scopes, one per line. `tokens[i]` must correspond to `results[i]`.
pub fn write_valid_tokens(
    path: &Path,
    tokens: &[Token],
    results: &[ValidationResult],
) -> Result<usize, OutputError> {
    let mut contents = String::new();
    let mut count = 0;
    for result in results.iter().filter(|r| r.valid && r.meets_required_scopes) {
        if let Some(token) = tokens.get(result.index) {
            contents.push_str(token.expose());
            contents.push('\n');
            count += 1;
        }
    }

    fs::write(path, contents).map_err(|e| OutputError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!("Wrote {} valid tokens to {}", count, path.display());
    Ok(count)
}

/// Reads back a JSON report produced by [`render_json`].
pub fn read_json_results(path: &Path) -> Result<Vec<ValidationResult>, OutputError> {
    let contents = fs::read_to_string(path).map_err(|e| OutputError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenStatus;

    fn sample() -> Vec<ValidationResult> {
        let mut valid = ValidationResult::missing(0, "ghp_valid1".to_string());
        valid.valid = true;
        valid.status = TokenStatus::Valid;
        valid.scopes = vec!["repo".to_string(), "read:org".to_string()];
        valid.http_status = Some(200);
        valid.login = Some("octocat".to_string());
        valid.user_id = Some(1);
        valid.rate_limit_remaining = Some(4999);
        valid.meets_required_scopes = true;
        valid.attempts = 1;
        valid.error = None;

        let mut invalid = ValidationResult::missing(1, "ghp_bad".to_string());
        invalid.status = TokenStatus::Invalid;
        invalid.http_status = Some(401);
        invalid.attempts = 1;
        invalid.error = Some("Unauthorized, \"bad\" token".to_string());

        vec![valid, invalid]
    }

    #[test]
    fn test_table_lists_every_result_and_summary() {
        let table = render_table(&sample());
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("#  Token"));
        assert!(lines[2].contains("ghp_valid1"));
        assert!(lines[2].contains("repo,read:org"));
        assert!(lines[3].contains("ghp_bad"));
        assert!(lines[3].contains("invalid"));
        assert!(table.contains("Total: 2, Valid: 1, Invalid: 1, Errors: 0"));
    }

    #[test]
    fn test_csv_quotes_fields() {
        let csv = render_csv(&sample());
        let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("\"index\",\"token\",\"valid\""));
        assert!(lines[1].contains("\"repo,read:org\""));
        assert!(lines[2].contains("\"Unauthorized, \"\"bad\"\" token\""));
    }

    #[test]
    fn test_json_round_trip() {
        let results = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        emit(&results, OutputFormat::Json, Some(&path)).unwrap();

        let read_back = read_json_results(&path).unwrap();
        assert_eq!(read_back, results);
    }

    #[test]
    fn test_valid_tokens_file_uses_full_tokens() {
        let mut results = sample();
        results[0].token = "ghp_va…".to_string();
        let tokens = vec![Token::new("ghp_valid1"), Token::new("ghp_bad")];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valid.txt");

        let count = write_valid_tokens(&path, &tokens, &results).unwrap();
        assert_eq!(count, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "ghp_valid1\n");
    }

    #[test]
    fn test_valid_tokens_file_skips_insufficient_scopes() {
        let mut results = sample();
        results[0].meets_required_scopes = false;
        let tokens = vec![Token::new("ghp_valid1"), Token::new("ghp_bad")];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valid.txt");

        assert_eq!(write_valid_tokens(&path, &tokens, &results).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_emit_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = emit(&sample(), OutputFormat::Csv, Some(&path)).unwrap_err();
        assert!(matches!(err, OutputError::Write { .. }));
    }
}
