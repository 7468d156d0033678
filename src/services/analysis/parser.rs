//! Advisory Reply Parser
//!
//! Best-effort extraction of findings and metrics from the advisory
//! service's free-text reply. This is tolerant line matching, not a grammar:
//! sections are located by their headers, lines that do not look like a
//! finding are dropped, and missing sections simply come back empty.
//!
//! Recognized layout:
//!
//! ```text
//! ERRORS:
//! - SYNTAX: Missing colon [ERROR] (line 5)
//! SUGGESTIONS:
//! - STYLE: Use a list comprehension (line 3)
//! METRICS:
//! COMPLEXITY: 4
//! MEMORY: 2048
//! TIME: 12
//! END
//! ```
//!
//! A fenced code block directly under a suggestion becomes that
//! suggestion's replacement `code`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::models::analysis::{AnalysisResult, Finding, Metrics, Severity, Suggestion};

/// Reply could not be processed at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error parsing analysis: {0}")]
pub struct AdvisoryParseError(String);

/// Findings and metrics extracted from one reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedAdvisory {
    pub errors: Vec<Finding>,
    pub suggestions: Vec<Suggestion>,
    pub metrics: Metrics,
}

impl From<ParsedAdvisory> for AnalysisResult {
    fn from(parsed: ParsedAdvisory) -> Self {
        AnalysisResult {
            errors: parsed.errors,
            suggestions: parsed.suggestions,
            metrics: parsed.metrics,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Errors,
    Suggestions,
    Metrics,
}

struct Patterns {
    header: Regex,
    bullet: Regex,
    finding: Regex,
    complexity: Regex,
    memory: Regex,
    time: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            header: Regex::new(
                r"(?i)^[\s*#>\-]*(ERRORS|SUGGESTIONS|METRICS)[\s*]*:[\s*]*(.*)$",
            )?,
            bullet: Regex::new(r"^(?:[-*•]\s+|\d+[.)]\s+)")?,
            finding: Regex::new(
                r"(?i)^(?:TYPE:\s*)?([^:\[\]]+?)\s*:\s*(.+?)\s*(?:\[(\w+)\])?\s*(?:\(line\s*:?\s*(\d+)\))?\s*$",
            )?,
            complexity: Regex::new(r"(?i)COMPLEXITY\s*:\s*(\d+)")?,
            memory: Regex::new(r"(?i)MEMORY\s*:\s*(\d+)")?,
            time: Regex::new(r"(?i)TIME\s*:\s*(\d+(?:\.\d+)?)")?,
        })
    }
}

static PATTERNS: LazyLock<Result<Patterns, regex::Error>> = LazyLock::new(Patterns::compile);

/// Parse an advisory reply. Every finding is attributed to `filename`,
/// whatever the reply itself says.
pub fn parse_advisory_text(text: &str, filename: &str) -> Result<ParsedAdvisory, AdvisoryParseError> {
    let patterns = PATTERNS
        .as_ref()
        .map_err(|e| AdvisoryParseError(e.to_string()))?;

    let mut parsed = ParsedAdvisory::default();
    let mut section: Option<Section> = None;
    let mut metrics_text = String::new();
    let mut code_block: Option<Vec<&str>> = None;

    for raw_line in text.lines() {
        // Inside a fenced block under a suggestion, keep lines verbatim
        if let Some(block) = code_block.as_mut() {
            if raw_line.trim_start().starts_with("```") {
                let code = block.join("\n");
                if let Some(last) = parsed.suggestions.last_mut() {
                    last.code = Some(code);
                }
                code_block = None;
            } else {
                block.push(raw_line);
            }
            continue;
        }

        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("END") {
            break;
        }

        if let Some(caps) = patterns.header.captures(line) {
            section = match caps[1].to_ascii_uppercase().as_str() {
                "ERRORS" => Some(Section::Errors),
                "SUGGESTIONS" => Some(Section::Suggestions),
                _ => Some(Section::Metrics),
            };
            let rest = caps.get(2).map_or("", |m| m.as_str()).trim();
            if !rest.is_empty() {
                handle_line(patterns, section, rest, filename, &mut parsed, &mut metrics_text);
            }
            continue;
        }

        if section == Some(Section::Suggestions) && line.starts_with("```") {
            code_block = Some(Vec::new());
            continue;
        }

        handle_line(patterns, section, line, filename, &mut parsed, &mut metrics_text);
    }

    parsed.metrics = scan_metrics(patterns, &metrics_text);
    Ok(parsed)
}

fn handle_line(
    patterns: &Patterns,
    section: Option<Section>,
    line: &str,
    filename: &str,
    parsed: &mut ParsedAdvisory,
    metrics_text: &mut String,
) {
    match section {
        Some(Section::Errors) => {
            if let Some(finding) = parse_finding(patterns, line, filename) {
                parsed.errors.push(finding);
            }
        }
        Some(Section::Suggestions) => {
            if let Some(finding) = parse_finding(patterns, line, filename) {
                parsed.suggestions.push(finding.into());
            }
        }
        Some(Section::Metrics) => {
            metrics_text.push_str(line);
            metrics_text.push('\n');
        }
        None => {}
    }
}

/// Match `<type>: <message> [<SEVERITY>] (line <N>)`; bracket and line are optional
fn parse_finding(patterns: &Patterns, line: &str, filename: &str) -> Option<Finding> {
    let cleaned = patterns.bullet.replace(line, "");
    let caps = patterns.finding.captures(&cleaned)?;

    let kind = caps[1].trim().trim_matches('*').trim().to_lowercase();
    let message = caps[2].trim().trim_matches('*').trim();
    if kind.is_empty() || message.is_empty() {
        return None;
    }

    let mut finding = Finding::new(kind, message, filename);
    finding.severity = caps.get(3).and_then(|m| Severity::from_label(m.as_str()));
    finding.line = caps.get(4).and_then(|m| m.as_str().parse().ok());
    Some(finding)
}

fn scan_metrics(patterns: &Patterns, text: &str) -> Metrics {
    fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
        re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
    }

    Metrics {
        complexity: capture(&patterns.complexity, text)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        memory_usage: capture(&patterns.memory, text)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        execution_time: capture(&patterns.time, text)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0),
    }
}
