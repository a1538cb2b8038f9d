//! LLM completion parsing into outcome reports.
//!
//! Models rarely return clean JSON on the first try. Recovery strategies:
//! 1. Direct `serde_json` deserialization
//! 2. Extract JSON from a markdown code block
//! 3. Take the outermost `{ ... }` span of the text
//! 4. Strip trailing commas from each of the above and retry
//!
//! A parsed object is normalized against a fallback report: numbers are
//! clamped into range and missing fields are filled in, so the result is
//! always a complete [`OutcomeReport`].

use oracle_types::OutcomeReport;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

use crate::error::AnalystError;

const MAX_IMPACT: Decimal = Decimal::TEN;

/// Outcome object as models actually write it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOutcome {
    #[serde(alias = "positive", alias = "positiveOutcomes")]
    positive_outcomes: Vec<String>,
    #[serde(alias = "negative", alias = "negativeOutcomes")]
    negative_outcomes: Vec<String>,
    #[serde(alias = "neutral", alias = "neutralOutcomes")]
    neutral_outcomes: Vec<String>,
    #[serde(alias = "probability", alias = "probabilityPercent")]
    probability_percent: Option<Decimal>,
    #[serde(alias = "timeframe", alias = "timeframeLabel")]
    timeframe_label: Option<String>,
    #[serde(alias = "impact", alias = "globalImpact", alias = "globalImpactScore")]
    global_impact_score: Option<Decimal>,
}

impl RawOutcome {
    const fn has_outcomes(&self) -> bool {
        !self.positive_outcomes.is_empty()
            || !self.negative_outcomes.is_empty()
            || !self.neutral_outcomes.is_empty()
    }
}

/// Parse a completion into a report, filling gaps from `fallback`.
///
/// The title always comes from `fallback`. A completion without a single
/// outcome line is rejected so the caller can try the next model.
pub fn parse_outcome(raw: &str, fallback: &OutcomeReport) -> Result<OutcomeReport, AnalystError> {
    let parsed = try_parse(raw)?;
    if !parsed.has_outcomes() {
        return Err(AnalystError::Parse("completion lists no outcomes".to_owned()));
    }
    Ok(normalize(parsed, fallback))
}

fn try_parse(raw: &str) -> Result<RawOutcome, AnalystError> {
    let trimmed = raw.trim();

    let candidates = [
        Some(trimmed),
        extract_json_from_codeblock(trimmed),
        extract_object_span(trimmed),
    ];

    let mut last_error = None;
    for candidate in candidates.iter().flatten() {
        match serde_json::from_str::<RawOutcome>(candidate) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => last_error = Some(e),
        }
    }

    for candidate in candidates.iter().flatten() {
        let cleaned = strip_trailing_commas(candidate);
        match serde_json::from_str::<RawOutcome>(&cleaned) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.map_or_else(
        || AnalystError::Parse("completion is empty".to_owned()),
        AnalystError::from,
    ))
}

fn normalize(raw: RawOutcome, fallback: &OutcomeReport) -> OutcomeReport {
    let probability_percent = raw
        .probability_percent
        .map(|p| p.round().clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
        .and_then(|p| p.to_u8())
        .unwrap_or(fallback.probability_percent);

    let global_impact_score = raw
        .global_impact_score
        .map_or(fallback.global_impact_score, |s| {
            s.clamp(Decimal::ZERO, MAX_IMPACT).round_dp(1)
        });

    let timeframe_label = raw
        .timeframe_label
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback.timeframe_label.clone());

    OutcomeReport {
        scenario_title: fallback.scenario_title.clone(),
        positive_outcomes: or_fallback(raw.positive_outcomes, &fallback.positive_outcomes),
        negative_outcomes: or_fallback(raw.negative_outcomes, &fallback.negative_outcomes),
        neutral_outcomes: or_fallback(raw.neutral_outcomes, &fallback.neutral_outcomes),
        probability_percent,
        timeframe_label,
        global_impact_score,
    }
}

fn or_fallback(lines: Vec<String>, fallback: &[String]) -> Vec<String> {
    let lines: Vec<String> = lines
        .into_iter()
        .map(|l| l.trim().to_owned())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() { fallback.to_vec() } else { lines }
}

/// Extract the body of the first markdown code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = text.get(fence.checked_add(3)?..)?;
    let body_start = after_fence.find('\n').and_then(|nl| nl.checked_add(1)).unwrap_or(0);
    let body = after_fence.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// The text between the first `{` and the last `}`, inclusive.
fn extract_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

/// Strip trailing commas before closing braces and brackets.
///
/// Commas inside string literals are kept, so narrative text such as
/// `"a list,]"` survives untouched.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ','
            && text
                .get(i.saturating_add(1)..)
                .and_then(|rest| rest.trim_start().chars().next())
                .is_some_and(|next| matches!(next, '}' | ']'))
        {
            continue;
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fallback() -> OutcomeReport {
        OutcomeReport {
            scenario_title: "Global Trade Alliance".to_owned(),
            positive_outcomes: vec!["Fallback good".to_owned()],
            negative_outcomes: vec!["Fallback bad".to_owned()],
            neutral_outcomes: vec!["Fallback neutral".to_owned()],
            probability_percent: 60,
            timeframe_label: "5-10 years".to_owned(),
            global_impact_score: Decimal::new(65, 1),
        }
    }

    #[test]
    fn clean_json_is_parsed() {
        let raw = r#"{
            "positive_outcomes": ["Cheaper goods"],
            "negative_outcomes": ["Job losses"],
            "neutral_outcomes": ["New supply chains"],
            "probability_percent": 72,
            "timeframe_label": "3-5 years",
            "global_impact_score": 7.4
        }"#;
        let report = parse_outcome(raw, &fallback()).unwrap();
        assert_eq!(report.scenario_title, "Global Trade Alliance");
        assert_eq!(report.positive_outcomes, vec!["Cheaper goods"]);
        assert_eq!(report.probability_percent, 72);
        assert_eq!(report.timeframe_label, "3-5 years");
        assert_eq!(report.global_impact_score, Decimal::new(74, 1));
    }

    #[test]
    fn code_block_with_prose_is_parsed() {
        let raw = "Here is my analysis:\n```json\n{\"positive\": [\"Growth\"], \"probability\": 55}\n```\nHope it helps.";
        let report = parse_outcome(raw, &fallback()).unwrap();
        assert_eq!(report.positive_outcomes, vec!["Growth"]);
        assert_eq!(report.probability_percent, 55);
    }

    #[test]
    fn bare_object_inside_prose_with_trailing_commas() {
        let raw = "Sure! {\"negativeOutcomes\": [\"Inflation\",], \"globalImpact\": \"8.25\",} Done.";
        let report = parse_outcome(raw, &fallback()).unwrap();
        assert_eq!(report.negative_outcomes, vec!["Inflation"]);
        assert_eq!(report.global_impact_score, Decimal::new(82, 1));
    }

    #[test]
    fn out_of_range_numbers_are_clamped() {
        let raw = r#"{"positive_outcomes": ["x"], "probability_percent": 140, "global_impact_score": -3}"#;
        let report = parse_outcome(raw, &fallback()).unwrap();
        assert_eq!(report.probability_percent, 100);
        assert_eq!(report.global_impact_score, Decimal::ZERO);

        let raw = r#"{"positive_outcomes": ["x"], "probability_percent": -5, "global_impact_score": 12}"#;
        let report = parse_outcome(raw, &fallback()).unwrap();
        assert_eq!(report.probability_percent, 0);
        assert_eq!(report.global_impact_score, Decimal::TEN);
    }

    #[test]
    fn missing_fields_come_from_fallback() {
        let raw = r#"{"neutral_outcomes": ["Shift in alliances"], "timeframe_label": "  "}"#;
        let report = parse_outcome(raw, &fallback()).unwrap();
        assert_eq!(report.neutral_outcomes, vec!["Shift in alliances"]);
        assert_eq!(report.positive_outcomes, vec!["Fallback good"]);
        assert_eq!(report.negative_outcomes, vec!["Fallback bad"]);
        assert_eq!(report.probability_percent, 60);
        assert_eq!(report.timeframe_label, "5-10 years");
        assert_eq!(report.global_impact_score, Decimal::new(65, 1));
    }

    #[test]
    fn completions_without_outcomes_are_rejected() {
        assert!(parse_outcome(r#"{"probability_percent": 50}"#, &fallback()).is_err());
        assert!(parse_outcome("I cannot answer that.", &fallback()).is_err());
        assert!(parse_outcome("", &fallback()).is_err());
    }

    #[test]
    fn strip_trailing_commas_basic() {
        assert_eq!(strip_trailing_commas(r#"{"a": 1, "b": 2,}"#), r#"{"a": 1, "b": 2}"#);
        assert_eq!(strip_trailing_commas("[1, 2, 3,\n]"), "[1, 2, 3\n]");
    }

    #[test]
    fn strip_trailing_commas_leaves_strings_alone() {
        let raw = r#"{"positive": ["Talks resume,}", "Quote \",] end",], "x": 1,}"#;
        assert_eq!(
            strip_trailing_commas(raw),
            r#"{"positive": ["Talks resume,}", "Quote \",] end"], "x": 1}"#
        );
    }

    #[test]
    fn narrative_with_brackets_survives_recovery() {
        let raw = r#"{"negative_outcomes": ["Sanctions (tariffs, quotas,]) widen",], "probability": 40,}"#;
        let report = parse_outcome(raw, &fallback()).unwrap();
        assert_eq!(report.negative_outcomes, vec!["Sanctions (tariffs, quotas,]) widen"]);
        assert_eq!(report.probability_percent, 40);
    }

    #[test]
    fn invalid_json_reports_the_decoder_error() {
        let err = parse_outcome("{\"positive\": [\"unterminated}", &fallback()).unwrap_err();
        assert!(matches!(err, AnalystError::Serde(_)), "unexpected error: {err:?}");

        let err = parse_outcome("   ", &fallback()).unwrap_err();
        assert!(matches!(err, AnalystError::Serde(_)), "unexpected error: {err:?}");

        let err = parse_outcome(r#"{"probability": 50}"#, &fallback()).unwrap_err();
        assert!(matches!(err, AnalystError::Parse(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn object_span_requires_ordered_braces() {
        assert_eq!(extract_object_span("x {\"a\": 1} y"), Some("{\"a\": 1}"));
        assert_eq!(extract_object_span("} nothing {"), None);
    }
}
