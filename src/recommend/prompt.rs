//! Prompt construction and response parsing for text generation

use crate::analysis::TriggerReport;
use crate::recommend::{RecommendError, RECOMMENDATION_COUNT};
use crate::storage::RecordSet;
use serde_json::json;

/// Records per kind included in the prompt, most recent by storage order
const PROMPT_RECORD_LIMIT: usize = 30;

pub const SYSTEM_PROMPT: &str = "You are a careful health journaling assistant. \
You read a person's symptom trigger statistics and recent daily logs and suggest \
practical lifestyle adjustments. You never diagnose. Respond with a JSON array of \
exactly 3 short recommendation strings and nothing else.";

/// Build the user prompt from the trigger report and recent records
pub fn build_prompt(report: &TriggerReport, records: &RecordSet) -> String {
    let recent = json!({
        "sleep": tail(&records.sleep),
        "diet": tail(&records.diet),
        "menstrual": tail(&records.menstrual),
        "symptoms": tail(&records.symptoms),
    });

    let report_json = serde_json::to_string_pretty(report).unwrap_or_default();
    let recent_json = serde_json::to_string_pretty(&recent).unwrap_or_default();

    format!(
        "Trigger analysis (counts of factors logged the day before a symptom spike, \
         with the spike severity as examples):\n{}\n\n\
         Recent daily logs:\n{}\n\n\
         Give exactly 3 short, specific recommendations as a JSON array of strings.",
        report_json, recent_json
    )
}

fn tail<T>(items: &[T]) -> &[T] {
    &items[items.len().saturating_sub(PROMPT_RECORD_LIMIT)..]
}

/// Parse generated text into exactly three recommendations
///
/// Accepts a bare JSON array or one wrapped in a Markdown code fence.
pub fn parse_recommendations(content: &str) -> Result<Vec<String>, RecommendError> {
    let body = strip_code_fence(content.trim());

    let items: Vec<String> = serde_json::from_str(body)
        .map_err(|e| RecommendError::InvalidResponse(format!("expected JSON string array: {}", e)))?;

    let items: Vec<String> = items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if items.len() != RECOMMENDATION_COUNT {
        return Err(RecommendError::InvalidResponse(format!(
            "expected {} recommendations, got {}",
            RECOMMENDATION_COUNT,
            items.len()
        )));
    }

    Ok(items)
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };

    // Drop an optional language tag on the opening fence
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisEngine;
    use crate::storage::{DietRecord, SleepRecord, SymptomRecord};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    #[test]
    fn test_parse_bare_array() {
        let parsed = parse_recommendations(r#"["Sleep more", "Drink water", "Skip wine"]"#).unwrap();
        assert_eq!(parsed, vec!["Sleep more", "Drink water", "Skip wine"]);
    }

    #[test]
    fn test_parse_fenced_array() {
        let content = "```json\n[\"a\", \"b\", \"c\"]\n```";
        assert_eq!(parse_recommendations(content).unwrap(), vec!["a", "b", "c"]);

        let content = "```\n[\"a\", \"b\", \"c\"]\n```\n";
        assert_eq!(parse_recommendations(content).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_rejects_wrong_count() {
        let err = parse_recommendations(r#"["only one"]"#).unwrap_err();
        assert!(matches!(err, RecommendError::InvalidResponse(_)));

        let err = parse_recommendations(r#"["a", "b", "  "]"#).unwrap_err();
        assert!(err.to_string().contains("got 2"));
    }

    #[test]
    fn test_parse_rejects_prose() {
        let err = parse_recommendations("Here are some tips: sleep more.").unwrap_err();
        assert!(matches!(err, RecommendError::InvalidResponse(_)));
    }

    #[test]
    fn test_prompt_contains_triggers_and_records() {
        let mut records = RecordSet::new();
        records.symptoms = vec![
            SymptomRecord::new(day(1), 2, 2, 2),
            SymptomRecord::new(day(2), 2, 2, 2),
            SymptomRecord::new(day(3), 9, 9, 9),
            SymptomRecord::new(day(4), 9, 9, 9),
        ];
        records.sleep.push(SleepRecord::new(day(2), 5.0));
        records
            .diet
            .push(DietRecord::new(day(2), "dinner").item("chocolate"));

        let report = AnalysisEngine::default().trigger_report(&records).unwrap();
        let prompt = build_prompt(&report, &records);

        assert!(prompt.contains("\"chocolate\""));
        assert!(prompt.contains("\"low_sleep\""));
        assert!(prompt.contains("\"duration_hours\": 5.0"));
        assert!(prompt.contains("exactly 3"));
    }
}
