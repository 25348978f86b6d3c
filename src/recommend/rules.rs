//! Rule-based recommendations
//!
//! Turns the strongest triggers in the report into advice and pads with
//! general guidance. Used when no text generation service is configured.

use crate::analysis::TriggerReport;
use crate::recommend::{RecommendError, RecommendationRequest, Recommender, RECOMMENDATION_COUNT};
use async_trait::async_trait;

const GENERAL_ADVICE: [&str; 4] = [
    "Keep logging symptoms every day so patterns become clearer.",
    "Keep meal times regular and stay well hydrated.",
    "Keep a consistent bedtime, including on weekends.",
    "Note stress and activity levels alongside your symptoms.",
];

/// Deterministic recommender built from trigger counts
#[derive(Debug, Clone)]
pub struct RuleBasedRecommender {
    low_sleep_hours: f64,
}

impl RuleBasedRecommender {
    pub fn new(low_sleep_hours: f64) -> Self {
        Self { low_sleep_hours }
    }

    /// Advice for a report, strongest trigger first
    pub fn compose(&self, report: &TriggerReport) -> Vec<String> {
        let triggers = &report.triggers;
        let mut advice = Vec::with_capacity(RECOMMENDATION_COUNT);

        if triggers.low_sleep.count > 0 {
            advice.push(format!(
                "Aim for at least {} hours of sleep; short nights came before {}.",
                self.low_sleep_hours,
                plural(triggers.low_sleep.count, "flare-up")
            ));
        }

        if let Some((item, count)) = triggers.food_items.ranked().first() {
            advice.push(format!(
                "Try cutting back on {}; it was eaten the day before {}.",
                item,
                plural(*count, "flare-up")
            ));
        }

        let cycle = triggers
            .menstrual_events
            .ranked()
            .into_iter()
            .chain(triggers.flow_levels.ranked())
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)));
        if let Some((value, count)) = cycle {
            advice.push(format!(
                "Plan lighter days around {} in your cycle; it came before {}.",
                value,
                plural(count, "flare-up")
            ));
        }

        for general in GENERAL_ADVICE {
            if advice.len() >= RECOMMENDATION_COUNT {
                break;
            }
            advice.push(general.to_string());
        }

        advice.truncate(RECOMMENDATION_COUNT);
        advice
    }
}

impl Default for RuleBasedRecommender {
    fn default() -> Self {
        Self::new(6.0)
    }
}

#[async_trait]
impl Recommender for RuleBasedRecommender {
    fn name(&self) -> &str {
        "rule_based"
    }

    async fn recommend(
        &self,
        request: RecommendationRequest<'_>,
    ) -> Result<Vec<String>, RecommendError> {
        Ok(self.compose(request.report))
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
