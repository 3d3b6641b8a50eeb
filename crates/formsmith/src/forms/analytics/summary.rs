use serde::Serialize;

use super::super::domain::{Form, FormResponse};
use super::questions::question_analytics;
use super::views::{FormAnalytics, ScoreDistribution};
use super::{accuracy, average_score, average_time};

/// Ratio a response must reach to count as passed.
const PASS_RATIO: f64 = 0.6;

/// Score bucket a single response falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn for_ratio(ratio: f64) -> Self {
        if ratio >= 0.9 {
            Self::Excellent
        } else if ratio >= 0.7 {
            Self::Good
        } else if ratio >= 0.5 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

impl ScoreDistribution {
    fn record(&mut self, band: ScoreBand) {
        match band {
            ScoreBand::Excellent => self.excellent += 1,
            ScoreBand::Good => self.good += 1,
            ScoreBand::Fair => self.fair += 1,
            ScoreBand::Poor => self.poor += 1,
        }
    }
}

/// Aggregate the stored responses of `form`. Responses of other forms are ignored.
pub fn form_analytics(form: &Form, responses: &[FormResponse]) -> FormAnalytics {
    let own: Vec<FormResponse> = responses
        .iter()
        .filter(|response| response.form_id == form.id)
        .cloned()
        .collect();
    let refs: Vec<&FormResponse> = own.iter().collect();

    let mut score_distribution = ScoreDistribution::default();
    let mut passed = 0;
    for response in &own {
        let ratio = response.ratio();
        score_distribution.record(ScoreBand::for_ratio(ratio));
        if ratio >= PASS_RATIO {
            passed += 1;
        }
    }

    FormAnalytics {
        form_id: form.id.clone(),
        title: form.title.clone(),
        total_responses: own.len(),
        avg_score: average_score(&refs),
        max_score: form.max_score(),
        avg_time: average_time(&refs),
        pass_rate: accuracy(passed, own.len()),
        score_distribution,
        questions: form
            .questions
            .iter()
            .map(|question| question_analytics(question, &own))
            .collect(),
    }
}
