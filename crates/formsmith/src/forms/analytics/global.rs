use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::super::domain::{Form, FormId, FormResponse};
use super::super::scoring::policy::{round_half_up, round_to};
use super::views::{FormActivity, GlobalAnalytics};
use super::{average_score, average_time};

const RECENT_WINDOW_DAYS: i64 = 7;

/// Dashboard totals across every form and response.
pub fn global_analytics(
    forms: &[Form],
    responses: &[FormResponse],
    now: DateTime<Utc>,
) -> GlobalAnalytics {
    let all: Vec<&FormResponse> = responses.iter().collect();

    let mut by_form: HashMap<&FormId, Vec<&FormResponse>> = HashMap::new();
    for response in responses {
        by_form.entry(&response.form_id).or_default().push(response);
    }

    let max_possible_score = if all.is_empty() {
        0.0
    } else {
        let total: f64 = all.iter().map(|response| response.max_score).sum();
        round_to(total / all.len() as f64, 1)
    };

    let recent_cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let recent_responses = all
        .iter()
        .filter(|response| response.submitted_at > recent_cutoff)
        .count();

    let forms_activity = forms
        .iter()
        .map(|form| {
            let form_responses = by_form.get(&form.id).cloned().unwrap_or_default();
            form_activity(form, &form_responses)
        })
        .collect();

    GlobalAnalytics {
        total_responses: all.len(),
        total_forms: forms.len(),
        avg_score: average_score(&all),
        max_possible_score,
        avg_time: average_time(&all),
        forms_with_responses: forms
            .iter()
            .filter(|form| by_form.contains_key(&form.id))
            .count(),
        recent_responses,
        forms: forms_activity,
    }
}

fn form_activity(form: &Form, responses: &[&FormResponse]) -> FormActivity {
    let avg_score = average_score(responses);
    // The first stored response carries the max score the form had when answered.
    let max_score = responses
        .first()
        .map(|response| response.max_score)
        .unwrap_or(0.0);
    let success_rate = if max_score > 0.0 {
        round_half_up(avg_score / max_score * 100.0).max(0.0) as u32
    } else {
        0
    };

    FormActivity {
        form_id: form.id.clone(),
        title: form.title.clone(),
        question_count: form.questions.len(),
        response_count: responses.len(),
        avg_score,
        max_score,
        success_rate,
    }
}
