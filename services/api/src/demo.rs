use crate::infra::{InMemoryFormRepository, LoggingResultsNotifier};
use crate::score::answer_map;
use chrono::Utc;
use clap::Args;
use formsmith::error::AppError;
use formsmith::forms::{
    FormDraft, FormService, PerformanceBand, QuestionAnalytics, Submission,
};
use serde_json::json;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Address used as the results sender; omit to skip results delivery
    #[arg(long)]
    pub(crate) sender: Option<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { sender } = args;

    let repository = Arc::new(InMemoryFormRepository::default());
    let notifier = Arc::new(LoggingResultsNotifier::new(sender));
    let service = FormService::new(repository, notifier.clone());

    println!("Form builder demo");
    let form = service.create_form(demo_form()?)?;
    println!(
        "- Created \"{}\" ({}) with {} questions worth {} points",
        form.title,
        form.id,
        form.questions.len(),
        form.max_score()
    );

    let preview = service.preview(
        &form.id,
        &answer_map(json!({ "q-planets": { "Mars": "Rocky" } })),
    )?;
    println!(
        "- Live preview after one placement: {}/{} ({}%)",
        preview.score, preview.max_score, preview.percentage
    );

    println!("\nSubmissions");
    for submission in demo_submissions() {
        let name = submission.submitter_name.clone().unwrap_or_default();
        match service.submit(&form.id, submission) {
            Ok(receipt) => {
                let band = PerformanceBand::for_percentage(receipt.percentage);
                println!(
                    "  - {name}: {}/{} ({}%) {} -> {}",
                    receipt.score,
                    receipt.max_score,
                    receipt.percentage,
                    band.label(),
                    receipt.id
                );
            }
            Err(err) => println!("  - {name}: rejected ({err})"),
        }
    }

    let analytics = service.form_analytics(&form.id)?;
    println!("\nForm analytics");
    println!(
        "- {} responses | avg {}/{} | {}% pass rate | avg time {}s",
        analytics.total_responses,
        analytics.avg_score,
        analytics.max_score,
        analytics.pass_rate,
        analytics.avg_time
    );
    println!(
        "- Distribution: {} excellent / {} good / {} fair / {} poor",
        analytics.score_distribution.excellent,
        analytics.score_distribution.good,
        analytics.score_distribution.fair,
        analytics.score_distribution.poor
    );
    for question in &analytics.questions {
        println!("{}", question_line(question));
    }

    let global = service.global_analytics(Utc::now())?;
    println!(
        "\nAcross {} forms: {} responses, {} in the last 7 days",
        global.total_forms, global.total_responses, global.recent_responses
    );

    let delivered = notifier.sent();
    if delivered.is_empty() {
        println!("Results delivery: not configured");
    } else {
        println!("Results delivery: {} notices", delivered.len());
        for notice in &delivered {
            println!("  - {} <- {}", notice.recipient, notice.subject());
        }
    }

    println!("\nCSV export");
    print!("{}", service.export_csv(&form.id)?);

    Ok(())
}

fn question_line(question: &QuestionAnalytics) -> String {
    format!(
        "  - [{}] {} ({}): {} answered | {}% accuracy | avg {}s",
        question.question_id,
        question.title,
        question.kind,
        question.answered,
        question.average_accuracy,
        question.timing.avg_time
    )
}

fn demo_form() -> Result<FormDraft, serde_json::Error> {
    Ok(FormDraft {
        title: "Solar system warm-up".to_string(),
        description: Some("Sort, fill in and read".to_string()),
        header_image: None,
        questions: serde_json::from_value(json!([
            {
                "id": "q-planets",
                "type": "categorize",
                "title": "Sort the planets",
                "points": 2,
                "data": {
                    "categories": ["Rocky", "Gas giant"],
                    "items": ["Mars", "Jupiter", "Venus", "Saturn"],
                    "correctMap": {
                        "Mars": "Rocky",
                        "Jupiter": "Gas giant",
                        "Venus": "Rocky",
                        "Saturn": "Gas giant"
                    }
                }
            },
            {
                "id": "q-sun",
                "type": "cloze",
                "title": "Complete the sentence",
                "points": 2,
                "data": {
                    "text": "The ___ is a star at the centre of the ___ system.",
                    "options": ["Sun", "Moon", "solar", "lunar"],
                    "answers": ["Sun", "solar"]
                }
            },
            {
                "id": "q-moon",
                "type": "comprehension",
                "title": "Read the passage",
                "data": {
                    "passage": "The Moon orbits Earth roughly every 27 days and has no atmosphere to speak of.",
                    "questions": [
                        { "question": "What does the Moon orbit?", "choices": ["Mars", "Earth", "Sun"], "correct": 1 },
                        { "question": "Does it have a thick atmosphere?", "choices": ["No", "Yes"], "correct": 0 }
                    ]
                }
            }
        ]))?,
        is_published: true,
        created_by: Some("demo".to_string()),
        settings: Default::default(),
    })
}

fn demo_submissions() -> Vec<Submission> {
    let entries = [
        (
            "Ada",
            json!({
                "q-planets": { "Mars": "Rocky", "Jupiter": "Gas giant", "Venus": "Rocky", "Saturn": "Gas giant" },
                "q-sun": ["sun", " Solar "],
                "q-moon": [1, 0]
            }),
            [("q-planets", 40), ("q-sun", 25), ("q-moon", 55)],
        ),
        (
            "Grace",
            json!({
                "q-planets": { "Mars": "Rocky", "Jupiter": "Rocky" },
                "q-sun": ["Moon", "solar"],
                "q-moon": { "0": 1 }
            }),
            [("q-planets", 70), ("q-sun", 35), ("q-moon", 80)],
        ),
        (
            "Ada",
            json!({ "q-sun": ["Sun"] }),
            [("q-planets", 0), ("q-sun", 10), ("q-moon", 0)],
        ),
    ];

    entries
        .into_iter()
        .map(|(name, answers, times)| Submission {
            answers: Some(answers),
            submitter_name: Some(name.to_string()),
            submitter_email: Some(format!("{}@example.com", name.to_ascii_lowercase())),
            time_spent: Some(times.iter().map(|(_, seconds)| *seconds).sum()),
            question_times: Some(
                times
                    .iter()
                    .map(|(id, seconds)| (id.to_string(), *seconds))
                    .collect(),
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_form_is_accepted_with_all_three_archetypes() {
        let (service, _) = demo_service();
        let form = service
            .create_form(demo_form().expect("demo form decodes"))
            .expect("demo form accepted");
        assert_eq!(form.questions.len(), 3);
        assert_eq!(form.max_score(), 5.0);
    }

    #[test]
    fn repeat_demo_submission_is_rejected() {
        let (service, notifier) = demo_service();
        let form = service
            .create_form(demo_form().expect("demo form decodes"))
            .expect("demo form accepted");

        let outcomes: Vec<_> = demo_submissions()
            .into_iter()
            .map(|submission| service.submit(&form.id, submission))
            .collect();

        let perfect = outcomes[0].as_ref().expect("first submission accepted");
        assert_eq!(perfect.score, 5.0);
        assert_eq!(perfect.percentage, 100);

        // categorize 1/4 of 2, cloze 1/2 of 2, comprehension 1/2 of 1
        let partial = outcomes[1].as_ref().expect("second submission accepted");
        assert_eq!(partial.score, 2.0);
        assert_eq!(partial.percentage, 40);

        assert!(outcomes[2].is_err());
        assert_eq!(notifier.sent().len(), 2);
    }

    fn demo_service() -> (
        FormService<InMemoryFormRepository, LoggingResultsNotifier>,
        Arc<LoggingResultsNotifier>,
    ) {
        let notifier = Arc::new(LoggingResultsNotifier::new(Some(
            "demo@example.com".to_string(),
        )));
        let service = FormService::new(
            Arc::new(InMemoryFormRepository::default()),
            notifier.clone(),
        );
        (service, notifier)
    }
}
