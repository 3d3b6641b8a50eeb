use crate::infra::read_json;
use clap::Args;
use formsmith::error::AppError;
use formsmith::forms::{
    Form, FormDraft, FormId, PerformanceBand, QuestionStatus, ScoreCard, ScoringEngine,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Form document (JSON) holding the questions and their answer keys
    #[arg(long)]
    pub(crate) form: PathBuf,
    /// Answer payload (JSON), either `{"answers": {...}}` or the bare answer map
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Print the score card as JSON instead of a text summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreOutput<'a> {
    form_title: &'a str,
    performance: PerformanceBand,
    performance_label: &'static str,
    #[serde(flatten)]
    card: &'a ScoreCard,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    // Stored snapshots are scored as-is; malformed questions are isolated by the engine.
    let draft: FormDraft = read_json(&args.form)?;
    let form = Form::from_draft(FormId("local".to_string()), draft, Utc::now());

    let payload: Value = read_json(&args.answers)?;
    let answers = answer_map(payload);

    let card = ScoringEngine::default().score_form(&form, &answers);
    let performance = PerformanceBand::for_percentage(card.percentage);

    if args.json {
        let output = ScoreOutput {
            form_title: &form.title,
            performance,
            performance_label: performance.label(),
            card: &card,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", render_card(&form, &card, performance));
    Ok(())
}

/// Unwrap `{"answers": {...}}`; anything else that is an object is taken as the answer map.
pub(crate) fn answer_map(payload: Value) -> Map<String, Value> {
    match payload {
        Value::Object(mut body) => match body.remove("answers") {
            Some(Value::Object(answers)) => answers,
            Some(_) => Map::new(),
            None => body,
        },
        _ => Map::new(),
    }
}

pub(crate) fn render_card(form: &Form, card: &ScoreCard, performance: PerformanceBand) -> String {
    let mut lines = vec![
        format!("Score for \"{}\"", form.title),
        format!(
            "- {}/{} points ({}%) - {}",
            card.score,
            card.max_score,
            card.percentage,
            performance.label()
        ),
    ];

    for question in &card.questions {
        let title = form
            .question(&question.question_id)
            .map(|found| found.title.as_str())
            .unwrap_or_default();
        let status = match question.status {
            QuestionStatus::Answered => "answered",
            QuestionStatus::Unanswered => "unanswered",
            QuestionStatus::Failed => "not scoreable",
        };
        lines.push(format!(
            "  - [{}] {} ({}): {:.2}/{} {}",
            question.question_id, title, question.kind, question.earned, question.points, status
        ));
    }

    lines.join("\n")
}
