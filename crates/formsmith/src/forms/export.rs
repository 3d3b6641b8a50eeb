use std::io::Write;

use serde_json::Value;

use super::domain::FormResponse;
use super::scoring::policy::percentage;

const FIXED_COLUMNS: [&str; 7] = [
    "Name",
    "Email",
    "Score",
    "Max Score",
    "Percentage",
    "Time Spent (seconds)",
    "Submitted At",
];

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(err) => write!(f, "failed to write response export: {}", err),
            ExportError::Csv(err) => write!(f, "failed to encode response export: {}", err),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(err) => Some(err),
            ExportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Write one quoted CSV row per response. Question columns are the answered
/// question ids in first-seen order.
pub fn responses_to_csv<W: Write>(
    responses: &[FormResponse],
    writer: W,
) -> Result<(), ExportError> {
    let question_ids = answered_question_ids(responses);

    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    let header = FIXED_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .chain(question_ids.iter().map(|id| format!("Question {id}")));
    csv_writer.write_record(header)?;

    for response in responses {
        let fixed = [
            response.submitter_name.clone(),
            response.submitter_email.clone(),
            response.score.to_string(),
            response.max_score.to_string(),
            format!("{}%", percentage(response.score, response.max_score)),
            response.time_spent.to_string(),
            response.submitted_at.to_rfc3339(),
        ];
        let answers = question_ids
            .iter()
            .map(|id| answer_cell(response.answers.get(id.as_str())));
        csv_writer.write_record(fixed.into_iter().chain(answers))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Render the export into an in-memory string.
pub fn responses_to_csv_string(responses: &[FormResponse]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    responses_to_csv(responses, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|err| ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))
}

fn answered_question_ids(responses: &[FormResponse]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for response in responses {
        for id in response.answers.keys() {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.clone());
            }
        }
    }
    ids
}

fn answer_cell(answer: Option<&Value>) -> String {
    match answer {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
