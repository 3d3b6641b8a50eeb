use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier wrapper for authored forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FormId(pub String);

/// Identifier of a question, unique within its form and used to correlate answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(pub String);

/// Identifier wrapper for stored submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResponseId(pub String);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three question archetypes a form can be composed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Categorize,
    Cloze,
    Comprehension,
}

impl QuestionKind {
    pub const fn label(self) -> &'static str {
        match self {
            QuestionKind::Categorize => "categorize",
            QuestionKind::Cloze => "cloze",
            QuestionKind::Comprehension => "comprehension",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Items that must be sorted into categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizeKey {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
    /// Item label to correct category label. Its keys are the scoreable items;
    /// entries without a string category are dropped on decode.
    #[serde(default, deserialize_with = "defined_categories")]
    pub correct_map: BTreeMap<String, String>,
}

/// Fill-in-the-blank text with positionally significant expected answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClozeKey {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub answers: Vec<String>,
}

/// Reading passage followed by multiple-choice sub-questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComprehensionKey {
    #[serde(default)]
    pub passage: String,
    #[serde(default, rename = "questions", alias = "subQuestions")]
    pub sub_questions: Vec<SubQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub choices: Vec<String>,
    /// Any JSON number. Non-numeric values decode as `None` and never match.
    #[serde(
        default,
        rename = "correct",
        alias = "correctChoiceIndex",
        deserialize_with = "numeric_choice",
        serialize_with = "serialize_choice",
        skip_serializing_if = "Option::is_none"
    )]
    pub correct_choice_index: Option<f64>,
}

fn defined_categories<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(item, category)| match category {
            Value::String(category) => Some((item, category)),
            _ => None,
        })
        .collect())
}

fn numeric_choice<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_f64))
}

/// Whole-number choices are written back as integers.
pub(crate) fn serialize_choice<S>(choice: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match choice {
        Some(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
            serializer.serialize_some(&(*value as i64))
        }
        other => other.serialize(serializer),
    }
}

/// Kind-specific correct-answer data authored with a question.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerKey {
    Categorize(CategorizeKey),
    Cloze(ClozeKey),
    Comprehension(ComprehensionKey),
    /// Stored data that does not decode for its declared kind. Kept verbatim so
    /// the form still loads and the question can be isolated during scoring.
    Malformed {
        kind: QuestionKind,
        raw: Value,
        reason: String,
    },
}

impl AnswerKey {
    pub fn kind(&self) -> QuestionKind {
        match self {
            AnswerKey::Categorize(_) => QuestionKind::Categorize,
            AnswerKey::Cloze(_) => QuestionKind::Cloze,
            AnswerKey::Comprehension(_) => QuestionKind::Comprehension,
            AnswerKey::Malformed { kind, .. } => *kind,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, AnswerKey::Malformed { .. })
    }

    fn decode(kind: QuestionKind, data: Value) -> Self {
        // Absent data decodes as an empty key of the declared kind.
        let payload = if data.is_null() {
            Value::Object(Map::new())
        } else {
            data.clone()
        };

        let decoded = match kind {
            QuestionKind::Categorize => serde_json::from_value(payload).map(AnswerKey::Categorize),
            QuestionKind::Cloze => serde_json::from_value(payload).map(AnswerKey::Cloze),
            QuestionKind::Comprehension => {
                serde_json::from_value(payload).map(AnswerKey::Comprehension)
            }
        };

        decoded.unwrap_or_else(|err| AnswerKey::Malformed {
            kind,
            raw: data,
            reason: err.to_string(),
        })
    }

    fn encode(&self) -> Value {
        let encoded = match self {
            AnswerKey::Categorize(key) => serde_json::to_value(key),
            AnswerKey::Cloze(key) => serde_json::to_value(key),
            AnswerKey::Comprehension(key) => serde_json::to_value(key),
            AnswerKey::Malformed { raw, .. } => return raw.clone(),
        };
        encoded.unwrap_or(Value::Null)
    }
}

/// A single question inside a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "QuestionWire", into = "QuestionWire")]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    pub image: Option<String>,
    pub points: Option<f64>,
    pub feedback: Option<String>,
    pub answer_key: AnswerKey,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        self.answer_key.kind()
    }

    /// Weight of the question in the form total. Unset or unusable weights count as 1.
    pub fn points(&self) -> f64 {
        match self.points {
            Some(points) if points.is_finite() && points > 0.0 => points,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuestionWire {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    kind: QuestionKind,
    #[serde(default)]
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feedback: Option<String>,
    #[serde(default)]
    data: Value,
}

impl From<QuestionWire> for Question {
    fn from(wire: QuestionWire) -> Self {
        Self {
            id: QuestionId(wire.id),
            title: wire.title,
            image: wire.image,
            points: wire.points,
            feedback: wire.feedback,
            answer_key: AnswerKey::decode(wire.kind, wire.data),
        }
    }
}

impl From<Question> for QuestionWire {
    fn from(question: Question) -> Self {
        Self {
            kind: question.kind(),
            data: question.answer_key.encode(),
            id: question.id.0,
            title: question.title,
            image: question.image,
            points: question.points,
            feedback: question.feedback,
        }
    }
}

/// Respondent-facing behavior toggles for a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSettings {
    #[serde(default)]
    pub allow_multiple_submissions: bool,
    #[serde(default = "default_true")]
    pub show_correct_answers: bool,
    /// Minutes allowed to complete the form, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            allow_multiple_submissions: false,
            show_correct_answers: true,
            time_limit: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Create/update payload for a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_image: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub settings: FormSettings,
}

/// Stored form document. Questions only exist inside a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: FormId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_image: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub settings: FormSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Form {
    pub fn from_draft(id: FormId, draft: FormDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            header_image: draft.header_image,
            questions: draft.questions,
            is_published: draft.is_published,
            created_by: draft.created_by,
            settings: draft.settings,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sum of question weights, the denominator of every submission.
    pub fn max_score(&self) -> f64 {
        self.questions.iter().map(Question::points).sum()
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| &question.id == id)
    }
}

/// Raw respondent submission as received from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub answers: Option<Value>,
    #[serde(default)]
    pub submitter_name: Option<String>,
    #[serde(default)]
    pub submitter_email: Option<String>,
    #[serde(default)]
    pub time_spent: Option<i64>,
    #[serde(default)]
    pub question_times: Option<BTreeMap<String, i64>>,
}

/// Submission after intake validation.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedSubmission {
    pub answers: Map<String, Value>,
    pub submitter_name: String,
    pub submitter_email: String,
    pub time_spent: u64,
    pub question_times: BTreeMap<String, u64>,
}

/// Point-in-time record of one submission. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
    pub id: ResponseId,
    pub form_id: FormId,
    pub answers: Map<String, Value>,
    pub score: f64,
    pub max_score: f64,
    pub submitted_at: DateTime<Utc>,
    pub submitter_email: String,
    pub submitter_name: String,
    pub time_spent: u64,
    #[serde(default)]
    pub question_times: BTreeMap<String, u64>,
}

impl FormResponse {
    /// Ratio of score to max score, 0 for forms without weight.
    pub fn ratio(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score
        } else {
            0.0
        }
    }

    pub fn answer(&self, id: &QuestionId) -> Option<&Value> {
        self.answers.get(&id.0).filter(|value| !value.is_null())
    }
}

/// Acknowledgement returned to the respondent after a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: ResponseId,
    pub score: f64,
    pub max_score: f64,
    pub percentage: u32,
    pub submitted_at: DateTime<Utc>,
}
