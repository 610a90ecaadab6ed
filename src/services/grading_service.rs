use crate::models::grading_scheme::{grade_for, Grade, GradingScheme};
use crate::models::question::{QuestionKind, QuestionWithOptions};
use crate::models::student_answer::StudentAnswer;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeSet, HashMap};

/// A student's response to one question, normalized from the raw request value.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Text(String),
    Choices(Vec<i64>),
}

impl Submission {
    /// Text questions take the first submitted value. Choice questions keep every value
    /// that is a plain decimal id of one of the question's options; anything else counts
    /// as not selected. Duplicates collapse to one selection.
    pub fn from_raw(question: &QuestionWithOptions, raw: Option<&JsonValue>) -> Self {
        let values = raw_values(raw);
        match question.question.kind() {
            QuestionKind::Text => Submission::Text(values.into_iter().next().unwrap_or_default()),
            QuestionKind::SingleChoice | QuestionKind::MultipleChoice => {
                let mut seen = BTreeSet::new();
                let ids = values
                    .iter()
                    .filter_map(|v| parse_option_id(v))
                    .filter(|id| question.has_option(*id))
                    .filter(|id| seen.insert(*id))
                    .collect();
                Submission::Choices(ids)
            }
        }
    }
}

fn raw_values(raw: Option<&JsonValue>) -> Vec<String> {
    fn scalar(v: &JsonValue) -> Option<String> {
        match v {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    match raw {
        Some(JsonValue::Array(items)) => items.iter().filter_map(scalar).collect(),
        Some(v) => scalar(v).into_iter().collect(),
        None => Vec::new(),
    }
}

fn parse_option_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

pub fn normalize_text(value: &str) -> String {
    value.trim().to_lowercase()
}

/// 1 when the normalized texts match. A missing correct answer compares as empty.
pub fn score_text(submitted: &str, correct: Option<&str>) -> f64 {
    if normalize_text(submitted) == normalize_text(correct.unwrap_or_default()) {
        1.0
    } else {
        0.0
    }
}

/// Returns (|S ∩ C|, |S − C|).
pub fn selection_counts(selected: &[i64], correct: &[i64]) -> (usize, usize) {
    let selected: BTreeSet<i64> = selected.iter().copied().collect();
    let correct: BTreeSet<i64> = correct.iter().copied().collect();
    (
        selected.intersection(&correct).count(),
        selected.difference(&correct).count(),
    )
}

/// 1 only for exactly one selection that is a correct option.
pub fn score_single(selected: &[i64], correct: &[i64]) -> f64 {
    match selected {
        [only] if correct.contains(only) => 1.0,
        _ => 0.0,
    }
}

/// Partial credit: each wrong pick cancels one right pick, floored at zero and
/// normalized by the number of correct options. No correct options scores 0.
pub fn score_multiple(selected: &[i64], correct: &[i64]) -> f64 {
    let total_correct = correct.iter().collect::<BTreeSet<_>>().len();
    if total_correct == 0 {
        return 0.0;
    }
    let (correct_selected, incorrect_selected) = selection_counts(selected, correct);
    correct_selected.saturating_sub(incorrect_selected) as f64 / total_correct as f64
}

/// Per-question breakdown handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub question_id: i64,
    pub kind: QuestionKind,
    pub score: f64,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    pub selected_ids: Vec<i64>,
    pub correct_ids: Vec<i64>,
    pub correct_selected: usize,
    pub incorrect_selected: usize,
}

/// A row to persist in `student_answers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerRecord {
    pub question_id: i64,
    pub selected_option_id: Option<i64>,
    pub answer_text: Option<String>,
    pub is_correct: bool,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub raw_score: f64,
    pub question_count: usize,
    pub percentage: i32,
    pub fully_correct: usize,
}

/// Integer percentage of `raw_score` over `question_count`.
///
/// Halves round to the nearest even integer (12.5 -> 12, 37.5 -> 38). An empty test
/// scores 0.
pub fn percentage(raw_score: f64, question_count: usize) -> i32 {
    if question_count == 0 {
        return 0;
    }
    (raw_score / question_count as f64 * 100.0).round_ties_even() as i32
}

pub fn aggregate(scores: &[f64]) -> Totals {
    let raw_score: f64 = scores.iter().sum();
    Totals {
        raw_score,
        question_count: scores.len(),
        percentage: percentage(raw_score, scores.len()),
        fully_correct: scores.iter().filter(|s| **s == 1.0).count(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub raw_score: f64,
    pub question_count: usize,
    pub incorrect: f64,
    pub percentage: i32,
    pub fully_correct: usize,
    pub grade: Grade,
    pub questions: Vec<QuestionResult>,
}

impl TestOutcome {
    fn from_results(questions: Vec<QuestionResult>, scheme: Option<&GradingScheme>) -> Self {
        let scores: Vec<f64> = questions.iter().map(|q| q.score).collect();
        let totals = aggregate(&scores);
        Self {
            raw_score: totals.raw_score,
            question_count: totals.question_count,
            incorrect: totals.question_count as f64 - totals.raw_score,
            percentage: totals.percentage,
            fully_correct: totals.fully_correct,
            grade: grade_for(totals.percentage, scheme),
            questions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GradedSubmission {
    pub outcome: TestOutcome,
    pub records: Vec<AnswerRecord>,
}

pub struct GradingService;

impl GradingService {
    pub fn score_question(
        question: &QuestionWithOptions,
        submission: &Submission,
    ) -> (QuestionResult, Vec<AnswerRecord>) {
        let question_id = question.question.id;
        let kind = question.question.kind();

        if kind == QuestionKind::Text {
            let submitted = match submission {
                Submission::Text(text) => normalize_text(text),
                Submission::Choices(_) => String::new(),
            };
            let score = score_text(&submitted, question.question.correct_text_answer.as_deref());
            let result = QuestionResult {
                question_id,
                kind,
                score,
                is_correct: score == 1.0,
                answer_text: Some(submitted.clone()),
                selected_ids: Vec::new(),
                correct_ids: Vec::new(),
                correct_selected: 0,
                incorrect_selected: 0,
            };
            let record = AnswerRecord {
                question_id,
                selected_option_id: None,
                answer_text: Some(submitted),
                is_correct: score == 1.0,
                score,
            };
            return (result, vec![record]);
        }

        let selected: &[i64] = match submission {
            Submission::Choices(ids) => ids.as_slice(),
            Submission::Text(_) => &[],
        };
        let correct_ids = question.correct_option_ids();
        let (correct_selected, incorrect_selected) = selection_counts(selected, &correct_ids);

        let (score, records) = if kind == QuestionKind::MultipleChoice {
            let score = score_multiple(selected, &correct_ids);
            let records = selected
                .iter()
                .map(|id| {
                    let is_correct = correct_ids.contains(id);
                    AnswerRecord {
                        question_id,
                        selected_option_id: Some(*id),
                        answer_text: None,
                        is_correct,
                        score: if is_correct { score } else { 0.0 },
                    }
                })
                .collect();
            (score, records)
        } else {
            let score = score_single(selected, &correct_ids);
            let records = selected
                .first()
                .map(|id| AnswerRecord {
                    question_id,
                    selected_option_id: Some(*id),
                    answer_text: None,
                    is_correct: correct_ids.contains(id),
                    score,
                })
                .into_iter()
                .collect();
            (score, records)
        };

        let result = QuestionResult {
            question_id,
            kind,
            score,
            is_correct: score == 1.0,
            answer_text: None,
            selected_ids: selected.to_vec(),
            correct_ids,
            correct_selected,
            incorrect_selected,
        };
        (result, records)
    }

    /// Scores every question of a test against the raw answer map and grades the total.
    /// Questions without an entry in `answers` score 0.
    pub fn grade_submission(
        questions: &[QuestionWithOptions],
        answers: &HashMap<i64, JsonValue>,
        scheme: Option<&GradingScheme>,
    ) -> GradedSubmission {
        let mut results = Vec::with_capacity(questions.len());
        let mut records = Vec::new();

        for question in questions {
            let submission = Submission::from_raw(question, answers.get(&question.question.id));
            let (result, mut question_records) = Self::score_question(question, &submission);
            results.push(result);
            records.append(&mut question_records);
        }

        GradedSubmission {
            outcome: TestOutcome::from_results(results, scheme),
            records,
        }
    }

    /// Rebuilds an outcome from persisted answer rows. Each question's score is the
    /// score stored at submission time; the grade comes from `scheme` as it is now.
    pub fn rebuild_outcome(
        questions: &[QuestionWithOptions],
        rows: &[StudentAnswer],
        scheme: Option<&GradingScheme>,
    ) -> TestOutcome {
        let results = questions
            .iter()
            .map(|question| {
                let question_id = question.question.id;
                let kind = question.question.kind();
                let answers: Vec<&StudentAnswer> =
                    rows.iter().filter(|r| r.question_id == question_id).collect();
                let score = answers
                    .iter()
                    .map(|a| a.score)
                    .fold(0.0_f64, f64::max)
                    .clamp(0.0, 1.0);

                if kind == QuestionKind::Text {
                    return QuestionResult {
                        question_id,
                        kind,
                        score,
                        is_correct: score == 1.0,
                        answer_text: answers.first().and_then(|a| a.answer_text.clone()),
                        selected_ids: Vec::new(),
                        correct_ids: Vec::new(),
                        correct_selected: 0,
                        incorrect_selected: 0,
                    };
                }

                let selected_ids: Vec<i64> =
                    answers.iter().filter_map(|a| a.selected_option_id).collect();
                let correct_ids = question.correct_option_ids();
                let (correct_selected, incorrect_selected) =
                    selection_counts(&selected_ids, &correct_ids);
                QuestionResult {
                    question_id,
                    kind,
                    score,
                    is_correct: score == 1.0,
                    answer_text: None,
                    selected_ids,
                    correct_ids,
                    correct_selected,
                    incorrect_selected,
                }
            })
            .collect();

        TestOutcome::from_results(results, scheme)
    }
}
