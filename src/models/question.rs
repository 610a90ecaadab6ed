use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub test_id: Uuid,
    pub position: i32,
    pub text: String,
    pub is_text_answer: bool,
    pub is_multiple_choice: bool,
    pub correct_text_answer: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    SingleChoice,
    MultipleChoice,
}

impl Question {
    /// `is_multiple_choice` only matters for choice questions.
    pub fn kind(&self) -> QuestionKind {
        if self.is_text_answer {
            QuestionKind::Text
        } else if self.is_multiple_choice {
            QuestionKind::MultipleChoice
        } else {
            QuestionKind::SingleChoice
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnswerOption {
    pub id: i64,
    pub question_id: i64,
    pub position: i32,
    pub text: String,
    pub is_correct: bool,
}

/// A question loaded together with its ordered options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<AnswerOption>,
}

impl QuestionWithOptions {
    pub fn correct_option_ids(&self) -> Vec<i64> {
        self.options
            .iter()
            .filter(|o| o.is_correct)
            .map(|o| o.id)
            .collect()
    }

    pub fn has_option(&self, option_id: i64) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }
}

/// Student-facing view of a question: no correctness data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub options: Vec<PublicOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicOption {
    pub id: i64,
    pub text: String,
}

impl From<&QuestionWithOptions> for PublicQuestion {
    fn from(q: &QuestionWithOptions) -> Self {
        Self {
            id: q.question.id,
            text: q.question.text.clone(),
            kind: q.question.kind(),
            image_url: q.question.image_url.clone(),
            options: q
                .options
                .iter()
                .map(|o| PublicOption {
                    id: o.id,
                    text: o.text.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> QuestionWithOptions {
        QuestionWithOptions {
            question: Question {
                id: 7,
                test_id: Uuid::new_v4(),
                position: 0,
                text: "Which river is shown?".into(),
                is_text_answer: false,
                is_multiple_choice: false,
                correct_text_answer: None,
                image_url: Some("https://cdn.example.com/river.png".into()),
            },
            options: vec![
                AnswerOption {
                    id: 1,
                    question_id: 7,
                    position: 0,
                    text: "Volga".into(),
                    is_correct: true,
                },
                AnswerOption {
                    id: 2,
                    question_id: 7,
                    position: 1,
                    text: "Danube".into(),
                    is_correct: false,
                },
            ],
        }
    }

    #[test]
    fn public_view_keeps_image_and_hides_correctness() {
        let public = PublicQuestion::from(&question());
        assert_eq!(public.kind, QuestionKind::SingleChoice);
        assert_eq!(
            public.image_url.as_deref(),
            Some("https://cdn.example.com/river.png")
        );
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("is_correct"));
    }

    #[test]
    fn public_view_omits_missing_image() {
        let mut q = question();
        q.question.image_url = None;
        let json = serde_json::to_value(PublicQuestion::from(&q)).unwrap();
        assert!(json.get("image_url").is_none());
    }
}
