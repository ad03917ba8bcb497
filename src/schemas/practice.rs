use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::GradedQuestion;
use crate::repositories::practice_exams::{PracticeExamSummary, PracticeResultRow};
use crate::schemas::content::QuizQuestionResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PracticeExamResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) is_active: bool,
    pub(crate) question_count: i64,
}

impl PracticeExamResponse {
    pub(crate) fn from_summary(summary: PracticeExamSummary) -> Self {
        let exam = summary.practice_exam;
        Self {
            id: exam.id,
            exam_id: exam.exam_id,
            title: exam.title,
            description: exam.description,
            duration_minutes: exam.duration_minutes,
            is_active: exam.is_active,
            question_count: summary.question_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PracticeExamStart {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) duration_minutes: i32,
    pub(crate) questions: Vec<QuizQuestionResponse>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PracticeSubmit {
    #[serde(default)]
    pub(crate) answers: HashMap<String, i32>,
    #[serde(default)]
    #[serde(alias = "durationSeconds")]
    #[validate(range(min = 0, message = "duration_seconds must be non-negative"))]
    pub(crate) duration_seconds: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PracticeExamCreate {
    #[serde(alias = "examId")]
    #[validate(length(min = 1, message = "exam_id must not be empty"))]
    pub(crate) exam_id: String,
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(default = "default_true")]
    #[serde(alias = "isActive")]
    pub(crate) is_active: bool,
    #[serde(alias = "questionIds")]
    #[validate(length(min = 1, max = 300, message = "question_ids must contain 1..300 items"))]
    pub(crate) question_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PracticeExamUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PracticeResultResponse {
    pub(crate) id: String,
    pub(crate) practice_exam_id: String,
    pub(crate) practice_exam_title: String,
    pub(crate) exam_id: String,
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: i32,
    pub(crate) duration_seconds: Option<i32>,
    pub(crate) completed_at: String,
}

impl PracticeResultResponse {
    pub(crate) fn from_row(row: &PracticeResultRow) -> Self {
        let result = &row.result;
        Self {
            id: result.id.clone(),
            practice_exam_id: result.practice_exam_id.clone(),
            practice_exam_title: row.practice_exam_title.clone(),
            exam_id: result.exam_id.clone(),
            score: result.score,
            total_questions: result.total_questions,
            percentage: result.percentage,
            duration_seconds: result.duration_seconds,
            completed_at: format_primitive(result.completed_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PracticeAnswerReview {
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) selected_answer: Option<i32>,
    pub(crate) correct_answer: i32,
    pub(crate) is_correct: bool,
    pub(crate) explanation: Option<String>,
}

impl PracticeAnswerReview {
    pub(crate) fn from_graded(graded: GradedQuestion) -> Self {
        Self {
            is_correct: graded.is_correct(),
            question_id: graded.question_id,
            text: graded.text,
            options: graded.options,
            selected_answer: graded.selected_answer,
            correct_answer: graded.correct_answer,
            explanation: graded.explanation,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PracticeResultDetail {
    #[serde(flatten)]
    pub(crate) summary: PracticeResultResponse,
    pub(crate) answers: Vec<PracticeAnswerReview>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PracticeExamListQuery {
    #[serde(default)]
    #[serde(alias = "examId")]
    pub(crate) exam_id: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_accepts_camel_case_and_missing_answers() {
        let submit: PracticeSubmit =
            serde_json::from_value(serde_json::json!({"durationSeconds": 600})).unwrap();
        assert!(submit.answers.is_empty());
        assert_eq!(submit.duration_seconds, Some(600));
        assert!(submit.validate().is_ok());
    }

    #[test]
    fn create_requires_questions() {
        let create: PracticeExamCreate = serde_json::from_value(serde_json::json!({
            "examId": "exam",
            "title": "Deneme 1",
            "durationMinutes": 90,
            "questionIds": []
        }))
        .unwrap();
        assert!(create.validate().is_err());
        assert!(create.is_active);
    }

    #[test]
    fn graded_question_review_reports_correctness() {
        let graded = GradedQuestion {
            question_id: "q1".to_string(),
            text: "Soru".to_string(),
            options: vec!["A".to_string(), "B".to_string()],
            selected_answer: None,
            correct_answer: 1,
            explanation: None,
        };
        let review = PracticeAnswerReview::from_graded(graded.clone());
        assert!(!review.is_correct);

        let answered = GradedQuestion { selected_answer: Some(1), ..graded };
        assert!(PracticeAnswerReview::from_graded(answered).is_correct);
    }

    #[test]
    fn update_accepts_partial_camel_case() {
        let update: PracticeExamUpdate =
            serde_json::from_value(serde_json::json!({"isActive": false})).unwrap();
        assert_eq!(update.is_active, Some(false));
        assert!(update.title.is_none());
        assert!(update.validate().is_ok());
    }
}
