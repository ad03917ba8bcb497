use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Exam, Question, Topic, TopicMaterial};
use crate::db::types::{DifficultyLevel, MaterialKind, QuestionType};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) code: String,
    pub(crate) description: Option<String>,
    pub(crate) price: f64,
    pub(crate) is_active: bool,
    pub(crate) features: Vec<String>,
    pub(crate) badge: Option<String>,
    pub(crate) created_at: String,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam) -> Self {
        Self {
            id: exam.id,
            name: exam.name,
            code: exam.code,
            description: exam.description,
            price: exam.price,
            is_active: exam.is_active,
            features: exam.features.0,
            badge: exam.badge,
            created_at: format_primitive(exam.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, max = 64, message = "code must not be empty"))]
    pub(crate) code: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[validate(range(min = 0.0, message = "price must be non-negative"))]
    pub(crate) price: f64,
    #[serde(default = "default_true")]
    #[serde(alias = "isActive")]
    pub(crate) is_active: bool,
    #[serde(default)]
    pub(crate) features: Vec<String>,
    #[serde(default)]
    pub(crate) badge: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "code must not be empty"))]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "price must be non-negative"))]
    pub(crate) price: Option<f64>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
    #[serde(default)]
    pub(crate) features: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) badge: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExamListQuery {
    #[serde(default)]
    #[serde(alias = "includeInactive")]
    pub(crate) include_inactive: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TopicResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) order_index: i32,
}

impl TopicResponse {
    pub(crate) fn from_db(topic: Topic) -> Self {
        Self {
            id: topic.id,
            exam_id: topic.exam_id,
            name: topic.name,
            description: topic.description,
            order_index: topic.order_index,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TopicCreate {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TopicUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: Option<i32>,
}

/// Study-mode view of a question, answer included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) topic_id: String,
    pub(crate) question_type: QuestionType,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: i32,
    pub(crate) explanation: Option<String>,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) is_previous_exam: bool,
    pub(crate) order_index: i32,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            topic_id: question.topic_id,
            question_type: question.question_type,
            text: question.text,
            options: question.options.0,
            correct_answer: question.correct_answer,
            explanation: question.explanation,
            difficulty: question.difficulty,
            is_previous_exam: question.is_previous_exam,
            order_index: question.order_index,
        }
    }
}

/// Quiz view of a question: nothing that gives the answer away.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuizQuestionResponse {
    pub(crate) id: String,
    pub(crate) topic_id: String,
    pub(crate) question_type: QuestionType,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) is_previous_exam: bool,
}

impl QuizQuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            topic_id: question.topic_id,
            question_type: question.question_type,
            text: question.text,
            options: question.options.0,
            difficulty: question.difficulty,
            is_previous_exam: question.is_previous_exam,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "questionType")]
    pub(crate) question_type: QuestionType,
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: i32,
    #[serde(default)]
    pub(crate) explanation: Option<String>,
    #[serde(default = "default_difficulty")]
    pub(crate) difficulty: DifficultyLevel,
    #[serde(default)]
    #[serde(alias = "isPreviousExam")]
    pub(crate) is_previous_exam: bool,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    #[serde(alias = "questionType")]
    pub(crate) question_type: Option<QuestionType>,
    #[serde(default)]
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) options: Option<Vec<String>>,
    #[serde(default)]
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: Option<i32>,
    #[serde(default)]
    pub(crate) explanation: Option<String>,
    #[serde(default)]
    pub(crate) difficulty: Option<DifficultyLevel>,
    #[serde(default)]
    #[serde(alias = "isPreviousExam")]
    pub(crate) is_previous_exam: Option<bool>,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MaterialResponse {
    pub(crate) id: String,
    pub(crate) topic_id: String,
    pub(crate) kind: MaterialKind,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) order_index: i32,
    pub(crate) updated_at: String,
}

impl MaterialResponse {
    pub(crate) fn from_db(material: TopicMaterial) -> Self {
        Self {
            id: material.id,
            topic_id: material.topic_id,
            kind: material.kind,
            title: material.title,
            content: material.content,
            order_index: material.order_index,
            updated_at: format_primitive(material.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MaterialCreate {
    pub(crate) kind: MaterialKind,
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: String,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaterialQuery {
    #[serde(default, deserialize_with = "deserialize_material_kind")]
    pub(crate) kind: Option<MaterialKind>,
}

/// Query strings use the lowercase form (`?kind=article`).
fn deserialize_material_kind<'de, D>(deserializer: D) -> Result<Option<MaterialKind>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("article") => Ok(Some(MaterialKind::Article)),
        Some(value) if value.eq_ignore_ascii_case("summary") => Ok(Some(MaterialKind::Summary)),
        Some(value) => Err(serde::de::Error::custom(format!("unknown material kind: {value}"))),
    }
}

fn default_true() -> bool {
    true
}

fn default_difficulty() -> DifficultyLevel {
    DifficultyLevel::Medium
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_kind_query_is_case_insensitive() {
        let query: MaterialQuery =
            serde_json::from_value(serde_json::json!({"kind": "Summary"})).unwrap();
        assert_eq!(query.kind, Some(MaterialKind::Summary));
        let query: MaterialQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(query.kind, None);
        assert!(serde_json::from_value::<MaterialQuery>(serde_json::json!({"kind": "video"})).is_err());
    }

    #[test]
    fn exam_create_rejects_negative_price() {
        let exam: ExamCreate = serde_json::from_value(serde_json::json!({
            "name": "Adalet GYS",
            "code": "adalet-gys",
            "price": -1.0
        }))
        .unwrap();
        assert!(exam.validate().is_err());
        assert!(exam.is_active);
    }
}
