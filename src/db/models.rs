use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{
    DifficultyLevel, MaterialKind, PackageStatus, QuestionType, UserRole,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) city: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) code: String,
    pub(crate) description: Option<String>,
    pub(crate) price: f64,
    pub(crate) is_active: bool,
    pub(crate) features: Json<Vec<String>>,
    pub(crate) badge: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Topic {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) topic_id: String,
    pub(crate) question_type: QuestionType,
    pub(crate) text: String,
    pub(crate) options: Json<Vec<String>>,
    pub(crate) correct_answer: i32,
    pub(crate) explanation: Option<String>,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) is_previous_exam: bool,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct TopicMaterial {
    pub(crate) id: String,
    pub(crate) topic_id: String,
    pub(crate) kind: MaterialKind,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct UserPackage {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) exam_id: String,
    pub(crate) status: PackageStatus,
    pub(crate) purchased_at: PrimitiveDateTime,
    pub(crate) activated_at: Option<PrimitiveDateTime>,
    pub(crate) expires_at: Option<PrimitiveDateTime>,
    pub(crate) payment_date: Option<PrimitiveDateTime>,
    pub(crate) payment_amount: Option<f64>,
    pub(crate) payment_method: Option<String>,
    pub(crate) transaction_id: Option<String>,
    pub(crate) payment_notes: Option<String>,
    pub(crate) admin_notes: Option<String>,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamResult {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) question_id: Option<String>,
    pub(crate) selected_answer: i32,
    pub(crate) is_correct: bool,
    pub(crate) topic_id: Option<String>,
    pub(crate) exam_id: Option<String>,
    pub(crate) answered_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct PracticeExam {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct PracticeExamResult {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) practice_exam_id: String,
    pub(crate) exam_id: String,
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: i32,
    pub(crate) answers: Json<HashMap<String, i32>>,
    pub(crate) review: Json<Vec<GradedQuestion>>,
    pub(crate) duration_seconds: Option<i32>,
    pub(crate) completed_at: PrimitiveDateTime,
}

/// One question of a practice attempt, frozen as it was graded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GradedQuestion {
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) selected_answer: Option<i32>,
    pub(crate) correct_answer: i32,
    #[serde(default)]
    pub(crate) explanation: Option<String>,
}

impl GradedQuestion {
    pub(crate) fn is_correct(&self) -> bool {
        self.selected_answer == Some(self.correct_answer)
    }
}
