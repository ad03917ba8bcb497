use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Student,
    Instructor,
    Admin,
}

impl UserRole {
    pub(crate) fn is_staff(self) -> bool {
        matches!(self, Self::Instructor | Self::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "packagestatus", rename_all = "lowercase")]
pub(crate) enum PackageStatus {
    Pending,
    Active,
    Expired,
    Cancelled,
}

impl PackageStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "questiontype", rename_all = "snake_case")]
pub(crate) enum QuestionType {
    MultipleChoice,
    TrueFalse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "difficultylevel", rename_all = "lowercase")]
pub(crate) enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "materialkind", rename_all = "lowercase")]
pub(crate) enum MaterialKind {
    Article,
    Summary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_screaming_snake_case() {
        assert_eq!(serde_json::to_value(PackageStatus::Cancelled).unwrap(), "CANCELLED");
        assert_eq!(serde_json::to_value(QuestionType::MultipleChoice).unwrap(), "MULTIPLE_CHOICE");
        assert_eq!(serde_json::to_value(UserRole::Instructor).unwrap(), "INSTRUCTOR");
        let kind: MaterialKind = serde_json::from_value(serde_json::json!("SUMMARY")).unwrap();
        assert_eq!(kind, MaterialKind::Summary);
    }

    #[test]
    fn staff_roles() {
        assert!(UserRole::Admin.is_staff());
        assert!(UserRole::Instructor.is_staff());
        assert!(!UserRole::Student.is_staff());
    }
}
