use crate::db::types::QuestionType;

/// Shape invariants shared by create and update: at least two non-blank options, a
/// true/false question has exactly two, and the answer index points inside the list.
pub(crate) fn validate_question_shape(
    question_type: QuestionType,
    options: &[String],
    correct_answer: i32,
) -> Result<(), String> {
    if options.len() < 2 {
        return Err("A question needs at least two options".to_string());
    }
    if question_type == QuestionType::TrueFalse && options.len() != 2 {
        return Err("A true/false question must have exactly two options".to_string());
    }
    if options.iter().any(|option| option.trim().is_empty()) {
        return Err("Options must not be blank".to_string());
    }
    if correct_answer < 0 || correct_answer as usize >= options.len() {
        return Err(format!(
            "correctAnswer must be between 0 and {}",
            options.len() - 1
        ));
    }
    Ok(())
}

pub(crate) fn answer_in_bounds(options: &[String], selected: i32) -> bool {
    selected >= 0 && (selected as usize) < options.len()
}
