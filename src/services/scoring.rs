use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AttemptScore {
    pub(crate) score: i32,
    pub(crate) total: i32,
    pub(crate) percentage: i32,
}

/// Scores a timed attempt against its answer key. Questions missing from `answers` count as
/// wrong; answers for questions outside the key are ignored.
pub(crate) fn score_attempt<'a, I>(answer_key: I, answers: &HashMap<String, i32>) -> AttemptScore
where
    I: IntoIterator<Item = (&'a str, i32)>,
{
    let mut score = 0;
    let mut total = 0;
    for (question_id, correct_answer) in answer_key {
        total += 1;
        if answers.get(question_id) == Some(&correct_answer) {
            score += 1;
        }
    }

    AttemptScore { score, total, percentage: percentage(score.into(), total.into()) }
}

/// Rounded share of `score` in `total`, in whole percent; zero when nothing was counted.
pub(crate) fn percentage(score: i64, total: i64) -> i32 {
    if total <= 0 {
        return 0;
    }
    (score as f64 / total as f64 * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, i32)]) -> HashMap<String, i32> {
        pairs.iter().map(|(id, answer)| (id.to_string(), *answer)).collect()
    }

    #[test]
    fn missing_answers_count_as_incorrect() {
        let key = [("q1", 0), ("q2", 3), ("q3", 1)];
        let result = score_attempt(key, &answers(&[("q1", 0), ("q3", 2)]));
        assert_eq!(result, AttemptScore { score: 1, total: 3, percentage: 33 });
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn empty_key_scores_zero_without_dividing() {
        let result = score_attempt(std::iter::empty(), &answers(&[("q1", 0)]));
        assert_eq!(result, AttemptScore { score: 0, total: 0, percentage: 0 });
    }

    #[test]
    fn answers_outside_the_key_are_ignored() {
        let key = [("q1", 2)];
        let result = score_attempt(key, &answers(&[("q1", 2), ("foreign", 0)]));
        assert_eq!(result, AttemptScore { score: 1, total: 1, percentage: 100 });
    }
}
