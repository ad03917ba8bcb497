use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::core::time::deserialize_option_datetime;
use crate::schemas::content::QuizQuestionResponse;

#[derive(Debug, Deserialize)]
pub(crate) struct QuizQuery {
    #[serde(default, alias = "topicIds", deserialize_with = "deserialize_id_list")]
    pub(crate) topic_ids: Vec<String>,
    #[serde(default)]
    pub(crate) limit: Option<i64>,
    #[serde(default)]
    pub(crate) offset: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuizPage {
    pub(crate) questions: Vec<QuizQuestionResponse>,
    pub(crate) has_more: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerRequest {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(alias = "selectedAnswer")]
    pub(crate) selected_answer: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnswerResponse {
    pub(crate) is_correct: bool,
    pub(crate) correct_answer: i32,
    pub(crate) explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatsQuery {
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub(crate) since: Option<PrimitiveDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TopicStats {
    pub(crate) topic_id: String,
    pub(crate) topic_name: String,
    pub(crate) total: i64,
    pub(crate) correct: i64,
    pub(crate) success_rate: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatsResponse {
    pub(crate) total: i64,
    pub(crate) correct: i64,
    pub(crate) wrong: i64,
    pub(crate) success_rate: i32,
    pub(crate) topics: Vec<TopicStats>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RankingQuery {
    #[serde(default)]
    pub(crate) limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RankingEntry {
    pub(crate) rank: i64,
    pub(crate) user_id: String,
    pub(crate) full_name: String,
    pub(crate) city: Option<String>,
    pub(crate) correct: i64,
    pub(crate) total: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RankingResponse {
    pub(crate) exam_id: String,
    pub(crate) entries: Vec<RankingEntry>,
    pub(crate) me: Option<RankingEntry>,
}

/// `a,b,c` as sent in a query string; blanks are dropped.
fn deserialize_id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_ids_split_on_commas() {
        let query: QuizQuery =
            serde_json::from_value(serde_json::json!({"topicIds": "a, b,,c", "limit": 5})).unwrap();
        assert_eq!(query.topic_ids, vec!["a", "b", "c"]);
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.offset, 0);

        let query: QuizQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(query.topic_ids.is_empty());
    }
}
