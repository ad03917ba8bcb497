//! Fills `topic_id`/`exam_id` on answer rows recorded before those columns existed.

use sqlx::PgPool;

use crate::repositories;

const BATCH_SIZE: i64 = 500;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BackfillReport {
    pub(crate) scanned: u64,
    pub(crate) updated: u64,
    pub(crate) skipped: u64,
    pub(crate) failed: u64,
}

/// Walks every unscoped result once, in id order. A row whose question no longer exists is
/// skipped; a row that fails to update is counted and the run continues.
pub(crate) async fn run(pool: &PgPool) -> Result<BackfillReport, sqlx::Error> {
    let mut report = BackfillReport::default();
    let mut cursor: Option<String> = None;

    loop {
        let batch =
            repositories::exam_results::list_missing_scope(pool, cursor.as_deref(), BATCH_SIZE)
                .await?;
        let Some(last) = batch.last() else {
            break;
        };
        cursor = Some(last.id.clone());

        for row in &batch {
            report.scanned += 1;
            let Some(question_id) = row.question_id.as_deref() else {
                report.skipped += 1;
                tracing::debug!(result_id = %row.id, "Result has no question; skipping");
                continue;
            };

            match repositories::exam_results::fill_scope_from_question(pool, &row.id, question_id)
                .await
            {
                Ok(true) => report.updated += 1,
                Ok(false) => {
                    report.skipped += 1;
                    tracing::debug!(
                        result_id = %row.id,
                        question_id = %question_id,
                        "Question no longer exists; skipping"
                    );
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(error = %err, result_id = %row.id, "Failed to backfill result scope");
                }
            }
        }

        tracing::info!(
            scanned = report.scanned,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "Backfill batch processed"
        );

        if (batch.len() as i64) < BATCH_SIZE {
            break;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::core::time::primitive_now_utc;
    use crate::db::types::UserRole;
    use crate::test_support;

    #[tokio::test]
    async fn backfill_fills_scope_and_skips_orphans() {
        let ctx = test_support::setup_test_context().await;
        let pool = ctx.state.db();
        let user = test_support::insert_user(pool, "student@example.com", UserRole::Student).await;
        let exam = test_support::insert_exam(pool, "adalet-gys", true).await;
        let topic = test_support::insert_topic(pool, &exam.id, "Anayasa").await;
        let question = test_support::insert_question(pool, &topic.id).await;

        let now = primitive_now_utc();
        for question_id in [Some(question.id.as_str()), None] {
            sqlx::query(
                "INSERT INTO exam_results (id, user_id, question_id, selected_answer, is_correct, answered_at)
                 VALUES ($1, $2, $3, 0, TRUE, $4)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&user.id)
            .bind(question_id)
            .bind(now)
            .execute(pool)
            .await
            .expect("insert legacy result");
        }

        let report = run(pool).await.expect("backfill");
        assert_eq!(report, BackfillReport { scanned: 2, updated: 1, skipped: 1, failed: 0 });

        let scoped: (Option<String>, Option<String>) = sqlx::query_as(
            "SELECT topic_id, exam_id FROM exam_results WHERE question_id = $1",
        )
        .bind(&question.id)
        .fetch_one(pool)
        .await
        .expect("scoped row");
        assert_eq!(scoped, (Some(topic.id.clone()), Some(exam.id.clone())));

        let second = run(pool).await.expect("second run");
        assert_eq!(second.updated, 0);
        assert_eq!(second.skipped, 1);
    }
}
