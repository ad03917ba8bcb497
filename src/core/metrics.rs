use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_package_transition(action: &'static str) {
    metrics::counter!("package_transitions_total", "action" => action).increment(1);
}

pub(crate) fn record_answer(is_correct: bool) {
    let outcome = if is_correct { "correct" } else { "wrong" };
    metrics::counter!("quiz_answers_total", "outcome" => outcome).increment(1);
}

pub(crate) fn record_practice_submission(percentage: i32) {
    metrics::counter!("practice_exam_submissions_total").increment(1);
    metrics::histogram!("practice_exam_percentage").record(f64::from(percentage));
}
