#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = examprep_rust::run_backfill().await {
        eprintln!("examprep-backfill fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
