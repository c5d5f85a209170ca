use anyhow::{Context, Result};
use chrono::Local;
use stargazer_etl::{Config, IngestPipeline, IngestRequest};

pub async fn run_ingest(config: &Config, request: IngestRequest, thumbs: bool) -> Result<()> {
    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }

    let pipeline = IngestPipeline::new(config)?.with_thumbs(thumbs);
    let today = Local::now().date_naive();

    let report = pipeline.run(request, today).await?;

    println!("\n✓ Ingest complete\n");
    println!(
        "  Range:    {} ({} days)",
        report.range,
        report.range.len_days()
    );
    println!("  Fetched:  {}", report.fetched);
    if report.dropped > 0 {
        println!("  Dropped:  {} (missing date or title)", report.dropped);
    }
    println!("  Stored:   {}", report.stored);
    println!("  Database: {}", pipeline.store().path().display());

    Ok(())
}
