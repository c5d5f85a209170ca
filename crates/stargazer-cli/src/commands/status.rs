use anyhow::Result;
use chrono::Days;
use stargazer_core::schema::Database;
use std::path::Path;

/// Days of entries listed under "Latest".
const RECENT_DAYS: u64 = 5;

pub fn show_status(db_path: &Path) -> Result<()> {
    println!("\n📊 Stargazer Status\n");
    println!("  Database: {}", db_path.display());

    if !db_path.exists() {
        println!("  No database yet.");
        println!("\n  Run `stargazer ingest` to fetch entries");
        return Ok(());
    }

    let db = Database::open(db_path)?;
    let count = db.count_entries()?;
    println!("  Entries: {count}");

    let Some(span) = db.date_span()? else {
        return Ok(());
    };
    println!("  Span: {} to {}", span.first, span.last);

    let media_types = db.media_type_counts()?;
    if !media_types.is_empty() {
        println!("\n  By media type:");
        for (media_type, n) in media_types {
            println!("    {:<10} {n}", media_type.as_deref().unwrap_or("<unknown>"));
        }
    }

    let since = span
        .last
        .checked_sub_days(Days::new(RECENT_DAYS - 1))
        .unwrap_or(span.first);
    let recent = db.list_entries(since, span.last)?;
    println!("\n  Latest:");
    for stored in recent.iter().rev() {
        println!("    {}  {}", stored.entry.date, stored.entry.title);
    }

    Ok(())
}
