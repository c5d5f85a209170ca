use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::path::Path;
use stargazer_etl::{write_photos, ApiClient, Config, MarsClient};

pub async fn run_mars(
    config: &Config,
    date: Option<NaiveDate>,
    rover: &str,
    output: &Path,
) -> Result<()> {
    let earth_date = date.unwrap_or_else(|| Local::now().date_naive());

    let api = ApiClient::new(config.retry_policy())?;
    let client = MarsClient::new(api, &config.base_url, config.api_key_or_demo());

    let photos = client.fetch_photos(rover, earth_date).await?;
    write_photos(output, &photos)?;

    println!(
        "✓ Wrote {} {} photos from {} to {}",
        photos.len(),
        rover,
        earth_date,
        output.display()
    );

    Ok(())
}
