use medtrack_client::{ApiClient, ClientConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ClientConfig::from_env()?;
    tracing::info!(base_url = %config.base_url, timeout = ?config.timeout, "using backend");
    let client = ApiClient::new(&config)?;

    if !client.health_check().await {
        anyhow::bail!("backend at {} is unavailable", config.base_url);
    }

    for symptom in client.list_symptoms().await? {
        let state = if symptom.is_active { "active" } else { "inactive" };
        println!("#{} {} [{state}]", symptom.id, symptom.name);
        for stage in &symptom.stages {
            println!("  {}", stage.name);
            for med in &stage.medication {
                println!(
                    "    {}: {} mg every {} h for {} days",
                    med.name, med.quantity_mg, med.interval_hours, med.total_days
                );
            }
        }
    }
    Ok(())
}
