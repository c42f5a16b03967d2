use daln_client::api::{CoopApi, HttpCoopApi};
use daln_client::chain::Address;
use daln_client::config::ClientConfig;
use daln_client::error::ApiError;
use daln_client::onboarding::Phase;

/// Status CLI: print the onboarding record and render phase for a wallet
/// address. Wallet-signed flows (mint, burn, decrypt) need a signer and
/// are not reachable from here.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let address = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: daln-client <wallet-address>");
        std::process::exit(2);
    });
    let address = Address::new(address);

    let config = ClientConfig::from_env()?;
    let api = HttpCoopApi::new(config.api_base_url.clone());

    match api.get_onboarding_step(&address).await {
        Ok(record) => {
            let phase = Phase::from_step(Some(record.onboarding_step));
            println!("address:  {address}");
            println!("step:     {}", record.onboarding_step);
            println!("progress: {}%", phase.progress_percent());
            if let Some(item_id) = &record.plaid_item_id {
                println!("item id:  {item_id}");
            }
            if let Some(cid) = &record.cid {
                println!("cid:      {cid}");
            }
        }
        Err(ApiError::NotFound) => {
            println!("address:  {address}");
            println!("step:     not started");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
