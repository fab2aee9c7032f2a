use chat_functions_core::contract::SweepOutcome;
use chat_functions_lambda::config::PlatformConfig;
use chat_functions_lambda::handlers::sweep::handle_retention_sweep;
use chat_functions_lambda::runtime::{init_tracing, PlatformClient};
use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

// The schedule payload carries nothing the sweep needs.
async fn handle_request(
    _event: LambdaEvent<Value>,
    platform: &PlatformClient,
) -> Result<SweepOutcome, Error> {
    handle_retention_sweep(Utc::now(), &platform.store).map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = PlatformConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    let platform = PlatformClient::new(&config);
    let platform = &platform;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, platform).await
    }))
    .await
}
