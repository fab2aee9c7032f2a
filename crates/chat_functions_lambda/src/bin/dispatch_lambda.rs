use chat_functions_core::contract::DispatchOutcome;
use chat_functions_lambda::config::PlatformConfig;
use chat_functions_lambda::handlers::dispatch::handle_message_created;
use chat_functions_lambda::runtime::{init_tracing, PlatformClient};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(
    event: LambdaEvent<Value>,
    platform: &PlatformClient,
) -> Result<DispatchOutcome, Error> {
    Ok(handle_message_created(
        event.payload,
        &platform.store,
        &platform.push,
    ))
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
