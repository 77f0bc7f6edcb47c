use goose::prelude::*;
use std::env;

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

async fn get_published_keys(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/.well-known/jwks.json").await?;
    Ok(())
}

/// Session pickup without a cookie; exercises the cookie parsing and clearing path.
async fn consume_empty_session(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.post("/api/auth/session", "").await?;
    Ok(())
}

/// Callback with a code the provider will reject. Only meaningful against a
/// staging provider; enabled with `LOADTEST_CALLBACK=1`.
async fn callback_with_bogus_code(user: &mut GooseUser) -> TransactionResult {
    let code = env::var("LOADTEST_CODE").unwrap_or_else(|_| "loadtest-invalid-code".to_string());
    let path = format!("/api/auth/worldid?code={code}");
    let _goose_metrics = user.get(&path).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    let with_callback = env::var("LOADTEST_CALLBACK").is_ok_and(|v| v == "1");
    println!(
        "Provider callback scenario: {}",
        if with_callback { "enabled" } else { "disabled" }
    );

    let mut attack = GooseAttack::initialize()?
        .register_scenario(
            scenario!("HealthCheck").register_transaction(transaction!(health_check)),
        )
        .register_scenario(
            scenario!("PublicEndpoints")
                .register_transaction(transaction!(get_published_keys))
                .register_transaction(transaction!(consume_empty_session)),
        );

    if with_callback {
        attack = attack.register_scenario(
            scenario!("ProviderCallback").register_transaction(transaction!(callback_with_bogus_code)),
        );
    }

    attack.execute().await?;

    Ok(())
}
