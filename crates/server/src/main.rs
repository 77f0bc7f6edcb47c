use oidc_wallet_bridge::AppResources;
use oidc_wallet_bridge::api::start_webserver;
use oidc_wallet_bridge::config::load_config_or_panic;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "oidc_wallet_bridge=info,tower_http=info,hyper=warn,reqwest=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    initialize_tracing();

    // Load config
    let config = load_config_or_panic();
    tracing::info!(
        issuer = %config.oidc.issuer,
        base_url = %config.base_url,
        redirect_uri = %config.redirect_uri(),
        transport = ?config.transport.mode,
        secure_cookies = config.transport.secure_cookies,
        timeout_secs = config.http.timeout_secs,
        "bridge configuration"
    );

    let resources = AppResources::new(config)?;

    // Warm the key cache; a provider outage here is not fatal, verification re-fetches on demand.
    let verifier = resources.flow.verifier().clone();
    let jwks_uri = resources.config.oidc.jwks_uri.clone();
    tokio::spawn(async move {
        if let Err(e) = verifier.fetch_key_set(&jwks_uri).await {
            tracing::warn!(error = %e, "initial provider key set fetch failed");
        }
    });

    start_webserver(resources).await?;
    Ok(())
}
