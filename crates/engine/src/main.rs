use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use quotebot_engine::catalog::Catalog;
use quotebot_engine::client::ChatClient;
use quotebot_engine::config::Config;
use quotebot_engine::conversation::Session;
use quotebot_engine::logging;
use quotebot_shared::{CapabilityRegistry, Dispatcher, YahooFinance};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();
    logging::init();

    let lookup = Arc::new(YahooFinance::new(&config.quote_url, config.timeout())?);
    let registry = CapabilityRegistry::with_builtins(lookup);
    let catalog = Catalog::resolve(config.functions.as_deref(), &registry)?;
    let capabilities = registry.names();
    let dispatcher = Dispatcher::new(registry, config.routing);
    info!(
        functions = ?catalog.names(),
        capabilities = ?capabilities,
        routing = %dispatcher.routing(),
        "catalog loaded"
    );

    let chat = ChatClient::new(config.chat_options())?;
    info!(url = chat.url(), model = %config.model, stream = config.stream, "asking model");

    let mut session = Session::new(chat, dispatcher, &catalog);
    let outcome = session.ask(&config.question).await?;

    // Only the final answer goes to stdout; diagnostics are on stderr.
    println!("{}", outcome.answer);

    Ok(())
}
