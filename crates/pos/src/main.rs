//! Point-of-sale terminal.

mod app;
mod commands;
mod render;

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use stockroom_infra::{
    Backend, HttpRecordClient, InMemoryProductCatalog, InMemorySaleLedger, PosConfig,
    RemoteProductCatalog, RemoteSaleLedger,
};
use stockroom_products::ProductCatalog;
use stockroom_sales::{SaleLedger, SalesSession};

use crate::app::{Flow, Terminal};
use crate::commands::Command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = PosConfig::from_env().context("invalid configuration")?;

    let (catalog, ledger) = match &config.backend {
        Backend::Memory => {
            tracing::info!("using the in-memory demo catalog");
            let catalog: Arc<dyn ProductCatalog> = Arc::new(InMemoryProductCatalog::seeded());
            let ledger: Arc<dyn SaleLedger> = Arc::new(InMemorySaleLedger::new());
            (catalog, ledger)
        }
        Backend::Remote(remote) => {
            tracing::info!(url = %remote.base_url, "using the remote record store");
            let client = Arc::new(
                HttpRecordClient::from_config(remote).context("failed to build record store client")?,
            );
            let catalog: Arc<dyn ProductCatalog> =
                Arc::new(RemoteProductCatalog::new(client.clone(), remote.product_table.clone()));
            let ledger: Arc<dyn SaleLedger> =
                Arc::new(RemoteSaleLedger::new(client, remote.sale_table.clone()));
            (catalog, ledger)
        }
    };

    let mut session = SalesSession::new(catalog, ledger);
    session
        .load()
        .await
        .context("failed to load products and sales")?;

    let mut terminal = Terminal::new(session, config.low_stock_threshold);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(b"Stockroom POS. Type `help` for commands.\n")
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let text = match line.parse::<Command>() {
            Ok(command) => match terminal.execute(command).await {
                Flow::Continue(text) => text,
                Flow::Quit => break,
            },
            Err(e) => format!("{e}\n"),
        };
        stdout.write_all(text.as_bytes()).await?;
    }

    tracing::info!("terminal closed");
    Ok(())
}
