//! Send command - Send one message to an existing session.

use anyhow::Result;
use clap::Args;
use tracing::info;

use deck_chat::ChatClient;

use super::GlobalOpts;
use crate::render;

#[derive(Args)]
pub struct SendArgs {
    /// Session to send to
    #[arg(short, long)]
    session: String,

    /// Message text
    message: String,

    /// Print the reply as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(global: &GlobalOpts, args: SendArgs) -> Result<()> {
    let connection = global.connect()?;
    let client = ChatClient::new(connection.backend);

    let status = client.check_connection().await;
    info!("Backend {}", status);

    client.resume(&args.session).await?;
    let reply = client.send(&args.message).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{}", render::message(&reply));
    }
    client.close();
    Ok(())
}
