//! History command - Print the messages of a session.

use anyhow::Result;
use clap::Args;

use deck_chat::ChatClient;

use super::GlobalOpts;
use crate::render;

#[derive(Args)]
pub struct HistoryArgs {
    /// Session to read
    session: String,

    /// Print the messages as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(global: &GlobalOpts, args: HistoryArgs) -> Result<()> {
    let connection = global.connect()?;
    let client = ChatClient::new(connection.backend);

    let messages = client.resume(&args.session).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
    } else if messages.is_empty() {
        println!("No messages in session {}", args.session);
    } else {
        for message in &messages {
            println!("{}", render::message(message));
        }
    }
    Ok(())
}
