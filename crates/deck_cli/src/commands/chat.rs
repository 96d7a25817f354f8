//! Chat command - Interactive chat session.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use deck_chat::{
    ChatClient, ChatConfig, ChatError, ChatMode, DirectLlmConfig, IndependentAgentConfig,
    PaletteAgentConfig,
};

use super::GlobalOpts;
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChatTypeArg {
    DirectLlm,
    IndependentAgent,
    PaletteAgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChatModeArg {
    Standard,
    Collaborative,
    Supervised,
}

impl From<ChatModeArg> for ChatMode {
    fn from(mode: ChatModeArg) -> Self {
        match mode {
            ChatModeArg::Standard => ChatMode::Standard,
            ChatModeArg::Collaborative => ChatMode::Collaborative,
            ChatModeArg::Supervised => ChatMode::Supervised,
        }
    }
}

#[derive(Args)]
pub struct ChatArgs {
    /// Chat config JSON file (takes precedence over the flags below)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kind of chat to start
    #[arg(long = "type", value_enum, default_value_t = ChatTypeArg::DirectLlm)]
    chat_type: ChatTypeArg,

    /// Session name shown by the backend
    #[arg(long)]
    name: Option<String>,

    /// Model to chat with (defaults to qwen2.5:latest)
    #[arg(short, long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f64>,

    /// Maximum tokens per reply
    #[arg(long)]
    max_tokens: Option<u32>,

    /// System prompt
    #[arg(long)]
    system_prompt: Option<String>,

    /// Personality of an independent agent
    #[arg(long)]
    personality: Option<String>,

    /// Capability of an independent agent (repeatable)
    #[arg(long = "capability")]
    capabilities: Vec<String>,

    /// Disable guardrails for an independent agent
    #[arg(long)]
    no_guardrails: bool,

    /// Palette agent to talk to
    #[arg(long)]
    agent: Option<String>,

    /// Palette agent chat mode
    #[arg(long, value_enum)]
    chat_mode: Option<ChatModeArg>,

    /// Share conversation context with the palette agent
    #[arg(long)]
    context_sharing: bool,

    /// Resume an existing session instead of creating one
    #[arg(long)]
    resume: Option<String>,

    /// Keep polling the backend connection in the background
    #[arg(long)]
    poll: bool,
}

impl ChatArgs {
    /// Build the chat config from the config file or the flags
    pub fn chat_config(&self) -> Result<ChatConfig> {
        if let Some(path) = &self.config {
            return Ok(ChatConfig::from_file(path)?);
        }

        let config = match self.chat_type {
            ChatTypeArg::DirectLlm => ChatConfig::DirectLlm(DirectLlmConfig {
                name: self.name.clone(),
                model: self.model.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                system_prompt: self.system_prompt.clone(),
            }),
            ChatTypeArg::IndependentAgent => ChatConfig::IndependentAgent(IndependentAgentConfig {
                name: self.name.clone(),
                model: self.model.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                system_prompt: self.system_prompt.clone(),
                personality: self.personality.clone(),
                capabilities: self.capabilities.clone(),
                guardrails: Some(!self.no_guardrails),
            }),
            ChatTypeArg::PaletteAgent => {
                let agent_ref = self.agent.clone().ok_or_else(|| {
                    ChatError::InvalidConfig("--agent is required for palette agent chats".to_string())
                })?;
                ChatConfig::PaletteAgent(PaletteAgentConfig {
                    name: self.name.clone(),
                    agent_ref,
                    chat_mode: self.chat_mode.map(ChatMode::from),
                    context_sharing: Some(self.context_sharing),
                })
            }
        };
        config.validate()?;
        Ok(config)
    }
}

pub async fn execute(global: &GlobalOpts, args: ChatArgs) -> Result<()> {
    let config = args.chat_config()?;
    let connection = global.connect()?;
    let client = ChatClient::new(connection.backend.clone());

    println!("{}", render::status(client.check_connection().await));

    let watcher = if args.poll {
        client.start_polling(connection.settings.probe_interval());
        let mut rx = client.monitor().subscribe();
        Some(tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let status = *rx.borrow_and_update();
                println!("\n{}", render::status(status));
            }
        }))
    } else {
        None
    };

    start_session(&client, &config, args.resume.as_deref()).await;

    println!("Type a message, or /history, /retry, /reset, /status, /quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/status" => print_status(&client),
            "/history" => match client.load_history().await {
                Ok(messages) => {
                    for message in &messages {
                        println!("{}", render::message(message));
                    }
                }
                Err(e) => println!("⚠️  {}", e),
            },
            "/retry" => {
                println!("{}", render::status(client.check_connection().await));
                if client.session_id().is_none() {
                    start_session(&client, &config, args.resume.as_deref()).await;
                }
            }
            "/reset" => match client.reset() {
                Ok(()) => start_session(&client, &config, None).await,
                Err(e) => println!("⚠️  {}", e),
            },
            text => match client.send(text).await {
                Ok(reply) => println!("{}", render::message(&reply)),
                Err(ChatError::Disconnected) => {
                    println!("🔴 Backend disconnected, message not sent. Use /retry to reconnect.")
                }
                Err(e) => println!("⚠️  {}", e),
            },
        }
    }

    if let Some(watcher) = watcher {
        watcher.abort();
    }
    client.close();
    info!("Chat closed");
    Ok(())
}

/// Create or resume a session, reporting failures inline
async fn start_session(client: &ChatClient, config: &ChatConfig, resume: Option<&str>) {
    let result = match resume {
        Some(session_id) => client.resume(session_id).await.map(|history| {
            for message in &history {
                println!("{}", render::message(message));
            }
            session_id.to_string()
        }),
        None => client.initialize(config).await,
    };

    match result {
        Ok(session_id) => println!("💬 Session {} ({})", session_id, config.chat_type()),
        Err(e) => println!("⚠️  {}. Use /retry to try again.", e),
    }
}

fn print_status(client: &ChatClient) {
    let snapshot = client.snapshot();
    println!("{}", render::status(snapshot.connection));
    println!(
        "   session: {}",
        snapshot.session_id.as_deref().unwrap_or("none")
    );
    println!("   state: {:?}", snapshot.state);
    println!("   messages: {}", snapshot.messages.len());
    if let Some(error) = &snapshot.last_error {
        println!("   last error: {}", error);
    }
}
