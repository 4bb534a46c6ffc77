//! openswarm runtime: wires config, provider, bus, agents and the work loop.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

use openswarm::agent::{Agent, AgentRole};
use openswarm::board::TaskBoard;
use openswarm::bus::{InboundMessage, MessageBus};
use openswarm::llm::{LlmClient, OpenRouterClient};
use openswarm::work_loop::WorkLoop;
use openswarm::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    std::fs::create_dir_all(&config.workspace)?;
    tracing::info!(
        workspace = %config.workspace.display(),
        model = %config.model,
        "starting openswarm"
    );

    let llm: Arc<dyn LlmClient> = Arc::new(OpenRouterClient::new(config.api_key.clone()));
    let bus = Arc::new(MessageBus::new());
    let board = Arc::new(TaskBoard::load(&config.workspace));

    // One agent per role, each draining its own channel.
    let mut coordinator = None;
    for role in AgentRole::ALL {
        let agent = Arc::new(Agent::new(
            role,
            config.workspace.clone(),
            bus.clone(),
            llm.clone(),
            board.clone(),
            config.model.clone(),
        ));
        let mailbox = bus.register_channel(&role.channel()).await?;
        if role == AgentRole::Manager {
            coordinator = Some(agent.clone());
        }
        spawn_dispatch(agent, mailbox, bus.clone());
    }
    let Some(coordinator) = coordinator else {
        anyhow::bail!("no coordinating agent configured");
    };

    // Drain outbound replies to the log; a front-end surface would forward
    // these to users instead.
    if let Some(mut outbound) = bus.take_outbound().await {
        tokio::spawn(async move {
            while let Some(reply) = outbound.recv().await {
                tracing::info!(
                    channel = %reply.channel,
                    chat = %reply.chat_id,
                    "reply: {}",
                    reply.content
                );
            }
        });
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            let _ = stop_tx.send(true);
        }
    });

    let work_loop = WorkLoop::new(
        config.workspace.clone(),
        board,
        coordinator,
        config.sleep_interval,
        config.heartbeat_interval,
    );
    work_loop.run(stop_rx).await;

    Ok(())
}

/// Consume an agent's mailbox one message at a time, publishing replies.
fn spawn_dispatch(
    agent: Arc<Agent>,
    mut mailbox: mpsc::Receiver<InboundMessage>,
    bus: Arc<MessageBus>,
) {
    tokio::spawn(async move {
        while let Some(msg) = mailbox.recv().await {
            match agent.process_message(&msg).await {
                Ok(reply) => bus.publish_outbound(reply).await,
                Err(e) => {
                    tracing::error!(
                        role = %agent.role(),
                        "message processing aborted: {e:#}"
                    );
                }
            }
        }
        tracing::debug!(role = %agent.role(), "mailbox closed, dispatch ended");
    });
}
