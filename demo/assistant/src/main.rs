mod config;

use std::io::Write;
use std::sync::Arc;

use aide_core::confirm::ConfirmationRequest;
use aide_core::embedding::HttpEmbedder;
use aide_core::llm::{LlmClient, RetryingModel};
use aide_core::tools::native::{
    ClearMemoryTool, ClockTool, CloseApplicationTool, DeleteFileTool, ListDirTool,
    OpenApplicationTool, ReadFileTool, WriteFileTool,
};
use aide_core::{
    ChannelConfirmer, CognitiveLoop, ConfirmationGate, Embedder, FastThinker, InMemoryStore,
    IntentRouter, LanguageModel, MemoryStore, ModelSelector, SensitivityPolicy, Session,
    SessionHandle, ToolRegistry, TurnOutcome, Utterance,
};
use config::AssistantConfig;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{info, warn};

const HELP: &str = "Commands: /clear, /history, /stats, /ask <question>, /image <url> <text>, /quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,aide_core=info,aide_assistant=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = AssistantConfig::load();
    info!(target: "aide_assistant", workspace = %cfg.workspace_root.display(), "Starting Aide");

    // Tools
    let registry = Arc::new(ToolRegistry::new());
    registry.register(Arc::new(ClockTool));
    registry.register(Arc::new(ReadFileTool::new(cfg.workspace_root.clone())));
    registry.register(Arc::new(WriteFileTool::new(cfg.workspace_root.clone())));
    registry.register(Arc::new(ListDirTool::new(cfg.workspace_root.clone())));
    registry.register(Arc::new(DeleteFileTool::new(cfg.workspace_root.clone())));
    registry.register(Arc::new(OpenApplicationTool::new(cfg.allowed_apps.clone())));
    registry.register(Arc::new(CloseApplicationTool));

    // Embedding-backed routing and memory, unless disabled
    let embedder: Option<Arc<dyn Embedder>> = if cfg.keyword_only {
        None
    } else {
        match HttpEmbedder::from_env() {
            Ok(e) => Some(Arc::new(e)),
            Err(e) => {
                warn!(target: "aide_assistant", error = %e, "Embedder unavailable; keyword routing only");
                None
            }
        }
    };
    let router = Arc::new(match &embedder {
        Some(e) => IntentRouter::new(Arc::clone(e), cfg.router.clone()),
        None => IntentRouter::keyword_only(),
    });
    if !router.warm_up().await {
        info!(target: "aide_assistant", "Routing by keywords");
    }
    let memory: Arc<dyn MemoryStore> = Arc::new(match &embedder {
        Some(e) => InMemoryStore::with_embedder(Arc::clone(e)),
        None => InMemoryStore::new(),
    });
    registry.register(Arc::new(ClearMemoryTool::new(Arc::clone(&memory))));

    // Confirmation: questions arrive on `confirmations`, answers come from stdin
    let (confirmer, mut confirmations) = ChannelConfirmer::new(4);
    let gate = Arc::new(
        ConfirmationGate::new(SensitivityPolicy::from_registry(&registry), cfg.gate.clone())
            .with_callback(Arc::new(confirmer)),
    );

    // Language model
    let model: Arc<dyn LanguageModel> =
        Arc::new(RetryingModel::new(LlmClient::from_env()?, cfg.retry.clone()));
    let selector = ModelSelector::new(cfg.models.clone());
    let thinker = FastThinker::new(Arc::clone(&model), selector.clone())
        .with_persona(cfg.cognitive.persona.clone());

    let cognitive_loop = CognitiveLoop::new(
        cfg.cognitive.clone(),
        router,
        model,
        registry.clone(),
        memory,
    )
    .with_selector(selector)
    .with_gate(gate)
    .with_tools(&registry)
    .with_tool_schemas(registry.function_schemas());
    let session = Session::spawn(cognitive_loop);

    println!("Aide is ready. {}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let utterance = match line.split_once(' ').unwrap_or((line.as_str(), "")) {
            ("/quit" | "/exit", _) => break,
            ("/help", _) => {
                println!("{}", HELP);
                continue;
            }
            ("/clear", _) => {
                session.clear_history().await?;
                println!("History cleared.");
                continue;
            }
            ("/history", _) => {
                for turn in session.snapshot().await? {
                    println!("[{:?}] {}", turn.role, turn.content);
                }
                continue;
            }
            ("/stats", _) => {
                let status = session.status().await?;
                if status.model.available {
                    println!("Model service: online ({})", status.model.models.join(", "));
                } else {
                    println!("Model service: offline");
                }
                println!(
                    "Memory available: {}, records: {}",
                    status.memory.available, status.memory.total
                );
                if status.keyword_routing {
                    println!("Routing: keywords only");
                }
                continue;
            }
            ("/ask", question) => {
                let background = session.snapshot().await?;
                match thinker.think(&Utterance::new(question), Some(background.as_slice())).await {
                    Ok(c) => println!("{}", c.text.trim()),
                    Err(e) => println!("Sorry, {}.", e.user_message()),
                }
                continue;
            }
            ("/image", rest) => match rest.split_once(' ') {
                Some((url, text)) => Utterance::new(text).with_image(url),
                None => {
                    println!("Usage: /image <url> <text>");
                    continue;
                }
            },
            _ => Utterance::new(line.as_str()),
        };

        match run_turn(&session, utterance, &mut confirmations, &mut lines).await? {
            Some(outcome) => print_outcome(&outcome),
            None => break,
        }
    }

    info!(target: "aide_assistant", "Shutting down");
    Ok(())
}

/// Submit one utterance, answering confirmation questions from stdin while
/// the turn runs. `None` when stdin closed mid-turn.
async fn run_turn(
    session: &SessionHandle,
    utterance: Utterance,
    confirmations: &mut mpsc::Receiver<ConfirmationRequest>,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<Option<TurnOutcome>, Box<dyn std::error::Error>> {
    let submit = session.submit(utterance);
    tokio::pin!(submit);
    loop {
        tokio::select! {
            outcome = &mut submit => return Ok(Some(outcome?)),
            Some(request) = confirmations.recv() => {
                print!("{} [y/N] ", request.prompt);
                std::io::stdout().flush()?;
                match lines.next_line().await? {
                    Some(answer) => request.respond(&answer),
                    None => {
                        request.deny();
                        return Ok(None);
                    }
                }
            }
        }
    }
}

fn print_outcome(outcome: &TurnOutcome) {
    println!("{}", outcome.response);
    if let Some(reason) = &outcome.degraded {
        info!(target: "aide_assistant", %reason, "Turn completed in degraded mode");
    }
    info!(
        target: "aide_assistant",
        category = %outcome.classification.category,
        actions = outcome.actions.len(),
        model = ?outcome.model.as_ref().map(|m| m.name.clone()),
        "Turn complete"
    );
}
