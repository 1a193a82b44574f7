use std::sync::Arc;

use funnel_core::generation::{GenerationRequest, GenerationResponse};
use funnel_core::{
    Command, Config, GeminiClient, GenerationError, Generator, QueryKind, RuntimeHandle, Session,
    SessionRuntime, SystemLauncher,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::print_event;

const HELP: &str = "commands: progress <secs> | leave <y> | close | faq <i> | analyze <text> | generate <text> | checkout | status | quit";

/// One stdin line, parsed.
#[derive(Debug)]
enum Line {
    Send(Command),
    Status,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<Option<Line>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let number = |what: &str| -> Result<f64, String> {
        rest.parse::<f64>()
            .map_err(|_| format!("{word}: expected {what}, got '{rest}'"))
    };
    let parsed = match word {
        "progress" => Line::Send(Command::ReportProgress(number("seconds")?)),
        "leave" => Line::Send(Command::PointerLeave(number("a y coordinate")?)),
        "close" => Line::Send(Command::CloseExitModal),
        "faq" => {
            let index = rest
                .parse::<usize>()
                .map_err(|_| format!("faq: expected an index, got '{rest}'"))?;
            Line::Send(Command::ToggleFaq(index))
        }
        "analyze" | "generate" => {
            let kind: QueryKind = word.parse()?;
            Line::Send(Command::Submit {
                kind,
                input: rest.to_string(),
            })
        }
        "checkout" => Line::Send(Command::Checkout),
        "status" => Line::Status,
        "help" => Line::Help,
        "quit" | "exit" => Line::Quit,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(Some(parsed))
}

/// Gemini when a key is configured, otherwise a stand-in that fails every
/// request so the page tools show their error text.
enum Backend {
    Gemini(GeminiClient),
    Offline,
}

impl Generator for Backend {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        match self {
            Backend::Gemini(client) => client.generate(request).await,
            Backend::Offline => Err(GenerationError::MissingApiKey(
                funnel_core::generation::API_KEY_ENV_VARS.join(", "),
            )),
        }
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let backend = match GeminiClient::from_env(config.ai.base_url.clone()) {
        Ok(client) => Backend::Gemini(client),
        Err(e) => {
            tracing::warn!(error = %e, "query tools will report connection errors");
            Backend::Offline
        }
    };
    let session = Session::new(&config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(drive(session, backend))
}

async fn drive(session: Session, backend: Backend) -> Result<(), Box<dyn std::error::Error>> {
    let (handle, mut events, task) =
        SessionRuntime::spawn(session, Arc::new(backend), Arc::new(SystemLauncher));

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Err(e) = print_event(&event) {
                tracing::error!(error = %e, "failed to encode event");
            }
        }
    });

    eprintln!("{HELP}");
    let result = read_commands(&handle).await;

    // The runtime may already be gone if the loop above failed on a send.
    let _ = handle.shutdown().await;
    drop(handle);
    task.await?;
    printer.await?;
    result
}

async fn read_commands(handle: &RuntimeHandle) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(Line::Send(command))) => handle.send(command).await?,
            Ok(Some(Line::Status)) => {
                let snapshot = handle.snapshot().await?;
                println!("{}", serde_json::to_string(&snapshot)?);
            }
            Ok(Some(Line::Help)) => eprintln!("{HELP}"),
            Ok(Some(Line::Quit)) => break,
            Err(message) => eprintln!("{message}"),
        }
    }
    Ok(())
}
