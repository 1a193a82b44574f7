use clap::Subcommand;
use funnel_core::generation::QueryAdapter;
use funnel_core::{Config, GeminiClient, QueryKind};

#[derive(Subcommand)]
pub enum AskAction {
    /// Analyze a message for manipulation tactics
    Analyze {
        /// Message text
        text: String,
    },
    /// Generate short non-reactive replies to a provocation
    Generate {
        /// Provocation text
        text: String,
    },
}

pub fn run(action: AskAction) -> Result<(), Box<dyn std::error::Error>> {
    let (kind, text) = match action {
        AskAction::Analyze { text } => (QueryKind::Analyzer, text),
        AskAction::Generate { text } => (QueryKind::Generator, text),
    };

    let config = Config::load()?;
    let client = GeminiClient::from_env(config.ai.base_url.clone())?;
    let mut adapter = QueryAdapter::new(kind, config.query_profile(kind));

    let runtime = tokio::runtime::Runtime::new()?;
    match runtime.block_on(adapter.submit(&client, &text)) {
        Some(result) => println!("{result}"),
        None => return Err("nothing to send: input is empty".into()),
    }
    Ok(())
}
