//! Lingua CLI
//!
//! Runs a single translation or grammar correction from the command line,
//! saving the result to the same log the server writes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use lingua_gateway::{
    config::Settings, llm_client::LlmConfig, types::Translation, LlmClient, TranslationStore,
    TranslatorService,
};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "lingua")]
#[command(about = "AI Translator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate Chinese text to English and Japanese
    Zh {
        /// Chinese text to translate
        text: String,

        /// Include grammar explanations
        #[arg(long)]
        grammar: bool,
    },
    /// Correct the grammar of an English sentence
    En {
        /// English text to correct
        text: String,

        /// Include grammar explanations
        #[arg(long)]
        grammar: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    let store = Arc::new(TranslationStore::open(&settings.database_path)?);
    let client = LlmClient::new(LlmConfig::from_settings(&settings))?;
    let service = TranslatorService::new(client, store);

    match cli.command {
        Command::Zh { text, grammar } => {
            let result = service.translate_chinese(&text, grammar).await?;
            print_result(&result, grammar);
        }
        Command::En { text, grammar } => {
            let result = service.correct_english(&text, grammar).await?;
            print_result(&result, grammar);
        }
    }

    Ok(())
}

fn print_result(result: &Translation, show_grammar: bool) {
    println!("Original: {}", result.original_text);
    println!("English: {}", result.translated_text);
    if show_grammar {
        if let Some(grammar) = &result.english_grammar {
            println!("English grammar: {}", grammar);
        }
    }
    if let Some(japanese) = &result.japanese_text {
        println!("Japanese: {}", japanese);
    }
    if let Some(hiragana) = &result.hiragana_pronunciation {
        println!("Hiragana: {}", hiragana);
    }
    if show_grammar {
        if let Some(grammar) = &result.japanese_grammar {
            println!("Japanese grammar: {}", grammar);
        }
    }
    println!("Timestamp: {}", result.timestamp.to_rfc3339());
}
