use async_trait::async_trait;
use clap::Subcommand;
use std::error::Error;
use std::fs;
use std::io::Read;

pub mod obfuscate;
pub mod serve;
pub mod tokens;

use thiserror::Error;

/// Errors that can occur while running a subcommand.
#[derive(Debug, Error)]
pub enum ObfuscateError {
    /// File read/write error.
    #[error("file error: {0}")]
    File(#[from] std::io::Error),
    /// The pipeline rejected the input or failed internally.
    #[error("obfuscation failed: {0}")]
    Transform(#[from] murk_transform::Error),
    /// Parsing failed while dumping tokens.
    #[error("{0}")]
    Core(#[from] murk_core::Error),
    /// The seed is not 64 hex characters.
    #[error("invalid seed: {0}")]
    InvalidSeed(String),
    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The HTTP server could not start or stopped with an error.
    #[error("server error: {0}")]
    Server(String),
}

/// CLI subcommands for Murk.
#[derive(Subcommand)]
pub enum Cmd {
    /// Obfuscate a Lua source file.
    Obfuscate(obfuscate::ObfuscateArgs),
    /// Dump the token tree the parser produces for a file.
    Tokens(tokens::TokensArgs),
    /// Serve `POST /obfuscate` over HTTP.
    Serve(serve::ServeArgs),
}

/// Trait for executing CLI subcommands.
///
/// Implementors read their input, run their part of the pipeline and write
/// the result to stdout or a file.
#[async_trait]
pub trait Command {
    /// Executes the subcommand.
    async fn execute(self) -> Result<(), Box<dyn Error>>;
}

#[async_trait]
impl Command for Cmd {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        match self {
            Cmd::Obfuscate(args) => args.execute().await,
            Cmd::Tokens(args) => args.execute().await,
            Cmd::Serve(args) => args.execute().await,
        }
    }
}

/// Reads source text from a path, or from stdin when the path is `-`.
pub(crate) fn read_input(input: &str) -> Result<String, ObfuscateError> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}
