use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

use crate::core::{Engine, Language, RunOptions, VideoId};

#[derive(Parser)]
#[command(name = "vidmap")]
#[command(about = "Video summaries, translations, audio and mind maps from a single link")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize a video, translate it, speak it and draw a mind map
    Run {
        /// Video link (watch URL, short link or bare id)
        url: String,

        /// Translation and speech language
        #[arg(short, long, value_enum)]
        language: Option<Language>,

        /// Label of the mind map root
        #[arg(short, long)]
        title: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip speech synthesis
        #[arg(long)]
        no_audio: bool,

        /// Skip translation
        #[arg(long)]
        no_translate: bool,
    },

    /// Build a mind map from an existing summary
    Mindmap {
        /// Summary file (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Label of the mind map root
        #[arg(short, long)]
        title: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the point hierarchy of a summary as JSON
    Segment {
        /// Summary file (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Write a default configuration file
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing vidmap.toml
        #[arg(long)]
        force: bool,
    },

    /// Print the thumbnail URL of a video
    Thumbnail {
        url: String,
    },
}

impl Cli {
    pub async fn execute(self, engine: Engine) -> Result<()> {
        match self.command {
            Commands::Run { url, language, title, output, no_audio, no_translate } => {
                let options = RunOptions {
                    language,
                    title,
                    output,
                    skip_audio: no_audio,
                    skip_translation: no_translate,
                };
                let report = engine.run(&url, options).await?;
                println!("{}", report.mind_map_html.display());
                Ok(())
            }
            Commands::Mindmap { input, title, output } => {
                let summary = read_input(input.as_deref())?;
                let report = engine.mind_map(&summary, title, output)?;
                println!("{}", report.mind_map_html.display());
                Ok(())
            }
            Commands::Segment { input } => {
                let summary = read_input(input.as_deref())?;
                let hierarchy = engine.segment(&summary);
                println!("{}", serde_json::to_string_pretty(&hierarchy)?);
                Ok(())
            }
            Commands::Init { path, force } => {
                engine.init(path, force)?;
                Ok(())
            }
            Commands::Thumbnail { url } => {
                println!("{}", VideoId::from_url(&url)?.thumbnail_url());
                Ok(())
            }
        }
    }
}

/// Summary text from a file, or stdin when no file is given
fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
            Ok(text)
        }
    }
}
