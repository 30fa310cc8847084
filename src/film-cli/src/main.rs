//! Command-line inspector for Halo Infinite film archives.
//!
//! Drives the spartan-film decoder over a downloaded film directory and
//! prints machine-readable JSON; presentation is left to downstream tools.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use spartan_film::{FilmReader, Roster};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spartan-film")]
#[command(about = "Inspect Halo Infinite film replay archives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Report per-chunk sizes and declared types
    Chunks {
        /// Film directory containing filmChunk{N} files
        dir: PathBuf,
    },

    /// Extract the component type catalog from chunk 0
    Components {
        /// Film directory containing filmChunk{N} files
        dir: PathBuf,
    },

    /// Run the full extraction: players, events, positions, components
    Parse {
        /// Film directory containing filmChunk{N} files
        dir: PathBuf,

        /// Known gamertag (repeatable)
        #[arg(short, long = "gamertag")]
        gamertags: Vec<String>,

        /// Known XUID (repeatable)
        #[arg(short, long = "xuid")]
        xuids: Vec<String>,

        /// Roster JSON file ({"gamertags": [...], "xuids": [...]})
        #[arg(short, long)]
        roster: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_roster(path: Option<&PathBuf>, gamertags: Vec<String>, xuids: Vec<String>) -> Result<Roster> {
    let mut roster = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading roster file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing roster file {}", path.display()))?
        }
        None => Roster::default(),
    };
    roster.gamertags.extend(gamertags);
    roster.xuids.extend(xuids);
    Ok(roster)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spartan_film=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chunks { dir } => {
            let reader = FilmReader::open(&dir);
            let report = reader
                .chunk_info()
                .with_context(|| format!("reading chunks in {}", dir.display()))?;
            print_json(&report)?;
        }

        Commands::Components { dir } => {
            let reader = FilmReader::open(&dir);
            let chunk0 = reader
                .load_chunk(spartan_film::INITIAL_STATE_CHUNK)
                .context("loading chunk 0")?;
            let catalog = spartan_film::parse_component_definitions(&chunk0);
            print_json(&catalog)?;
        }

        Commands::Parse {
            dir,
            gamertags,
            xuids,
            roster,
        } => {
            let roster = load_roster(roster.as_ref(), gamertags, xuids)?;
            let reader = FilmReader::open(&dir);
            let summary = reader
                .parse(&roster)
                .with_context(|| format!("parsing film in {}", dir.display()))?;
            print_json(&summary)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_roster_merges_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(&path, r#"{"gamertags": ["FromFile"], "xuids": []}"#).unwrap();

        let roster = load_roster(
            Some(&path),
            vec!["FromFlag".to_string()],
            vec!["123".to_string()],
        )
        .unwrap();
        assert_eq!(roster.gamertags, vec!["FromFile", "FromFlag"]);
        assert_eq!(roster.xuids, vec!["123"]);
    }

    #[test]
    fn test_load_roster_without_file() {
        let roster = load_roster(None, vec!["Solo".to_string()], vec![]).unwrap();
        assert_eq!(roster.gamertags, vec!["Solo"]);
        assert!(roster.xuids.is_empty());
    }
}
