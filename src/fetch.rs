use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;

static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("bayshows/0.1 (+https://github.com/mike/bayshows)")
        .build()
        .expect("http client")
});

pub fn fetch_html(url: &str) -> Result<String> {
    let response = CLIENT
        .get(url)
        .send()
        .with_context(|| format!("request failed for {url}"))?;
    let response = response
        .error_for_status()
        .with_context(|| format!("non-success status for {url}"))?;
    response
        .text()
        .with_context(|| format!("unable to read response body for {url}"))
}

pub fn fetch_json(url: &str, query: &[(&str, &str)]) -> Result<Value> {
    let response = CLIENT
        .get(url)
        .query(query)
        .send()
        .with_context(|| format!("request failed for {url}"))?;
    let response = response
        .error_for_status()
        .with_context(|| format!("non-success status for {url}"))?;
    response
        .json()
        .with_context(|| format!("unable to decode json body for {url}"))
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unable to launch render command: {0}")]
    Launch(String),
    #[error("render command failed: {0}")]
    Command(String),
    #[error("unable to read dom snapshot: {0}")]
    Snapshot(String),
}

/// Renders a URL with client scripts settled and hands back the markup.
/// One page per call; the session is torn down before the call returns.
pub trait PageRenderer {
    fn render(&self, url: &str) -> Result<String, RenderError>;
}

// Serves a previously captured DOM from disk.
pub struct SnapshotRenderer {
    path: PathBuf,
}

impl SnapshotRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotRenderer { path: path.into() }
    }
}

impl PageRenderer for SnapshotRenderer {
    fn render(&self, _url: &str) -> Result<String, RenderError> {
        std::fs::read_to_string(&self.path)
            .map_err(|err| RenderError::Snapshot(format!("{}: {err}", self.path.display())))
    }
}

// External headless-browser wrapper. The command gets the URL as its last
// argument and must print the settled DOM to stdout.
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandRenderer {
            program: program.into(),
            args,
        }
    }

    // Splits a shell-ish spec like "node render.js" into program + args.
    pub fn from_spec(spec: &str) -> Option<Self> {
        let mut parts = spec.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(CommandRenderer {
            program,
            args: parts.collect(),
        })
    }
}

impl PageRenderer for CommandRenderer {
    fn render(&self, url: &str) -> Result<String, RenderError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .output()
            .map_err(|err| RenderError::Launch(format!("{}: {err}", self.program)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Command(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
