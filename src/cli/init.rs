//! Init command implementation
//!
//! Scaffolds a ragchat project: `ragchat.toml`, `.env.example`,
//! `.gitignore` and the knowledge folder.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (ragchat.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// LLM provider to configure (gemini or ollama)
    pub provider: String,
    /// Port for the web UI
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing ragchat project");

    let base_path = &config.path;

    let config_path = base_path.join("ragchat.toml");
    if config_path.exists() && !config.force {
        output.warning("ragchat.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    let knowledge = base_path.join("local knowledge");
    if knowledge.exists() {
        output.skipped("local knowledge/", "already exists");
    } else if let Err(e) = fs::create_dir_all(&knowledge) {
        output.error(&format!("Failed to create local knowledge/: {}", e));
        return InitResult::Error(e.to_string());
    } else {
        output.created("directory", "local knowledge/");
    }

    let files = [
        ("config", "ragchat.toml", generate_ragchat_toml(&config), config.force),
        ("env", ".env.example", generate_env_example(), config.force),
        ("file", ".gitignore", generate_gitignore(), false),
    ];

    for (kind, name, content, force) in files {
        let path = base_path.join(name);
        if path.exists() && !force {
            output.skipped(name, "already exists");
            continue;
        }
        if let Err(e) = write_file(&path, &content, force) {
            output.error(&format!("Failed to create {}: {}", name, e));
            return InitResult::Error(e.to_string());
        }
        output.created(kind, name);
    }

    output.complete("ragchat project initialized");

    output.header("Next Steps");
    if config.provider == "ollama" {
        output.info("1. Start Ollama and pull a model:");
        output.command("ollama pull llama3.2");
    } else {
        output.info("1. Add your Gemini API key:");
        output.command("cp .env.example .env");
        output.command("# then set GEMINI_API_KEY in .env");
    }
    output.info("2. Drop PDF, TXT, DOCX or XLSX files into \"local knowledge/\"");
    output.info("3. Start chatting:");
    output.command("ragchat            # web UI");
    output.command("ragchat chat       # terminal");

    output.hint(&format!(
        "The web UI will be available at http://127.0.0.1:{}",
        config.port
    ));

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_ragchat_toml(config: &InitConfig) -> String {
    let llm_section = if config.provider == "ollama" {
        r#"[llm]
provider = "ollama"
model = "llama3.2"
base_url = "http://localhost:11434"
"#
    } else {
        r#"[llm]
provider = "gemini"
model = "gemini-2.5-flash"
# Name of the environment variable holding the key (also read from .env)
api_key_env = "GEMINI_API_KEY"
base_url = "https://generativelanguage.googleapis.com"
# timeout_secs = 60
"#
    };

    format!(
        r#"# ragchat configuration

[server]
host = "127.0.0.1"
port = {port}
log_level = "info"
# Drop web sessions idle this long, 0 to keep them until the tab closes
session_idle_secs = 3600

[knowledge]
# Scanned once at startup, subfolders are ignored
folder = "local knowledge"

[store]
path = "chroma_db"
collection = "knowledge_base"

[retrieval]
top_n = 3
# Retrieved text must be longer than this (trimmed) to be used as context
min_context_chars = 50

{llm_section}
[embeddings]
# hashed (offline), gemini, or fastembed (needs the local-embeddings feature).
# Changing the backend requires `ragchat index --rebuild`.
backend = "hashed"
dimensions = 384
model = "text-embedding-004"
"#,
        port = config.port,
        llm_section = llm_section
    )
}

fn generate_env_example() -> String {
    r#"# Copy to .env and fill in
GEMINI_API_KEY=

# Optional overrides
# RAGCHAT_KNOWLEDGE_DIR=local knowledge
# RAGCHAT_STORE_PATH=chroma_db
# RAGCHAT_PORT=8501
# RUST_LOG=ragchat=debug
"#
    .to_string()
}

fn generate_gitignore() -> String {
    r#"/target
.env
chroma_db/
"#
    .to_string()
}
