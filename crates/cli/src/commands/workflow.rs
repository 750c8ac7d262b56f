use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::commands::{CommandResult, EXIT_IO};

pub const DEFAULT_A2A_URL: &str = "http://localhost:8000/a2a";
pub const WORKFLOW_NAME: &str = "bible_verse_agent";

const LONG_DESCRIPTION: &str = "\
You are a helpful Bible verse assistant that provides meaningful Bible verses with AI-generated \
reflections.

Your primary function is to help users find relevant Bible verses for specific topics or \
situations. When responding:

- Always extract the main topic from the user's query (e.g., \"faith\", \"love\", \"forgiveness\")
- Provide a relevant Bible verse for that topic
- Include an AI-generated reflection to help users understand the verse's meaning
- Keep responses concise but spiritually meaningful
- If the user asks for daily verses, provide a random verse with reflection
- Support both Old and New Testament verses
";

/// n8n-style workflow with a single A2A node pointing at `a2a_url`.
pub fn descriptor(a2a_url: &str) -> Value {
    let id = Uuid::new_v4().simple().to_string();
    json!({
        "active": false,
        "category": "utilities",
        "description": "A workflow that provides Bible verses with AI reflections",
        "id": &id[..16],
        "long_description": LONG_DESCRIPTION,
        "name": WORKFLOW_NAME,
        "nodes": [
            {
                "id": WORKFLOW_NAME,
                "name": "Bible Verse Agent",
                "parameters": {},
                "position": [816, -112],
                "type": "a2a/mastra-a2a-node",
                "typeVersion": 1,
                "url": a2a_url,
            }
        ],
        "pinData": {},
        "settings": { "executionOrder": "v1" },
        "short_description": "Provides Bible verses with AI reflections",
    })
}

/// Prints the descriptor inside the outcome document; `out` also receives the
/// bare descriptor, ready to import.
pub fn run(a2a_url: &str, out: Option<&Path>) -> CommandResult {
    let document = descriptor(a2a_url);

    let Some(path) = out else {
        return CommandResult::success_with_data(
            "workflow",
            "workflow descriptor generated",
            Some(document),
        );
    };

    let written = serde_json::to_string_pretty(&document)
        .map_err(|error| error.to_string())
        .and_then(|rendered| {
            fs::write(path, format!("{rendered}\n")).map_err(|error| error.to_string())
        });
    match written {
        Ok(()) => CommandResult::success_with_data(
            "workflow",
            format!("workflow descriptor written to {}", path.display()),
            Some(document),
        ),
        Err(error) => CommandResult::failure(
            "workflow",
            "io",
            format!("failed to write {}: {error}", path.display()),
            EXIT_IO,
        ),
    }
}
