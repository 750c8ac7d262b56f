use axum::{routing::get, Json, Router};
use serde::Serialize;

pub const AGENT_NAME: &str = "Bible Verse of the Day Agent";
pub const A2A_PATH: &str = "/a2a";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub capabilities: Vec<&'static str>,
    pub endpoints: AgentEndpoints,
    pub default_input_modes: Vec<&'static str>,
    pub default_output_modes: Vec<&'static str>,
    pub skills: Vec<AgentSkill>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentEndpoints {
    pub a2a: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentSkill {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub examples: Vec<&'static str>,
}

pub fn router() -> Router {
    Router::new().route("/.well-known/agent.json", get(agent_card))
}

pub async fn agent_card() -> Json<AgentCard> {
    Json(card())
}

pub fn card() -> AgentCard {
    AgentCard {
        name: AGENT_NAME,
        description: "An A2A-compatible agent that provides Bible verses with AI-generated \
                      reflections.",
        version: env!("CARGO_PKG_VERSION"),
        capabilities: vec![
            "Retrieve Bible verses by topic",
            "Generate AI reflections on verses",
            "Daily verse posting",
        ],
        endpoints: AgentEndpoints { a2a: A2A_PATH },
        default_input_modes: vec!["text/plain"],
        default_output_modes: vec!["text/plain", "application/json"],
        skills: vec![
            AgentSkill {
                id: "verse_by_topic",
                name: "Verse by topic",
                description: "Finds a verse for a topic and adds a one-sentence reflection.",
                examples: vec!["I need a verse on love.", "Give me a verse about patience"],
            },
            AgentSkill {
                id: "daily_verse",
                name: "Verse of the day",
                description: "Posts a random verse with a reflection once a day.",
                examples: Vec::new(),
            },
        ],
    }
}
