//! Wire formats of the two node dialects
//!
//! - council node server: `GET /health`, `POST /chat`
//! - raw Ollama: `GET /api/tags`, `POST /api/chat` (non-streaming)

use council_domain::ChatMessage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub(crate) struct ChatBody<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub options: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(default)]
    pub content: String,
}

/// Chat response; the node server adds `node`, Ollama omits it
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseBody {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub message: WireMessage,
    #[serde(default)]
    pub node: Option<String>,
}

/// Node server health: `status` is `ok` or `degraded`
#[derive(Debug, Deserialize)]
pub(crate) struct NodeHealthBody {
    pub status: String,
    #[serde(default)]
    pub available_models: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OllamaTag {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OllamaTagsBody {
    #[serde(default)]
    pub models: Vec<OllamaTag>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_body_serialization() {
        let messages = vec![ChatMessage::user("hi")];
        let options = Map::new();
        let body = ChatBody {
            model: "qwen3:4b",
            messages: &messages,
            options: &options,
            stream: Some(false),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "qwen3:4b");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["stream"], false);

        let node_body = ChatBody {
            stream: None,
            ..body
        };
        let json = serde_json::to_value(&node_body).unwrap();
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn test_node_chat_response() {
        let body: ChatResponseBody = serde_json::from_str(
            r#"{"model":"qwen3:4b","message":{"role":"assistant","content":"42"},"node":"gpu-1","done":true}"#,
        )
        .unwrap();
        assert_eq!(body.message.content, "42");
        assert_eq!(body.node.as_deref(), Some("gpu-1"));
    }

    #[test]
    fn test_health_and_tags() {
        let health: NodeHealthBody = serde_json::from_str(
            r#"{"status":"degraded","ollama_status":"error: refused","available_models":[]}"#,
        )
        .unwrap();
        assert_eq!(health.status, "degraded");

        let tags: OllamaTagsBody = serde_json::from_str(
            r#"{"models":[{"name":"llama3.2:latest","size":1},{"name":"phi4:14b"}]}"#,
        )
        .unwrap();
        let names: Vec<_> = tags.models.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["llama3.2:latest", "phi4:14b"]);
    }
}
