use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Shown on the certificate whenever the remote call cannot produce a sentence.
pub const DEFAULT_IMPACT_MESSAGE: &str =
    "Bilime ve topluma kattığın değer için gönülden teşekkür ederiz.";

const TEXTGEN_MODEL: &str = "claude-3-haiku-20240307";
const TEXTGEN_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const MAX_TOKENS: u32 = 100;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct TextGenRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct TextGenResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

fn build_prompt(name: &str) -> String {
    format!(
        "{} isimli katılımcı için, bilim atölyesine katılımından dolayı teşekkür eden, \
         en fazla 15 kelimelik, resmi ve samimi tek bir Türkçe cümle yaz. \
         Sadece cümleyi yaz, başka hiçbir şey ekleme.",
        name
    )
}

/// Requests a short personalized thank-you sentence. Never fails: any missing
/// credential, transport error, or malformed body collapses to the default
/// sentence. One attempt only.
pub async fn compose_impact_message(client: &Client, api_key: Option<&str>, name: &str) -> String {
    let api_key = match api_key {
        Some(k) => k,
        None => {
            warn!("TEXTGEN_API_KEY not set, using default impact message");
            return DEFAULT_IMPACT_MESSAGE.to_string();
        }
    };

    let body = TextGenRequest {
        model: TEXTGEN_MODEL.to_string(),
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
        messages: vec![Message {
            role: "user".to_string(),
            content: build_prompt(name),
        }],
    };

    let response = client
        .post(TEXTGEN_ENDPOINT)
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01")
        .header("content-type", "application/json")
        .json(&body)
        .send()
        .await;

    let response = match response {
        Ok(r) => r,
        Err(e) => {
            warn!("Text generation request failed: {}", e);
            return DEFAULT_IMPACT_MESSAGE.to_string();
        }
    };

    if !response.status().is_success() {
        warn!("Text generation returned status {}", response.status());
        return DEFAULT_IMPACT_MESSAGE.to_string();
    }

    let parsed: TextGenResponse = match response.json().await {
        Ok(p) => p,
        Err(e) => {
            warn!("Text generation response parse failed: {}", e);
            return DEFAULT_IMPACT_MESSAGE.to_string();
        }
    };

    match parsed
        .content
        .first()
        .and_then(|b| b.text.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        Some(text) => {
            info!("Generated impact message ({} chars)", text.len());
            text.to_string()
        }
        None => {
            warn!("Text generation response contained no text");
            DEFAULT_IMPACT_MESSAGE.to_string()
        }
    }
}
