use async_trait::async_trait;
use lexi_config::definer::DefinerConfig;
use lexi_core::EntryMetadata;
use serde::Serialize;
use serde_json::Value;

use crate::{DefineError, Definer, DefinerMetadata, Definition};

#[derive(Serialize)]
struct DefineRequest<'a> {
    word: &'a str,
    context: &'a str,
    language: &'a str,
    target_language: &'a str,
}

/// Definer backed by a JSON HTTP endpoint.
///
/// Request: `{word, context, language, target_language}`.
/// Response: `{"translation": "...", "metadata": {"gender": "m", ...}}`.
#[derive(Clone)]
pub struct HttpDefiner {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    target_language: String,
}

impl HttpDefiner {
    pub fn new(api_key: String, api_url: String, target_language: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            api_url,
            target_language,
        }
    }

    pub fn from_config(config: &DefinerConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.api_url.clone(),
            config.target_language.clone(),
        )
    }
}

#[async_trait]
impl Definer for HttpDefiner {
    async fn define(
        &self,
        word: &str,
        context: &str,
        language: &str,
    ) -> Result<Definition, DefineError> {
        let body = DefineRequest {
            word,
            context,
            language,
            target_language: &self.target_language,
        };

        let mut request = self.client.post(&self.api_url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }
        let response = request.send().await?;

        if response.status() == 429 {
            return Err(DefineError::RateLimitExceeded);
        }

        if response.status() == 401 || response.status() == 403 {
            return Err(DefineError::AuthenticationError);
        }

        if !response.status().is_success() {
            return Err(DefineError::ApiError(format!("HTTP {}", response.status())));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| DefineError::ApiError(format!("Failed to parse response: {}", e)))?;

        tracing::debug!("Definer answered for '{}'", word);
        parse_definition(word, &json, self.metadata().name)
    }

    fn metadata(&self) -> DefinerMetadata {
        DefinerMetadata {
            name: "http".to_string(),
            requires_api_key: false,
        }
    }
}

fn parse_definition(
    word: &str,
    json: &Value,
    provider: String,
) -> Result<Definition, DefineError> {
    let translation = json["translation"]
        .as_str()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DefineError::Empty(word.to_string()))?;

    let metadata = match json.get("metadata") {
        Some(Value::Object(map)) => EntryMetadata::from_pairs(
            map.iter()
                .filter_map(|(key, value)| value.as_str().map(|v| (key.as_str(), v))),
        ),
        _ => EntryMetadata::default(),
    };

    Ok(Definition {
        translation: translation.to_string(),
        metadata,
        provider,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_translation_and_metadata() {
        let json = json!({
            "translation": " school ",
            "metadata": {"hanja": "學校", "gender": "N", "level": "A1", "count": 3}
        });
        let definition = parse_definition("학교", &json, "http".to_string()).unwrap();

        assert_eq!(definition.translation, "school");
        assert_eq!(definition.provider, "http");
        assert_eq!(definition.metadata.root_script.as_deref(), Some("學校"));
        assert_eq!(definition.metadata.gender.as_deref(), Some("n"));
        assert_eq!(definition.metadata.notes, vec!["level: A1".to_string()]);
    }

    #[test]
    fn missing_translation_is_an_error() {
        let err = parse_definition("x", &json!({"translation": "  "}), String::new()).unwrap_err();
        assert!(matches!(err, DefineError::Empty(_)));
        assert!(parse_definition("x", &json!([]), String::new()).is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let definer = HttpDefiner::new(
            String::new(),
            "http://127.0.0.1:9/define".to_string(),
            "en".to_string(),
        );
        let err = definer.define("cat", "", "en").await.unwrap_err();
        assert!(matches!(err, DefineError::NetworkError(_)));
    }
}
