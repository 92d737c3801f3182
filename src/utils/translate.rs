//! Machine translation through a LibreTranslate-compatible endpoint.
//!
//! Translation never fails a request: when no endpoint is configured or the
//! call errors, the original text is returned and `translated` is `false`.

use crystaltides_config::IntegrationsConfig;
use crystaltides_models::TranslationResult;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Clone, Debug)]
pub struct Translator {
    client: reqwest::Client,
    api_url: Option<String>,
    api_key: Option<String>,
}

impl Translator {
    pub fn new(client: reqwest::Client, config: &IntegrationsConfig) -> Self {
        Self {
            client,
            api_url: config.translation_api_url.clone(),
            api_key: config.translation_api_key.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_url.is_some()
    }

    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn translate(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> TranslationResult {
        let untranslated = || TranslationResult {
            text: text.to_string(),
            target: target.to_string(),
            translated: false,
        };

        let Some(url) = self.api_url.as_deref() else {
            return untranslated();
        };
        if text.trim().is_empty() {
            return untranslated();
        }

        match self.request(url, text, target, source.unwrap_or("auto")).await {
            Ok(translated) => TranslationResult {
                text: translated,
                target: target.to_string(),
                translated: true,
            },
            Err(e) => {
                warn!(error = %e, "Translation failed, returning original text");
                untranslated()
            }
        }
    }

    /// Translates to `target`, or returns `text` unchanged.
    pub async fn translate_or_original(&self, text: &str, target: &str) -> String {
        self.translate(text, target, None).await.text
    }

    async fn request(
        &self,
        url: &str,
        text: &str,
        target: &str,
        source: &str,
    ) -> Result<String, reqwest::Error> {
        let body = TranslateRequest {
            q: text,
            source,
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let response: TranslateResponse = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_returns_original() {
        let translator = Translator::new(reqwest::Client::new(), &IntegrationsConfig::default());
        assert!(!translator.is_configured());
        let result = translator.translate("Hola mundo", "en", None).await;
        assert_eq!(result.text, "Hola mundo");
        assert_eq!(result.target, "en");
        assert!(!result.translated);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let config = IntegrationsConfig {
            translation_api_url: Some("http://127.0.0.1:9/translate".to_string()),
            ..IntegrationsConfig::default()
        };
        let translator = Translator::new(reqwest::Client::new(), &config);
        assert_eq!(translator.translate_or_original("Encuesta", "en").await, "Encuesta");
    }
}
