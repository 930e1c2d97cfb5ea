use std::sync::Arc;

use crate::coordinator::RequestCoordinator;
use crate::languages::{self, Language};
use crate::shape::RequestShape;
use crate::state::{Message, RequestState};
use crate::transport::Transport;

/// Medical translation conversation with a swappable language pair.
pub struct Translator {
    coordinator: RequestCoordinator,
    source: &'static Language,
    target: &'static Language,
}

impl Translator {
    /// Unknown codes fall back to Chinese -> English, the screen's defaults.
    pub fn new(transport: Arc<dyn Transport>, source: &str, target: &str) -> Self {
        let source = languages::resolve(source)
            .or_else(|| languages::find("zh"))
            .unwrap_or(&languages::LANGUAGES[0]);
        let target = languages::resolve(target).unwrap_or(&languages::LANGUAGES[0]);
        let shape = RequestShape::translation(source.code, target.code);
        Self {
            coordinator: RequestCoordinator::new(transport, shape),
            source,
            target,
        }
    }

    pub fn source(&self) -> &'static Language {
        self.source
    }

    pub fn target(&self) -> &'static Language {
        self.target
    }

    pub fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut RequestCoordinator {
        &mut self.coordinator
    }

    pub fn messages(&self) -> &[Message] {
        self.coordinator.messages()
    }

    pub fn state(&self) -> RequestState {
        self.coordinator.state()
    }

    pub async fn translate(&mut self, text: &str) -> bool {
        self.coordinator.submit(text).await
    }

    pub fn dispatch(&mut self, text: &str) -> bool {
        self.coordinator.dispatch(text)
    }

    /// Swap source and target. Returns the latest translation so the caller
    /// can offer it as the next input, or `None` if the swap was refused.
    ///
    /// The returned text is empty unless the last request came back with a
    /// translation; error and fallback texts are never offered as input.
    pub fn swap_languages(&mut self) -> Option<String> {
        if self.coordinator.is_pending() {
            return None;
        }
        std::mem::swap(&mut self.source, &mut self.target);
        self.sync_shape();
        Some(
            self.coordinator
                .session()
                .and_then(|s| s.last_reply())
                .unwrap_or_default()
                .to_string(),
        )
    }

    pub fn set_source(&mut self, code: &str) -> bool {
        match self.resolve_unlocked(code) {
            Some(lang) => {
                self.source = lang;
                self.sync_shape();
                true
            }
            None => false,
        }
    }

    pub fn set_target(&mut self, code: &str) -> bool {
        match self.resolve_unlocked(code) {
            Some(lang) => {
                self.target = lang;
                self.sync_shape();
                true
            }
            None => false,
        }
    }

    fn resolve_unlocked(&self, code: &str) -> Option<&'static Language> {
        if self.coordinator.is_pending() {
            return None;
        }
        languages::resolve(code)
    }

    fn sync_shape(&mut self) {
        let (source, target) = (self.source.code, self.target.code);
        let shape = self.coordinator.shape_mut();
        shape.set_context("source_language", source);
        shape.set_context("target_language", target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        bodies: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, body: &Value) -> Result<Value, TransportError> {
            self.bodies.lock().unwrap().push(body.clone());
            Ok(json!({
                "original_text": body["text"],
                "translated_text": format!("[{}] {}", body["target_language"].as_str().unwrap_or(""), body["text"].as_str().unwrap_or("")),
            }))
        }
    }

    #[tokio::test]
    async fn test_translate_sends_language_pair() {
        let transport = Arc::new(RecordingTransport::default());
        let mut translator = Translator::new(transport.clone(), "zh", "en");

        assert!(translator.translate("头痛").await);

        let bodies = transport.bodies.lock().unwrap();
        assert_eq!(
            bodies[0],
            json!({
                "text": "头痛",
                "source_language": "zh",
                "target_language": "en",
            })
        );
        assert_eq!(translator.messages()[1].text(), "[en] 头痛");
    }

    #[tokio::test]
    async fn test_swap_exchanges_pair_and_returns_last_translation() {
        let transport = Arc::new(RecordingTransport::default());
        let mut translator = Translator::new(transport.clone(), "sw", "en");
        translator.translate("homa").await;

        let prefill = translator.swap_languages();
        assert_eq!(prefill.as_deref(), Some("[en] homa"));
        assert_eq!(translator.source().code, "en");
        assert_eq!(translator.target().code, "sw");

        translator.translate("fever").await;
        let bodies = transport.bodies.lock().unwrap();
        assert_eq!(bodies[1]["source_language"], "en");
        assert_eq!(bodies[1]["target_language"], "sw");
    }

    #[tokio::test]
    async fn test_swap_after_failure_or_missing_translation_prefills_nothing() {
        struct ScriptedTransport {
            replies: Mutex<Vec<Result<Value, TransportError>>>,
        }

        #[async_trait]
        impl Transport for ScriptedTransport {
            async fn send(&self, _body: &Value) -> Result<Value, TransportError> {
                self.replies.lock().unwrap().remove(0)
            }
        }

        let transport = Arc::new(ScriptedTransport {
            replies: Mutex::new(vec![
                Ok(json!({ "translated_text": "Headache" })),
                Err(TransportError::Status {
                    status: 502,
                    body: "bad gateway".to_string(),
                }),
                Ok(json!({ "original_text": "发烧" })),
            ]),
        });
        let mut translator = Translator::new(transport, "zh", "en");

        translator.translate("头痛").await;
        translator.translate("头晕").await;
        assert_eq!(translator.messages()[3].text(), crate::TRANSPORT_FAILURE_TEXT);
        assert_eq!(translator.swap_languages().as_deref(), Some(""));

        translator.swap_languages();
        translator.translate("发烧").await;
        assert_eq!(translator.messages()[5].text(), "No translation returned.");
        assert_eq!(translator.swap_languages().as_deref(), Some(""));
        assert_eq!(translator.source().code, "en");
    }

    #[test]
    fn test_swap_refused_while_pending() {
        let mut translator = Translator::new(Arc::new(RecordingTransport::default()), "ar", "en");
        translator.coordinator_mut().begin("صداع").unwrap();

        assert!(translator.swap_languages().is_none());
        assert!(!translator.set_target("fr"));
        assert_eq!(translator.source().code, "ar");
        assert_eq!(translator.target().code, "en");
    }

    #[test]
    fn test_unknown_codes_use_defaults_and_are_rejected_later() {
        let mut translator = Translator::new(Arc::new(RecordingTransport::default()), "xx", "yy");
        assert_eq!(translator.source().code, "zh");
        assert_eq!(translator.target().code, "en");

        assert!(!translator.set_source("xx"));
        assert!(translator.set_source("Amharic"));
        assert_eq!(
            translator.coordinator().shape().context("source_language"),
            Some(&json!("am"))
        );
    }
}
