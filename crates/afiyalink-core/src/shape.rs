use serde_json::{Map, Value};

pub const CHAT_PATH: &str = "/api/v1/health-chat";
pub const TRANSLATE_PATH: &str = "/translate";

/// Languages the health chatbot answers in
pub const CHAT_LANGUAGES: &[&str] = &["en", "ar", "fr", "ur"];

/// Fixed request/response layout for one kind of conversation.
#[derive(Debug, Clone)]
pub struct RequestShape {
    message_key: String,
    context: Map<String, Value>,
    reply_field: String,
    missing_reply_text: String,
}

impl RequestShape {
    pub fn new(message_key: &str, reply_field: &str) -> Self {
        Self {
            message_key: message_key.to_string(),
            context: Map::new(),
            reply_field: reply_field.to_string(),
            missing_reply_text: "No response received.".to_string(),
        }
    }

    /// Health chatbot: `{message, user_id, language, cultural_background}`
    /// answered by `{response, ...}`.
    pub fn chat(user_id: &str, language: &str) -> Self {
        Self::new("message", "response")
            .with_context("user_id", user_id)
            .with_context("language", language)
            .with_context("cultural_background", "general")
            .missing_reply("Sorry, I could not find an answer to that.")
    }

    /// Medical translator: `{text, source_language, target_language}`
    /// answered by `{translated_text, ...}`.
    pub fn translation(source: &str, target: &str) -> Self {
        Self::new("text", "translated_text")
            .with_context("source_language", source)
            .with_context("target_language", target)
            .missing_reply("No translation returned.")
    }

    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn missing_reply(mut self, text: &str) -> Self {
        self.missing_reply_text = text.to_string();
        self
    }

    pub fn set_context(&mut self, key: &str, value: impl Into<Value>) {
        self.context.insert(key.to_string(), value.into());
    }

    pub fn context(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// Request body for `text`. The message key overrides any context field
    /// with the same name.
    pub fn body(&self, text: &str) -> Value {
        let mut body = self.context.clone();
        body.insert(self.message_key.clone(), Value::String(text.to_string()));
        Value::Object(body)
    }

    /// The reply field of `payload`, if present and a string
    pub fn extract_reply(&self, payload: &Value) -> Option<String> {
        payload
            .get(&self.reply_field)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Agent text carried by `payload`, or the fallback when the reply field
    /// is absent or not a string.
    pub fn reply_text(&self, payload: &Value) -> String {
        self.extract_reply(payload)
            .unwrap_or_else(|| self.missing_reply_text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_body_includes_context() {
        let shape = RequestShape::chat("visitor-1", "en");
        assert_eq!(
            shape.body("I have a headache"),
            json!({
                "message": "I have a headache",
                "user_id": "visitor-1",
                "language": "en",
                "cultural_background": "general",
            })
        );
    }

    #[test]
    fn test_message_key_wins_over_context() {
        let shape = RequestShape::new("message", "reply").with_context("message", "stale");
        assert_eq!(shape.body("fresh")["message"], "fresh");
    }

    #[test]
    fn test_reply_text_reads_field() {
        let shape = RequestShape::translation("zh", "en");
        let payload = json!({
            "original_text": "头痛",
            "refined_text": "头痛",
            "translated_text": "Headache",
        });
        assert_eq!(shape.reply_text(&payload), "Headache");
    }

    #[test]
    fn test_reply_text_falls_back_when_missing_or_not_string() {
        let shape = RequestShape::new("message", "reply").missing_reply("nothing");
        assert_eq!(shape.reply_text(&json!({})), "nothing");
        assert_eq!(shape.reply_text(&json!({"reply": 42})), "nothing");
        assert_eq!(shape.reply_text(&json!("reply")), "nothing");
    }

    #[test]
    fn test_extract_reply_is_none_for_fallback_cases() {
        let shape = RequestShape::translation("zh", "en");
        assert_eq!(shape.extract_reply(&json!({})), None);
        assert_eq!(shape.extract_reply(&json!({"translated_text": null})), None);
        assert_eq!(
            shape.extract_reply(&json!({"translated_text": "Fever"})),
            Some("Fever".to_string())
        );
    }
}
