use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub separator: String,
    pub boundary_marker: String,
    pub api_hostname: String,
    pub api_key: String,
    pub model: String,
    pub system_message: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let separator = env::var("NOTECHAT_SEPARATOR").unwrap_or_else(|_| "---".to_string());
        let boundary_marker =
            env::var("NOTECHAT_BOUNDARY_MARKER").unwrap_or_else(|_| "^^^".to_string());
        let api_hostname = env::var("NOTECHAT_LLM_HOST")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let model = env::var("NOTECHAT_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let system_message = env::var("NOTECHAT_SYSTEM_MESSAGE").unwrap_or_else(|_| {
            "You help with whatever is asked to the best of your ability.".to_string()
        });

        Self {
            separator,
            boundary_marker,
            api_hostname,
            api_key,
            model,
            system_message,
        }
    }
}
