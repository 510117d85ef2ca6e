//! MCP prompt catalogue.

use crate::protocol::{PromptDefinition, PromptGetResult, PromptMessage, ToolResultContent};

pub const USER_TOKEN_ORGANIZATION_PROMPT: &str = "user_token_organization_prompt";

const USER_TOKEN_ORGANIZATION_TEXT: &str =
    "When asked for detail of a users pipelines start by looking up the user's token organization";

/// All prompts the server offers.
pub fn available_prompts() -> Vec<PromptDefinition> {
    vec![PromptDefinition {
        name: USER_TOKEN_ORGANIZATION_PROMPT.to_string(),
        description: Some(USER_TOKEN_ORGANIZATION_TEXT.to_string()),
    }]
}

/// Render the prompt called `name`, or `None` if there is no such prompt.
pub fn get_prompt(name: &str) -> Option<PromptGetResult> {
    match name {
        USER_TOKEN_ORGANIZATION_PROMPT => Some(PromptGetResult {
            description: Some(USER_TOKEN_ORGANIZATION_TEXT.to_string()),
            messages: vec![PromptMessage {
                role: "user".to_string(),
                content: ToolResultContent::Text {
                    text: USER_TOKEN_ORGANIZATION_TEXT.to_string(),
                },
            }],
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_prompts() {
        let prompts = available_prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].name, "user_token_organization_prompt");
        assert!(prompts[0]
            .description
            .as_deref()
            .unwrap()
            .contains("user's token organization"));
    }

    #[test]
    fn test_get_prompt_renders_user_message() {
        let result = get_prompt(USER_TOKEN_ORGANIZATION_PROMPT).unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"]["type"], "text");
        assert_eq!(json["messages"][0]["content"]["text"], USER_TOKEN_ORGANIZATION_TEXT);
        assert_eq!(json["description"], USER_TOKEN_ORGANIZATION_TEXT);
    }

    #[test]
    fn test_get_unknown_prompt() {
        assert!(get_prompt("no_such_prompt").is_none());
    }
}
