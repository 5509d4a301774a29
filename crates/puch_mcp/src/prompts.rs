use rmcp::model::{GetPromptResult, PromptMessage, PromptMessageRole};

pub fn draft_message_prompt(contact: &str, intent: &str) -> GetPromptResult {
    let mut result = GetPromptResult::new(vec![PromptMessage::new_text(
        PromptMessageRole::User,
        format!(
            "I want to message {contact}. Intent: {intent}.\n\n1. Use get_contacts with search=\"{contact}\" to find their phone number. If several contacts match, ask me which one.\n2. Draft a short, friendly message that fits the intent and show it to me.\n3. After I confirm, call send_message with the phone number and the final text, then report the message id."
        ),
    )]);
    result.description = Some(format!("Draft and send a WhatsApp message to {}", contact));
    result
}

pub fn messaging_report_prompt() -> GetPromptResult {
    let mut result = GetPromptResult::new(vec![PromptMessage::new_text(
        PromptMessageRole::User,
        "Give me a short report on my WhatsApp activity.\n\nUse get_analytics for total messages, active chats, response rate and top contact, and get_contacts for the contact list. Point out anything that needs a follow-up.".to_string(),
    )]);
    result.description = Some("Summary of messaging activity".to_string());
    result
}
