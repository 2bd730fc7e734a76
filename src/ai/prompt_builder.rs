//! Prompt construction for the two summarization calls.

use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};

pub const TOPIC_SUMMARIZATION_SYSTEM_PROMPT: &str = r#"You are an expert in summarizing refined outlines from documents and dialogues. Your task is to identify 1-20 distinct discussion topics from chat histories, focusing on key points and maintaining the conversation's essence.

Respond with a JSON array only, no prose. Each element must have this shape:
{"topicName": string, "sinceId": number, "participants": [string], "discussion": [{"point": string, "keyIds": [number]}], "conclusion": string (optional)}

Example output:
[{"topicName":"Release planning","sinceId":123456789,"participants":["John","Mary"],"discussion":[{"point":"Ship the beta on Friday","keyIds":[123456789]}],"conclusion":"Beta ships Friday"}]"#;

pub const CONDENSED_SYSTEM_PROMPT: &str = "You are a concise chat-log summarizer. \
Condense the provided chat history into a single sentence capturing its core, \
and work 1-2 fitting emoji into it. Be sharp and to the point. \
Reply with the sentence only, no preamble and no explanation.";

fn system(content: &str) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role: MessageRole::system,
        content: Content::Text(content.to_string()),
        name: None,
        tool_calls: None,
        tool_call_id: None,
    }
}

fn user(content: String) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role: MessageRole::user,
        content: Content::Text(content),
        name: None,
        tool_calls: None,
        tool_call_id: None,
    }
}

#[must_use]
pub fn build_topic_prompt(transcript: &str) -> Vec<ChatCompletionMessage> {
    vec![
        system(TOPIC_SUMMARIZATION_SYSTEM_PROMPT),
        user(format!(
            "Please analyze the following chat history and summarize every topic.\n\n\
             Chat histories:\"\"\"\n{transcript}\n\"\"\"\n\n\
             Note: Topics may be discussed in parallel, so consider relevant keywords \
             across the chat histories. Be concise and focus on the key essence of each topic."
        )),
    ]
}

#[must_use]
pub fn build_condense_prompt(transcript: &str) -> Vec<ChatCompletionMessage> {
    vec![
        system(CONDENSED_SYSTEM_PROMPT),
        user(format!(
            "Here is a chat log; give me your one-line summary:\n\n\
             Chat log:\"\"\"\n{transcript}\n\"\"\"\n\n\
             Reply with the summary only."
        )),
    ]
}
