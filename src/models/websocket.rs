use serde::{ Serialize, Deserialize };

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "chat")] Chat {
        content: String,
    },
    #[serde(rename = "voice")] Voice {
        transcript: String,
    },
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "response")] Response {
        id: i64,
        content: String,
        suggestions: Vec<String>,
        intent: String,
        timestamp: i64,
    },
    #[serde(rename = "command")] Command {
        command: String,
        phrase: String,
        score: f64,
    },
    #[serde(rename = "error")] Error {
        message: String,
    },
    #[serde(rename = "typing")]
    Typing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_client_frames() {
        let chat: ClientMessage = serde_json
            ::from_str(r#"{"type":"chat","content":"hello"}"#)
            .unwrap();
        assert_eq!(chat, ClientMessage::Chat { content: "hello".into() });

        let voice: ClientMessage = serde_json
            ::from_str(r#"{"type":"voice","transcript":"open navigation"}"#)
            .unwrap();
        assert_eq!(voice, ClientMessage::Voice { transcript: "open navigation".into() });

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"shout"}"#).is_err());
    }

    #[test]
    fn typing_frame_is_just_a_tag() {
        let json = serde_json::to_string(&ServerMessage::Typing).unwrap();
        assert_eq!(json, r#"{"type":"typing"}"#);
    }
}
