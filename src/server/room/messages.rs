use serde::{Serialize, Deserialize};
use serde_json::Value;

use crate::server::error::RelayError;

/// Kind of request a client can send.
#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Search,
    AcceptMatch,
    DeclineMatch,
    SendMessage,
}

// Message client -> server
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ClientAction {
    #[serde(rename = "Type")]
    pub kind: ActionType,
    #[serde(rename = "Payload", default)]
    pub payload: Value,
}

impl ClientAction {
    pub fn new(kind: ActionType) -> Self {
        Self { kind, payload: Value::Null }
    }

    /// Decode one inbound text frame. Newlines are folded into spaces and
    /// surrounding whitespace is dropped before parsing.
    pub fn decode(frame: &str) -> Result<Self, RelayError> {
        let normalized = frame.replace('\n', " ");
        Ok(serde_json::from_str(normalized.trim())?)
    }

    /// Chat text carried by a `SEND_MESSAGE` action, `null` when missing.
    pub fn message(&self) -> Value {
        self.payload.get("message").cloned().unwrap_or(Value::Null)
    }
}

/// Payload of events that carry no data (serialized as `null`).
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoPayload;

/// Who wrote a relayed message, from the recipient's point of view.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageOrigin {
    /// The recipient's partner wrote it.
    Partner,
    /// Echo of the recipient's own message.
    User,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub message: Value,
    pub from: MessageOrigin,
    /// Unix seconds, shared by both copies of one relayed message.
    pub time: i64,
}

// Message server -> client
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "Type", content = "Payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    MatchFound {},
    NoMatch {},
    JoinedMatch {},
    PartnerAccepted {},
    AcceptedMatch {},
    PartnerDeclined {},
    DeclinedMatch {},
    MessageReceived(ChatMessage),
    PartnerDisconnected(NoPayload),
}

impl ServerEvent {
    pub fn message_received(message: Value, from: MessageOrigin, time: i64) -> Self {
        Self::MessageReceived(ChatMessage { message, from, time })
    }
    pub fn partner_disconnected() -> Self {
        Self::PartnerDisconnected(NoPayload)
    }

    pub fn encode(&self) -> Result<String, RelayError> {
        serde_json::to_string(self).map_err(RelayError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_send_message() {
        let action = ClientAction::decode(r#"{"Type":"SEND_MESSAGE","Payload":{"message":"hi"}}"#)
            .expect("valid action");
        assert_eq!(action.kind, ActionType::SendMessage);
        assert_eq!(action.message(), json!("hi"));
    }

    #[test]
    fn test_decode_folds_newlines_and_trims() {
        let frame = "  {\"Type\":\n\"SEARCH\"}\n\n";
        let action = ClientAction::decode(frame).expect("valid action");
        assert_eq!(action.kind, ActionType::Search);
        assert_eq!(action.payload, Value::Null);
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let err = ClientAction::decode(r#"{"Type":"SHOUT","Payload":{}}"#).unwrap_err();
        assert!(matches!(err, RelayError::Decode(_)));
        assert!(ClientAction::decode("not json").is_err());
    }

    #[test]
    fn test_message_missing_is_null() {
        let action = ClientAction::decode(r#"{"Type":"SEND_MESSAGE","Payload":{"text":"hi"}}"#)
            .expect("valid action");
        assert_eq!(action.message(), Value::Null);
    }

    #[test]
    fn test_server_event_wire_shape() {
        let found = serde_json::to_value(ServerEvent::MatchFound {}).unwrap();
        assert_eq!(found, json!({"Type": "MATCH_FOUND", "Payload": {}}));

        let gone = serde_json::to_value(ServerEvent::partner_disconnected()).unwrap();
        assert_eq!(gone, json!({"Type": "PARTNER_DISCONNECTED", "Payload": null}));

        let received = ServerEvent::message_received(json!("hello"), MessageOrigin::Partner, 1_700_000_000);
        assert_eq!(
            serde_json::to_value(received).unwrap(),
            json!({
                "Type": "MESSAGE_RECEIVED",
                "Payload": {"message": "hello", "from": "PARTNER", "time": 1_700_000_000}
            })
        );
    }
}
