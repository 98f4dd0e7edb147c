//! PayloadCodec - envelope と保存用テキストの相互変換
//!
//! # フォーマット
//! 1. envelope を JSON `{"kind": ..., "payload": ...}` にする
//! 2. standard base64 でテキスト化（どのストレージにもそのまま入る）
//!
//! id と status は含めない。Store の列が正本。

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::command::Command;
use crate::domain::CommandEnvelope;
use crate::error::CodecError;

#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadCodec;

impl PayloadCodec {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, envelope: &CommandEnvelope) -> Result<String, CodecError> {
        let json = serde_json::to_vec(envelope).map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(STANDARD.encode(json))
    }

    pub fn decode(&self, encoded: &str) -> Result<CommandEnvelope, CodecError> {
        let json = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CodecError::Malformed(format!("base64: {e}")))?;
        serde_json::from_slice(&json).map_err(|e| CodecError::Malformed(format!("json: {e}")))
    }

    pub fn encode_command<C: Command>(&self, command: &C) -> Result<String, CodecError> {
        self.encode(&CommandEnvelope::from_command(command)?)
    }

    pub fn decode_command<C: Command>(&self, encoded: &str) -> Result<C, CodecError> {
        self.decode(encoded)?.into_command()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::domain::CommandKind;
    use crate::testing::{Convert, Detail, ListPage, Print};

    /// Free text plus the characters that need escaping somewhere.
    fn arb_document() -> impl Strategy<Value = String> {
        prop_oneof![
            any::<String>(),
            r#"[a-zA-Z0-9 ._/"'%&<>()-]{0,40}"#,
            r#"[äöüéñß日本語 "]{1,20}\.pdf"#,
        ]
    }

    fn arb_url() -> impl Strategy<Value = String> {
        "(https?|ftp)://[a-z0-9.-]{1,20}(/[a-zA-Z0-9._~%?=&-]{0,15}){0,4}"
    }

    proptest! {
        #[test]
        fn typed_round_trip_holds_for_any_document(document in arb_document()) {
            let codec = PayloadCodec::new();
            let command = Print { document };

            let encoded = codec.encode_command(&command).unwrap();
            prop_assert!(encoded.is_ascii());
            prop_assert_eq!(codec.decode_command::<Print>(&encoded).unwrap(), command);
        }

        #[test]
        fn typed_round_trip_holds_for_any_number(items in any::<u32>(), n in any::<u32>()) {
            let codec = PayloadCodec::new();

            let list = ListPage { items };
            let encoded = codec.encode_command(&list).unwrap();
            prop_assert_eq!(codec.decode_command::<ListPage>(&encoded).unwrap(), list);

            let detail = Detail { n };
            let encoded = codec.encode_command(&detail).unwrap();
            prop_assert_eq!(codec.decode_command::<Detail>(&encoded).unwrap(), detail);
        }

        #[test]
        fn envelope_round_trip_holds_for_any_kind(
            kind in any::<String>(),
            url in arb_url(),
            page in any::<u32>(),
        ) {
            let codec = PayloadCodec::new();
            let envelope = CommandEnvelope::new(
                CommandKind::new(kind),
                serde_json::json!({ "url": url, "page": page }),
            );

            let encoded = codec.encode(&envelope).unwrap();
            prop_assert!(encoded.is_ascii());
            prop_assert_eq!(codec.decode(&encoded).unwrap(), envelope);
        }
    }

    #[test]
    fn round_trip_preserves_kind_and_payload() {
        let codec = PayloadCodec::new();
        let original = ListPage { items: 2 };

        let encoded = codec.encode_command(&original).unwrap();
        let back: ListPage = codec.decode_command(&encoded).unwrap();
        assert_eq!(back, original);

        let env = codec.decode(&encoded).unwrap();
        assert_eq!(env.kind().as_str(), ListPage::KIND);
    }

    #[test]
    fn encoded_form_is_plain_ascii() {
        let encoded = PayloadCodec::new()
            .encode_command(&Print::new("résumé \"final\".pdf"))
            .unwrap();
        assert!(encoded.is_ascii());
        assert!(!encoded.contains('"'));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = PayloadCodec::new();
        assert!(matches!(codec.decode("%%% not base64"), Err(CodecError::Malformed(_))));

        let not_json = STANDARD.encode(b"hello");
        assert!(matches!(codec.decode(&not_json), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn typed_decode_checks_kind() {
        let codec = PayloadCodec::new();
        let encoded = codec.encode_command(&Print::new("X.pdf")).unwrap();
        let err = codec.decode_command::<Convert>(&encoded).unwrap_err();
        assert!(matches!(err, CodecError::KindMismatch { .. }));
    }
}
