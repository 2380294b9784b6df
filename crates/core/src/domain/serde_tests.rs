#[cfg(test)]
mod tests {
    use crate::domain::cycle::{CycleInfo, CycleStatus};
    use crate::domain::error::{AppError, ErrorCode};
    use crate::domain::settings::{ProviderKind, ProviderSettings};
    use crate::domain::types::{OptimizeResponse, RuntimeMessage, TriggerSource};

    #[test]
    fn test_runtime_message_serialization() {
        let msg = RuntimeMessage::OptimizePrompt {
            prompt: "fix my bug".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "action": "optimizePrompt", "prompt": "fix my bug" })
        );
    }

    #[test]
    fn test_runtime_message_deserialization() {
        let msg: RuntimeMessage =
            serde_json::from_str(r#"{"action":"optimizePrompt","prompt":"hi"}"#).unwrap();
        assert_eq!(
            msg,
            RuntimeMessage::OptimizePrompt {
                prompt: "hi".to_string()
            }
        );

        let unknown = serde_json::from_str::<RuntimeMessage>(r#"{"action":"other","prompt":"hi"}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_optimize_response_shapes() {
        let ok = serde_json::to_string(&OptimizeResponse::success("done")).unwrap();
        assert_eq!(ok, r#"{"optimizedPrompt":"done"}"#);

        let err = serde_json::to_string(&OptimizeResponse::failure("boom")).unwrap();
        assert_eq!(err, r#"{"error":"boom"}"#);

        let parsed: OptimizeResponse = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert_eq!(parsed.into_result(), Err("nope".to_string()));
    }

    #[test]
    fn test_provider_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ProviderKind::OpenAi).unwrap(),
            "\"openai\""
        );
        assert_eq!(
            serde_json::from_str::<ProviderKind>("\"gemini\"").unwrap(),
            ProviderKind::Gemini
        );
    }

    #[test]
    fn test_provider_settings_uses_storage_keys() {
        let settings = ProviderSettings {
            selected_provider: Some("openai".into()),
            openai_api_key: Some("sk-test".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["selectedProvider"], "openai");
        assert_eq!(json["openaiApiKey"], "sk-test");
        assert!(json["groqApiKey"].is_null());
    }

    #[test]
    fn test_error_code_serialization() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::MissingCredential).unwrap(),
            "\"E_MISSING_CREDENTIAL\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::Delivery).unwrap(),
            format!("\"{}\"", ErrorCode::Delivery.as_str())
        );
    }

    #[test]
    fn test_app_error_serialization() {
        let err = AppError::storage("disk full");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("E_STORAGE"));
        assert!(json.contains("disk full"));
        assert!(json.contains("\"recoverable\":false"));
    }

    #[test]
    fn test_cycle_info_serialization() {
        let mut info = CycleInfo::new(3, TriggerSource::Shortcut, "2026-01-01T00:00:00Z".into());
        info.status = CycleStatus::Superseded;
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["source"], "shortcut");
        assert_eq!(json["status"], "superseded");
        assert_eq!(json["cycle_id"], 3);
    }
}
