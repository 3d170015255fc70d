// HTTP-level tests for the Gemini and ElevenLabs clients against a mock server

use adforge::config::{GeminiConfig, SpeechConfig};
use adforge::errors::ProviderError;
use adforge::providers::{
    ElevenLabsClient, GeminiClient, ImageProvider, InlineData, OperationHandle, OperationStatus,
    SpeechProvider, TextProvider, TextRequest, VideoProvider, VideoRequest,
};
use mockito::Matcher;

fn gemini(base_url: String) -> GeminiClient {
    let config = GeminiConfig {
        base_url,
        text_model: "text-model".to_string(),
        image_model: "image-model".to_string(),
        video_model: "video-model".to_string(),
        ..GeminiConfig::with_api_key("test-key")
    };
    GeminiClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_gemini_text_generation() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(r"^/models/text-model:generateContent".to_string()))
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .match_body(Matcher::PartialJson(serde_json::json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"ok\":"},{"text":"true}"}]},"finishReason":"STOP"}]}"#,
        )
        .create_async()
        .await;

    let client = gemini(server.url());
    let text = client
        .generate_text(&TextRequest::new("plan a campaign").json())
        .await
        .unwrap();

    assert_eq!(text, r#"{"ok":true}"#);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_blocked_text_reports_reason() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", Matcher::Regex(r"^/models/text-model:generateContent".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"candidates":[],"promptFeedback":{"blockReason":"SAFETY"}}"#)
        .create_async()
        .await;

    let err = gemini(server.url())
        .generate_text(&TextRequest::new("something unsafe"))
        .await
        .unwrap_err();

    match err {
        ProviderError::Blocked(message) => assert!(message.contains("SAFETY")),
        other => panic!("expected blocked error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_gemini_error_status_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", Matcher::Regex(r"^/models/text-model:generateContent".to_string()))
        .with_status(400)
        .with_body("API key not valid")
        .create_async()
        .await;

    let err = gemini(server.url())
        .generate_text(&TextRequest::new("hello"))
        .await
        .unwrap_err();

    match err {
        ProviderError::Status { status, body, .. } => {
            assert_eq!(status, 400);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_gemini_image_generation_sends_logo_reference() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(r"^/models/image-model:generateContent".to_string()))
        .match_body(Matcher::PartialJson(serde_json::json!({
            "generationConfig": { "responseModalities": ["IMAGE", "TEXT"] }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"candidates":[{"content":{"parts":[{"text":"here you go"},{"inlineData":{"mimeType":"image/png","data":"iVBORw0K"}}]}}]}"#,
        )
        .create_async()
        .await;

    let logo = InlineData::new("image/png", "bG9nbw==");
    let image = gemini(server.url())
        .generate_image("serum on a shelf", std::slice::from_ref(&logo))
        .await
        .unwrap();

    assert_eq!(image, InlineData::new("image/png", "iVBORw0K"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_image_without_image_part_is_blocked() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", Matcher::Regex(r"^/models/image-model:generateContent".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"candidates":[{"content":{"parts":[{"text":"I can't draw that"}]},"finishReason":"IMAGE_SAFETY"}]}"#,
        )
        .create_async()
        .await;

    let err = gemini(server.url())
        .generate_image("anything", &[])
        .await
        .unwrap_err();

    match err {
        ProviderError::Blocked(message) => assert!(message.contains("IMAGE_SAFETY")),
        other => panic!("expected blocked error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_veo_submit_and_poll() {
    let mut server = mockito::Server::new_async().await;
    let submit = server
        .mock("POST", Matcher::Regex(r"^/models/video-model:predictLongRunning".to_string()))
        .match_body(Matcher::PartialJson(serde_json::json!({
            "parameters": { "sampleCount": 1, "aspectRatio": "9:16" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"models/video-model/operations/op-123"}"#)
        .create_async()
        .await;
    let pending = server
        .mock("GET", Matcher::Regex(r"^/models/video-model/operations/op-123".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"models/video-model/operations/op-123","done":false}"#)
        .expect(1)
        .create_async()
        .await;

    let client = gemini(server.url());
    let request = VideoRequest {
        prompt: "slow push-in on the bottle".to_string(),
        source_image: InlineData::new("image/png", "iVBORw0K"),
        aspect_ratio: "9:16".to_string(),
    };
    let handle = client.submit(&request).await.unwrap();
    assert_eq!(
        handle,
        OperationHandle("models/video-model/operations/op-123".to_string())
    );

    assert_eq!(client.poll(&handle).await.unwrap(), OperationStatus::Pending);
    submit.assert_async().await;
    pending.assert_async().await;

    pending.remove_async().await;
    server
        .mock("GET", Matcher::Regex(r"^/models/video-model/operations/op-123".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"name":"models/video-model/operations/op-123","done":true,"response":{"generateVideoResponse":{"generatedSamples":[{"video":{"uri":"https://media.example/v.mp4"}}]}}}"#,
        )
        .create_async()
        .await;

    assert_eq!(
        client.poll(&handle).await.unwrap(),
        OperationStatus::Done {
            uri: "https://media.example/v.mp4".to_string()
        }
    );
}

#[tokio::test]
async fn test_veo_operation_error_maps_to_failed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", Matcher::Regex(r"operations/op-9".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"operations/op-9","done":true,"error":{"code":3,"message":"Prompt rejected"}}"#)
        .create_async()
        .await;

    let status = gemini(server.url())
        .poll(&OperationHandle("operations/op-9".to_string()))
        .await
        .unwrap();

    assert_eq!(
        status,
        OperationStatus::Failed {
            message: "Prompt rejected".to_string()
        }
    );
}

#[tokio::test]
async fn test_elevenlabs_synthesis_returns_audio() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/text-to-speech/voice-1")
        .match_header("xi-api-key", "speech-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "text": "Wake up your skin.",
            "model_id": "eleven_multilingual_v2"
        })))
        .with_status(200)
        .with_header("content-type", "audio/mpeg")
        .with_body(b"abc")
        .create_async()
        .await;

    let config = SpeechConfig {
        base_url: server.url(),
        model_id: "eleven_multilingual_v2".to_string(),
        ..SpeechConfig::with_api_key("speech-key")
    };
    let client = ElevenLabsClient::new(&config).unwrap();
    let audio = client.synthesize("Wake up your skin.", "voice-1").await.unwrap();

    assert_eq!(audio.mime_type, "audio/mpeg");
    assert_eq!(audio.data, "YWJj");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_elevenlabs_empty_body_is_blocked() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/text-to-speech/voice-1")
        .with_status(200)
        .with_body("")
        .create_async()
        .await;

    let config = SpeechConfig {
        base_url: server.url(),
        ..SpeechConfig::with_api_key("speech-key")
    };
    let err = ElevenLabsClient::new(&config)
        .unwrap()
        .synthesize("line", "voice-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Blocked(_)));
}
