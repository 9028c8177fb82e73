// Contract tests for the remote service clients
//
// These tests verify the request format each client sends and how responses
// and failures are mapped, against a wiremock server.

use bytes::Bytes;
use serde_json::json;
use std::time::Duration;
use voice_kiosk::location::HttpLocation;
use voice_kiosk::remote::{
    AskRequest, AudioUpload, HttpReasoner, HttpSynthesizer, HttpTranscriber, Reasoner,
    SpeakRequest, Synthesizer, Transcriber,
};
use voice_kiosk::{Language, LocationProvider, RemoteError};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn upload() -> AudioUpload {
    AudioUpload {
        bytes: Bytes::from_static(b"RIFF....WAVEfmt "),
        media_type: "audio/wav".to_string(),
        file_name: "recording.wav".to_string(),
    }
}

fn ask() -> AskRequest {
    AskRequest {
        text: "Where is the museum?".to_string(),
        lat: -23.55,
        lon: -46.63,
        voice: "en-US-JennyNeural".to_string(),
        language: Language::En,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transcription
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_transcription_uploads_multipart_audio() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/transcribe"))
        .and(header("accept", "application/json"))
        .and(body_string_contains("name=\"audio\""))
        .and(body_string_contains("filename=\"recording.wav\""))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"text": "hola", "language_code": "es-es"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpTranscriber::new(format!("{}/transcribe", server.uri()), TIMEOUT).unwrap();
    let transcription = client.transcribe(upload()).await.unwrap();

    assert_eq!(transcription.text, "hola");
    assert_eq!(transcription.language_code, "ES-ES");
}

#[tokio::test]
async fn test_transcription_language_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/transcribe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "olá"})))
        .mount(&server)
        .await;

    let client = HttpTranscriber::new(format!("{}/transcribe", server.uri()), TIMEOUT).unwrap();
    let transcription = client.transcribe(upload()).await.unwrap();

    assert_eq!(transcription.language_code, "PT-BR");
}

#[tokio::test]
async fn test_transcription_accepts_legacy_language_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/transcribe"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"text": "ciao", "language": "IT-IT"})),
        )
        .mount(&server)
        .await;

    let client = HttpTranscriber::new(format!("{}/transcribe", server.uri()), TIMEOUT).unwrap();
    let transcription = client.transcribe(upload()).await.unwrap();

    assert_eq!(transcription.language_code, "IT-IT");
}

#[tokio::test]
async fn test_transcription_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/transcribe"))
        .respond_with(ResponseTemplate::new(500).set_body_string("whisper crashed"))
        .mount(&server)
        .await;

    let client = HttpTranscriber::new(format!("{}/transcribe", server.uri()), TIMEOUT).unwrap();
    match client.transcribe(upload()).await {
        Err(RemoteError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "whisper crashed");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_transcription_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/transcribe"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"text": "late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = HttpTranscriber::new(
        format!("{}/transcribe", server.uri()),
        Duration::from_millis(200),
    )
    .unwrap();

    assert!(matches!(client.transcribe(upload()).await, Err(RemoteError::Timeout)));
}

// ────────────────────────────────────────────────────────────────────────────
// Reasoning
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reasoning_sends_text_location_and_voice() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask-ai"))
        .and(body_partial_json(json!({
            "text": "Where is the museum?",
            "lat": -23.55,
            "lon": -46.63,
            "voice": "en-US-JennyNeural",
            "language": "en"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Two blocks north."})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpReasoner::new(format!("{}/ask-ai", server.uri()), TIMEOUT).unwrap();
    let reply = client.ask(&ask()).await.unwrap();

    assert_eq!(reply, "Two blocks north.");
}

#[tokio::test]
async fn test_reasoning_error_field_is_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask-ai"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "quota exceeded"})))
        .mount(&server)
        .await;

    let client = HttpReasoner::new(format!("{}/ask-ai", server.uri()), TIMEOUT).unwrap();
    match client.ask(&ask()).await {
        Err(RemoteError::Service(message)) => assert_eq!(message, "quota exceeded"),
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reasoning_empty_reply_is_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask-ai"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "  "})))
        .mount(&server)
        .await;

    let client = HttpReasoner::new(format!("{}/ask-ai", server.uri()), TIMEOUT).unwrap();
    assert!(matches!(
        client.ask(&ask()).await,
        Err(RemoteError::InvalidResponse(_))
    ));
}

// ────────────────────────────────────────────────────────────────────────────
// Synthesis
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_synthesis_returns_audio_with_media_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/speak"))
        .and(body_partial_json(json!({
            "text": "Two blocks north.",
            "voice": "en-US-JennyNeural",
            "language": "en"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/ogg")
                .set_body_bytes(b"OggS fake".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpSynthesizer::new(format!("{}/speak", server.uri()), TIMEOUT).unwrap();
    let audio = client
        .synthesize(&SpeakRequest {
            text: "Two blocks north.".to_string(),
            voice: "en-US-JennyNeural".to_string(),
            language: Language::En,
        })
        .await
        .unwrap();

    assert_eq!(audio.media_type, "audio/ogg");
    assert_eq!(&audio.bytes[..], b"OggS fake");
}

#[tokio::test]
async fn test_synthesis_empty_body_is_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/speak"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = HttpSynthesizer::new(format!("{}/speak", server.uri()), TIMEOUT).unwrap();
    let result = client
        .synthesize(&SpeakRequest {
            text: "hi".to_string(),
            voice: "pt-BR-YaraNeural".to_string(),
            language: Language::Pt,
        })
        .await;

    assert!(matches!(result, Err(RemoteError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_synthesis_rejection_keeps_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/speak"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Missing text, voice, or language"})))
        .mount(&server)
        .await;

    let client = HttpSynthesizer::new(format!("{}/speak", server.uri()), TIMEOUT).unwrap();
    let result = client
        .synthesize(&SpeakRequest {
            text: "hi".to_string(),
            voice: "pt-BR-YaraNeural".to_string(),
            language: Language::Pt,
        })
        .await;

    assert!(matches!(result, Err(RemoteError::Status { status: 400, .. })));
}

// ────────────────────────────────────────────────────────────────────────────
// Location
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_location_reads_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"latitude": 45.46, "longitude": 9.19})),
        )
        .mount(&server)
        .await;

    let provider = HttpLocation::new(format!("{}/location", server.uri()), TIMEOUT).unwrap();
    let position = provider.current_position().await.unwrap();

    assert_eq!(position.latitude, 45.46);
    assert_eq!(position.longitude, 9.19);
}
