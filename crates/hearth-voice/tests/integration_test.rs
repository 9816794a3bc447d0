//! Integration tests for hearth-voice crate.

use hearth_config::SpeechConfig;
use hearth_voice::{FishSpeechClient, SpeechError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Answer one HTTP request with `status` and `body`, returning what was received.
async fn serve_once(status: &'static str, body: &'static [u8]) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/v1/tts", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            received.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&received).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0);
                if received.len() >= end + 4 + length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(body).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8_lossy(&received).to_string()
    });

    (url, handle)
}

fn client(api_url: String) -> FishSpeechClient {
    let config = SpeechConfig {
        api_key: "secret".to_string(),
        reference_id: "voice-1".to_string(),
        api_url,
        timeout_seconds: 5,
    };
    FishSpeechClient::from_config(&config).unwrap().unwrap()
}

#[tokio::test]
async fn test_synthesize_returns_audio() {
    let (url, server) = serve_once("200 OK", b"ID3fake-mp3").await;

    let audio = client(url).synthesize("good morning").await.unwrap();
    assert_eq!(audio, b"ID3fake-mp3");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1/tts"));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
    assert!(request.contains(r#""text":"good morning""#));
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let (url, server) = serve_once("402 Payment Required", b"no credit").await;

    let err = client(url).synthesize("hello").await.unwrap_err();
    match err {
        SpeechError::Status { status, body } => {
            assert_eq!(status, 402);
            assert_eq!(body, "no credit");
        }
        other => panic!("unexpected error: {other}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_empty_audio_is_an_error() {
    let (url, server) = serve_once("200 OK", b"").await;
    let err = client(url).synthesize("hello").await.unwrap_err();
    assert!(matches!(err, SpeechError::EmptyAudio));
    server.await.unwrap();
}
