use lifgpt_core::{ChatSession, ClientError, LifGptClient, Sender, RESPONSE_ERROR};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accept one connection, answer it with `status` and `body`, and hand back
/// the raw request that was received.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        request
    });

    (base_url, handle)
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8(buf).unwrap()
}

fn request_body(request: &str) -> serde_json::Value {
    let (_, body) = request.split_once("\r\n\r\n").unwrap();
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn test_posts_prompt_as_json() {
    let (base_url, server) = serve_once("200 OK", r#"{"response":"world"}"#).await;
    let client = LifGptClient::new(&base_url);

    let answer = client.query("hello").await.unwrap();
    assert_eq!(answer, "world");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /ai HTTP/1.1\r\n"), "got: {request}");
    assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
    assert_eq!(request_body(&request), serde_json::json!({ "prompt": "hello" }));
}

#[tokio::test]
async fn test_server_error_status() {
    let (base_url, server) = serve_once("500 Internal Server Error", "").await;
    let client = LifGptClient::new(&base_url);

    let err = client.query("hello").await.unwrap_err();
    assert!(matches!(err, ClientError::Status(500)), "got: {err:?}");
    server.await.unwrap();
}

#[tokio::test]
async fn test_body_without_response_field() {
    let (base_url, server) = serve_once("200 OK", r#"{"answer":"world"}"#).await;
    let client = LifGptClient::new(&base_url);

    let err = client.query("hello").await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedBody(_)), "got: {err:?}");
    server.await.unwrap();
}

#[tokio::test]
async fn test_body_that_is_not_json() {
    let (base_url, server) = serve_once("200 OK", "<html>oops</html>").await;
    let client = LifGptClient::new(&base_url);

    let err = client.query("hello").await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedBody(_)), "got: {err:?}");
    server.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_host() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let err = LifGptClient::new(&base_url).query("hello").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "got: {err:?}");
}

#[tokio::test]
async fn test_session_round_trip_over_http() {
    let (base_url, server) = serve_once("200 OK", r#"{"response":"* one\n* two"}"#).await;
    let client = LifGptClient::new(&base_url);
    let mut session = ChatSession::new();

    session.submit(&client, "*list* please").await;
    let request = server.await.unwrap();

    assert_eq!(request_body(&request), serde_json::json!({ "prompt": "*list* please" }));

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].text, "<strong>list</strong><br> please");
    assert_eq!(transcript[1].sender, Sender::Assistant);
    assert!(transcript[1].text.contains("one</li><br /><li"));
    assert_eq!(transcript[0].time, transcript[1].time);
}

#[tokio::test]
async fn test_session_records_error_over_http() {
    let (base_url, server) = serve_once("404 Not Found", "").await;
    let client = LifGptClient::new(&base_url);
    let mut session = ChatSession::new();

    session.submit(&client, "hello").await;
    server.await.unwrap();

    assert_eq!(session.transcript().len(), 1);
    assert_eq!(session.last_error(), Some(RESPONSE_ERROR));
    assert!(!session.is_pending());
}
