//! Upload → analyze → simplify scenarios through the real HTTP client.

use medscan::{
    Config, ImageStaging, OpenAiClient, Phase, ScanError, Session, SimplifyChoice, UploadedImage,
};
use mockito::{Matcher, Server};
use serde_json::json;
use tempfile::TempDir;

const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0x0d];
const JPG_BYTES: [u8; 6] = [0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];

fn completion(text: &str) -> String {
    json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] }).to_string()
}

fn session_for(server: &Server) -> (Session<OpenAiClient>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        api_key: Some("test-key".into()),
        api_url: server.url(),
        ..Config::default()
    };
    let client = OpenAiClient::new(&config).unwrap();
    let staging = ImageStaging::new(dir.path().to_str().unwrap());
    (Session::new(client, staging), dir)
}

#[tokio::test]
async fn analyze_without_upload_never_calls_service() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;
    let (mut session, _dir) = session_for(&server);

    let err = session.analyze().await.unwrap_err();
    assert!(matches!(err, ScanError::MissingInput));
    assert_eq!(err.user_message(), "No valid image uploaded or file path is incorrect.");
    assert_eq!(session.phase(), Phase::Idle);
    mock.assert_async().await;
}

#[tokio::test]
async fn png_analysis_is_displayed_verbatim_and_file_removed() {
    let reply = "Findings: none. Consult with a Doctor before making any decisions.";
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion(reply))
        .create_async()
        .await;
    let (mut session, _dir) = session_for(&server);

    let image = UploadedImage::new("photo.png", PNG_BYTES.to_vec()).unwrap();
    let staged = session.upload(image).await.unwrap().path().to_path_buf();
    assert!(staged.exists());
    assert_eq!(staged.extension().unwrap(), "png");

    assert_eq!(session.analyze().await.unwrap(), reply);
    assert_eq!(session.analysis(), Some(reply));
    assert!(!staged.exists());
}

#[tokio::test]
async fn failed_analysis_keeps_jpg_and_retry_succeeds() {
    let mut server = Server::new_async().await;
    let outage = server
        .mock("POST", "/chat/completions")
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;
    let (mut session, _dir) = session_for(&server);

    let image = UploadedImage::new("scan.jpg", JPG_BYTES.to_vec()).unwrap();
    let staged = session.upload(image).await.unwrap().path().to_path_buf();

    let err = session.analyze().await.unwrap_err();
    assert_eq!(err.user_message(), "Unable to analyze the image at this moment.");
    assert!(staged.exists());
    assert_eq!(session.phase(), Phase::ImageStaged);

    outage.remove_async().await;
    let recovered = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("data:image/jpeg;base64,".into()))
        .with_status(200)
        .with_body(completion("Findings: mild fracture."))
        .create_async()
        .await;

    assert_eq!(session.analyze().await.unwrap(), "Findings: mild fracture.");
    assert!(!staged.exists());
    recovered.assert_async().await;
}

#[tokio::test]
async fn simplified_explanation_does_not_replace_analysis() {
    let mut server = Server::new_async().await;
    let _analysis = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({ "model": "gpt-4-vision-preview" })))
        .with_body(completion("R"))
        .create_async()
        .await;
    let simplify = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({ "model": "gpt-3.5-turbo" })))
        .with_body(completion("It's like a boo-boo."))
        .expect(1)
        .create_async()
        .await;
    let (mut session, _dir) = session_for(&server);

    session
        .upload(UploadedImage::new("photo.png", PNG_BYTES.to_vec()).unwrap())
        .await
        .unwrap();
    session.analyze().await.unwrap();

    let declined = session.ready().unwrap().choose(SimplifyChoice::No).await.unwrap();
    assert!(declined.is_none());
    assert_eq!(session.phase(), Phase::AnalysisReady);

    let simplified = session.ready().unwrap().choose(SimplifyChoice::Yes).await.unwrap();
    assert_eq!(simplified.as_deref(), Some("It's like a boo-boo."));
    assert_eq!(session.analysis(), Some("R"));
    assert_eq!(session.phase(), Phase::SimplifiedReady);
    simplify.assert_async().await;
}

#[tokio::test]
async fn close_removes_unconsumed_upload() {
    let server = Server::new_async().await;
    let (mut session, dir) = session_for(&server);

    session
        .upload(UploadedImage::new("scan.jpeg", JPG_BYTES.to_vec()).unwrap())
        .await
        .unwrap();
    session.close().await;

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
