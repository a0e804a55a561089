use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse};
use futures_util::StreamExt;
use lojavoz_common::LojavozError;
use tracing::error;

use crate::state::AppState;
use crate::temp::TempAudio;
use crate::types::{ErrorResponse, UploadResponse};

/// Store value recorded when the client sends none
const DEFAULT_STORE: &str = "Não especificada";

#[post("/upload")]
pub async fn upload(
    mut payload: Multipart,
    state: web::Data<std::sync::Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    let mut store: Option<String> = None;
    let mut audio: Option<TempAudio> = None;

    while let Some(field) = payload.next().await {
        let mut field = field?;
        let name = field.content_disposition().get_name().map(str::to_string);

        match name.as_deref() {
            Some("audio") => {
                // The transient file carries its fixed extension from the
                // moment it exists; the client-supplied filename is ignored
                let mut temp = match TempAudio::create(&state.config.upload_dir) {
                    Ok(t) => t,
                    Err(e) => return Ok(processing_error(&e)),
                };

                while let Some(chunk) = field.next().await {
                    let data = chunk?;
                    if let Err(e) = temp.write_chunk(&data) {
                        return Ok(processing_error(&e));
                    }
                }

                audio = Some(temp);
            }
            Some("store") => {
                let mut value = Vec::new();
                while let Some(chunk) = field.next().await {
                    value.extend_from_slice(&chunk?);
                }
                store = Some(String::from_utf8_lossy(&value).into_owned());
            }
            _ => {
                // Drain unknown fields so the payload keeps advancing
                while let Some(chunk) = field.next().await {
                    let _ = chunk?;
                }
            }
        }
    }

    let Some(audio) = audio else {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "Nenhum arquivo enviado".to_string(),
        }));
    };

    let store = match store.as_deref() {
        None | Some("") => DEFAULT_STORE.to_string(),
        Some(s) => s.to_string(),
    };

    let result = state.pipeline.execute(audio.path(), &store).await;

    // The transient file is removed here, before the response leaves,
    // on success and failure alike
    drop(audio);

    match result {
        Ok(transcription) => Ok(HttpResponse::Ok().json(UploadResponse {
            message: "Áudio processado com sucesso!".to_string(),
            transcription,
        })),
        Err(e) => Ok(processing_error(&e)),
    }
}

fn processing_error(e: &LojavozError) -> HttpResponse {
    error!("Upload pipeline failed: {}", e);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: format!("Erro ao processar o áudio: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeLedger, FakeStt};
    use actix_web::http::header;
    use actix_web::{test, App};
    use lojavoz_common::AppConfig;
    use lojavoz_ledger::Ledger;
    use lojavoz_transcribe::SpeechToText;
    use std::path::Path;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    const BOUNDARY: &str = "lojavoz-test-boundary";

    fn test_state(
        upload_dir: &Path,
        stt: Arc<FakeStt>,
        ledger: Arc<FakeLedger>,
    ) -> web::Data<std::sync::Arc<AppState>> {
        let mut config = AppConfig::default();
        config.upload_dir = upload_dir.to_path_buf();

        web::Data::new(std::sync::Arc::new(AppState::new(
            config,
            stt as Arc<dyn SpeechToText>,
            ledger as Arc<dyn Ledger>,
        )))
    }

    /// Hand-built multipart body: (name, filename, bytes) per part
    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: audio/webm\r\n\r\n",
                        name, f
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn multipart_request(body: Vec<u8>) -> actix_web::test::TestRequest {
        test::TestRequest::post().uri("/upload").insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[actix_web::test]
    async fn test_missing_audio_returns_400_without_transient_file() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(FakeLedger::new());
        let state = test_state(dir.path(), Arc::new(FakeStt::returning("x")), Arc::clone(&ledger));

        let app = test::init_service(App::new().app_data(state).service(upload)).await;

        let body = multipart_body(&[("store", None, b"Loja1")]);
        let resp = test::call_service(&app, multipart_request(body).to_request()).await;

        assert_eq!(resp.status(), 400);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Nenhum arquivo enviado");

        assert!(dir_is_empty(dir.path()));
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_successful_upload_passes_transcript_through() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(FakeLedger::new());
        let state = test_state(
            dir.path(),
            Arc::new(FakeStt::returning("duas clientes pediram troca")),
            Arc::clone(&ledger),
        );

        let app = test::init_service(App::new().app_data(state).service(upload)).await;

        let body = multipart_body(&[
            ("audio", Some("recording.webm"), b"fake-audio-bytes"),
            ("store", None, b"Loja1"),
        ]);
        let resp = test::call_service(&app, multipart_request(body).to_request()).await;

        assert_eq!(resp.status(), 200);
        let body: UploadResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "Áudio processado com sucesso!");
        assert_eq!(body.transcription, "duas clientes pediram troca");

        assert_eq!(ledger.calls.load(Ordering::SeqCst), 1);
        let row = ledger.last_row.lock().unwrap().clone().unwrap();
        assert_eq!(row, ("Loja1".to_string(), "duas clientes pediram troca".to_string()));

        // Transient file gone after the call completes
        assert!(dir_is_empty(dir.path()));
    }

    #[actix_web::test]
    async fn test_empty_store_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(FakeLedger::new());
        let state = test_state(dir.path(), Arc::new(FakeStt::returning("memo")), Arc::clone(&ledger));

        let app = test::init_service(App::new().app_data(state).service(upload)).await;

        let body = multipart_body(&[
            ("audio", Some("recording.webm"), b"fake-audio-bytes"),
            ("store", None, b""),
        ]);
        let resp = test::call_service(&app, multipart_request(body).to_request()).await;
        assert_eq!(resp.status(), 200);

        let row = ledger.last_row.lock().unwrap().clone().unwrap();
        assert_eq!(row.0, "Não especificada");
    }

    #[actix_web::test]
    async fn test_transcription_failure_returns_500_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(FakeLedger::new());
        let state = test_state(
            dir.path(),
            Arc::new(FakeStt::failing("API error (500): provider down")),
            Arc::clone(&ledger),
        );

        let app = test::init_service(App::new().app_data(state).service(upload)).await;

        let body = multipart_body(&[
            ("audio", Some("recording.webm"), b"fake-audio-bytes"),
            ("store", None, b"Loja1"),
        ]);
        let resp = test::call_service(&app, multipart_request(body).to_request()).await;

        assert_eq!(resp.status(), 500);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.starts_with("Erro ao processar o áudio: "));
        assert!(body.error.contains("provider down"));

        // No ledger row for a failed transcription; no leaked file
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 0);
        assert!(dir_is_empty(dir.path()));
    }

    #[actix_web::test]
    async fn test_ledger_failure_returns_500_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(FakeLedger::failing("Spreadsheet API error (403): quota"));
        let state = test_state(dir.path(), Arc::new(FakeStt::returning("memo")), Arc::clone(&ledger));

        let app = test::init_service(App::new().app_data(state).service(upload)).await;

        let body = multipart_body(&[
            ("audio", Some("recording.webm"), b"fake-audio-bytes"),
            ("store", None, b"Loja1"),
        ]);
        let resp = test::call_service(&app, multipart_request(body).to_request()).await;

        assert_eq!(resp.status(), 500);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.contains("quota"));
        assert!(dir_is_empty(dir.path()));
    }
}
