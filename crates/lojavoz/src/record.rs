use anyhow::{Context, Result};
use lojavoz_recorder::{CpalCapture, Recorder, RecordingError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

use crate::stores::{self, Store};
use crate::upload::Uploader;

/// Record one voice memo and submit it to the pipeline endpoint
pub async fn run(store_id: Option<String>, endpoint: String) -> Result<()> {
    let store = match store_id {
        Some(id) => stores::find(&id).with_context(|| format!("Loja desconhecida: {}", id))?,
        None => choose_store().await?,
    };

    println!("Loja atual: {} ({})", store.name, store.location);

    let mut recorder = Recorder::new(CpalCapture::default());

    if let Err(e) = recorder.start().await {
        if matches!(
            e,
            RecordingError::PermissionDenied | RecordingError::DeviceUnavailable
        ) {
            eprintln!("Erro ao acessar o microfone. Verifique as permissões.");
        }
        return Err(e.into());
    }

    // Live level readout while the memo records
    let mut level = recorder.level_watch();
    let meter = tokio::spawn(async move {
        while level.changed().await.is_ok() {
            let value = *level.borrow_and_update();
            let bar = "#".repeat(((value / 5.0) as usize).min(20));
            eprint!("\rNível: {:<20}", bar);
        }
    });

    println!("Gravando... pressione Enter para parar.");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;

    recorder.stop().await?;
    meter.abort();
    eprintln!();

    let blob = recorder
        .take_blob()
        .context("Nenhuma gravação finalizada")?;
    println!("Áudio pronto para envio ({} bytes).", blob.bytes.len());

    let mut uploader = Uploader::new(endpoint)?;
    uploader.set_recording(blob);

    match uploader.submit(store.id).await {
        Ok(Some(reply)) => {
            tracing::debug!("Server reply: {}", reply.message);
            println!("Áudio enviado com sucesso!");
            println!("Transcrição: {}", reply.transcription);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            error!("Upload failed: {}", e);
            eprintln!("Erro ao enviar o áudio. Tente novamente.");
            Err(e)
        }
    }
}

/// Interactive store selection from the registry
async fn choose_store() -> Result<&'static Store> {
    println!("Selecione sua loja:");
    for (i, store) in stores::list().iter().enumerate() {
        println!("  {}. {} - {}", i + 1, store.name, store.location);
    }

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    let choice = line.trim();

    // Accept either the list number or the store id
    if let Ok(index) = choice.parse::<usize>() {
        if index >= 1 {
            if let Some(store) = stores::list().get(index - 1) {
                return Ok(store);
            }
        }
    }

    stores::find(choice).with_context(|| format!("Loja desconhecida: {}", choice))
}
