//! Downloads a remote word list and streams it through the hub's import path.

use std::time::Duration;

use futures_util::TryStreamExt;
use lexi_config::sync::SyncConfig;
use lexi_core::SourceKind;
use lexi_hub::{DictionaryHub, HubError, ImportReport};
use tokio_util::io::StreamReader;

mod progress;

pub use progress::{INDETERMINATE_CEILING, ProgressBlender, status_message};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Sync failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Sync failed: {0}")]
    Import(#[from] HubError),

    #[error("Sync failed: invalid URL '{0}'")]
    InvalidUrl(String),
}

/// Drives network downloads into new IMPORTED sources
#[derive(Clone)]
pub struct SyncOrchestrator {
    hub: DictionaryHub,
    client: reqwest::Client,
}

impl SyncOrchestrator {
    pub fn new(hub: DictionaryHub, config: &SyncConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { hub, client })
    }

    /// Download `url` into a new source called `name`.
    ///
    /// `on_progress` receives `(status, percent)` repeatedly; percent never
    /// decreases and is 100 only once the last batch is committed. No retry.
    pub async fn download<F>(
        &self,
        url: &str,
        name: &str,
        language: &str,
        mut on_progress: F,
    ) -> Result<ImportReport, SyncError>
    where
        F: FnMut(&str, f32) + Send,
    {
        let url = reqwest::Url::parse(url).map_err(|_| SyncError::InvalidUrl(url.to_string()))?;

        on_progress("Connecting", 0.0);
        tracing::info!("Downloading dictionary '{}' from {}", name, url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let total = response.content_length();

        let source = self
            .hub
            .create_source(name, language, SourceKind::Imported)
            .await?;

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let reader = StreamReader::new(Box::pin(stream));

        let mut blender = ProgressBlender::new();
        let report = self
            .hub
            .import_reader(&source.id, reader, total, |progress| {
                let percent = blender.update(&progress);
                on_progress(&status_message(&progress), percent);
            })
            .await
            .inspect_err(|e| tracing::error!("Download into '{}' failed: {}", source.name, e))?;

        let done = format!("Imported {} words into '{}'", report.source.count, report.source.name);
        on_progress(&done, 100.0);
        tracing::info!("{}", done);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use lexi_config::hub::HubConfig;
    use lexi_core::BloomFilter;
    use lexi_store::Store;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    fn orchestrator() -> SyncOrchestrator {
        let config = HubConfig {
            bloom_bits: 4096,
            batch_size: 2,
            chunk_size: 8,
            ..HubConfig::default()
        };
        let hub = DictionaryHub::new(
            Store::open_in_memory().unwrap(),
            BloomFilter::new(config.bloom_bits).shared(),
            config,
        );
        SyncOrchestrator::new(hub, &SyncConfig::default()).unwrap()
    }

    /// Serves `body` once over plain HTTP/1.1 and returns the URL
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/words.csv")
    }

    #[tokio::test]
    async fn downloads_into_new_source_with_monotone_progress() {
        let sync = orchestrator();
        let url = serve_once("200 OK", "cat,猫\ndog,狗\nbird,鸟\n").await;

        let mut reports = Vec::new();
        let report = sync
            .download(&url, "Remote", "en", |status, percent| {
                reports.push((status.to_string(), percent))
            })
            .await
            .unwrap();

        assert_eq!(report.source.count, 3);
        assert_eq!(report.source.kind, SourceKind::Imported);
        assert!(reports.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(reports.last().unwrap().1, 100.0);
        assert!(reports[..reports.len() - 1].iter().all(|(_, p)| *p < 100.0));
    }

    #[tokio::test]
    async fn http_errors_are_reported_as_sync_failures() {
        let sync = orchestrator();
        let url = serve_once("404 Not Found", "").await;

        let err = sync.download(&url, "Missing", "en", |_, _| {}).await.unwrap_err();
        assert!(matches!(err, SyncError::Network(_)));
        assert!(err.to_string().starts_with("Sync failed: "));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        let sync = orchestrator();
        let err = sync.download("not a url", "X", "en", |_, _| {}).await.unwrap_err();
        assert_eq!(err.to_string(), "Sync failed: invalid URL 'not a url'");
    }
}
