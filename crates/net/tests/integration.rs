//! Integration tests for net crate

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use plugkit_events::{channel, AppEvent, DownloadEvent};
    use plugkit_net::{download_file, NetClient};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_download_file() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        let content = b"test file content";
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pkg.tar.gz");
            then.status(200)
                .header("content-length", content.len().to_string())
                .body(content);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("pkg.tar.gz");
        let client = NetClient::with_defaults().unwrap();
        let url = server.url("/pkg.tar.gz");

        let result = download_file(&client, &url, &dest, None, Some(&tx))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(result.size, content.len() as u64);
        assert_eq!(result.hash, blake3::hash(content).to_hex().to_string());

        let downloaded = tokio::fs::read(&dest).await.unwrap();
        assert_eq!(downloaded, content);

        // Partial file must be gone after the rename
        assert!(!temp.path().join("pkg.tar.part").exists());

        let mut saw_start = false;
        let mut saw_complete = false;

        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::Download(DownloadEvent::Started { .. }) => saw_start = true,
                AppEvent::Download(DownloadEvent::Completed { .. }) => saw_complete = true,
                _ => {}
            }
        }

        assert!(saw_start);
        assert!(saw_complete);
    }

    #[tokio::test]
    async fn test_download_verifies_checksum() {
        let server = MockServer::start();

        let content = b"artifact bytes";
        server.mock(|when, then| {
            when.method(GET).path("/pkg.tar.gz");
            then.status(200).body(content);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("pkg.tar.gz");
        let client = NetClient::with_defaults().unwrap();
        let url = server.url("/pkg.tar.gz");

        let good = blake3::hash(content).to_hex().to_string();
        download_file(&client, &url, &dest, Some(&good), None)
            .await
            .unwrap();
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn test_download_rejects_checksum_mismatch() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/pkg.tar.gz");
            then.status(200).body(b"corrupted body");
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("pkg.tar.gz");
        let client = NetClient::with_defaults().unwrap();
        let url = server.url("/pkg.tar.gz");

        let wrong = blake3::hash(b"original bytes").to_hex().to_string();
        let err = download_file(&client, &url, &dest, Some(&wrong), None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("checksum mismatch"));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_surfaces_http_error() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/missing.tar.gz");
            then.status(404);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("missing.tar.gz");
        let client = NetClient::with_defaults().unwrap();
        let url = server.url("/missing.tar.gz");

        let err = download_file(&client, &url, &dest, None, None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("404"));
        assert!(!dest.exists());
    }
}
