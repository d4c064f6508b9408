//! Rendered-snapshot fetching.

use std::path::Path;

use tracing::debug;

use crate::browser::{BrowserSession, PdfOptions};
use crate::config::Timeouts;
use crate::error::{AcquireError, AcquireResult};

/// Load `preview_url` in the session and print it to `destination`.
///
/// Navigation and render failures surface as [`AcquireError::Render`];
/// filesystem failures keep their own kind.
pub async fn render_snapshot<B>(
    session: &mut B,
    preview_url: &str,
    destination: &Path,
    timeouts: &Timeouts,
    options: &PdfOptions,
) -> AcquireResult<()>
where
    B: BrowserSession + ?Sized,
{
    debug!(url = %preview_url, path = %destination.display(), "Rendering snapshot");

    session
        .navigate(preview_url, timeouts.preview_navigation())
        .await
        .map_err(|e| as_render_error(preview_url, e))?;

    // Content keeps rendering client-side after the network goes idle.
    tokio::time::sleep(timeouts.render_settle()).await;

    session
        .render_pdf(destination, options)
        .await
        .map_err(|e| as_render_error(preview_url, e))
}

fn as_render_error(url: &str, err: AcquireError) -> AcquireError {
    match err {
        e @ (AcquireError::Filesystem { .. } | AcquireError::Render { .. }) => e,
        other => AcquireError::Render {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::testing::test_config;
    use crate::browser::fake::{FakeSession, FakeSite};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_render_writes_document() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("Orcs - 2024-06-01.pdf");
        let config = test_config();
        let mut session = FakeSession::new(FakeSite::default());

        render_snapshot(
            &mut session,
            "https://site.test/preview?armyId=42",
            &dest,
            &config.timeouts,
            &PdfOptions::default(),
        )
        .await
        .unwrap();

        assert!(dest.exists());
        assert_eq!(session.renders.len(), 1);
        assert_eq!(session.renders[0].0, "https://site.test/preview?armyId=42");
    }

    #[tokio::test]
    async fn test_navigation_failure_becomes_render_error() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("x.pdf");
        let config = test_config();
        let mut site = FakeSite::default();
        site.failing_urls.insert("https://site.test/preview?armyId=1".into());
        let mut session = FakeSession::new(site);

        let err = render_snapshot(
            &mut session,
            "https://site.test/preview?armyId=1",
            &dest,
            &config.timeouts,
            &PdfOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AcquireError::Render { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_print_failure_keeps_render_error() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("y.pdf");
        let config = test_config();
        let mut site = FakeSite::default();
        site.failing_renders.insert("https://site.test/preview?armyId=2".into());
        let mut session = FakeSession::new(site);

        let err = render_snapshot(
            &mut session,
            "https://site.test/preview?armyId=2",
            &dest,
            &config.timeouts,
            &PdfOptions::default(),
        )
        .await
        .unwrap_err();

        match err {
            AcquireError::Render { reason, .. } => assert_eq!(reason, "print failed"),
            other => panic!("expected Render error, got {other:?}"),
        }
        assert!(session.renders.is_empty());
    }
}
