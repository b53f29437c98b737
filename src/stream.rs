//! Streaming conversion API: progress as a stream of events.
//!
//! [`convert_stream`] yields [`ConversionEvent::Progress`] items while the
//! conversion runs and ends with exactly one [`ConversionEvent::Finished`]
//! carrying the result. Progress values are strictly increasing; an
//! unsupported pair produces the `Finished` event alone.

use crate::config::ConversionConfig;
use crate::convert::convert_with_progress;
use crate::error::ConvertError;
use crate::format::Format;
use crate::ingest::SourceFile;
use crate::output::ConvertedFile;
use crate::progress::{ConversionProgressCallback, ProgressCallback, ProgressReporter};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::debug;

/// One item of a conversion event stream.
#[derive(Debug)]
pub enum ConversionEvent {
    Progress(u8),
    Finished(Result<ConvertedFile, ConvertError>),
}

/// A boxed stream of conversion events.
pub type ConversionEventStream = Pin<Box<dyn Stream<Item = ConversionEvent> + Send>>;

/// Forwards progress into the channel, then to the configured callback.
struct ChannelCallback {
    tx: mpsc::UnboundedSender<ConversionEvent>,
    inner: Option<ProgressCallback>,
}

impl ConversionProgressCallback for ChannelCallback {
    fn on_conversion_start(&self, operation: &str) {
        if let Some(ref cb) = self.inner {
            cb.on_conversion_start(operation);
        }
    }

    fn on_progress(&self, percent: u8) {
        // The receiver may have been dropped; the conversion still completes.
        let _ = self.tx.send(ConversionEvent::Progress(percent));
        if let Some(ref cb) = self.inner {
            cb.on_progress(percent);
        }
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        if let Some(ref cb) = self.inner {
            cb.on_page_complete(page_num, total_pages);
        }
    }

    fn on_item_skipped(&self, error: &crate::error::BlockError) {
        if let Some(ref cb) = self.inner {
            cb.on_item_skipped(error);
        }
    }

    fn on_conversion_complete(&self, success: bool) {
        if let Some(ref cb) = self.inner {
            cb.on_conversion_complete(success);
        }
    }
}

/// Convert `source`, streaming progress events as they happen.
///
/// The conversion runs on a spawned task, so the returned stream can be
/// polled at any pace. Dropping the stream does not cancel the work.
///
/// # Example
/// ```rust,no_run
/// use filedesk::{convert_stream, ConversionConfig, ConversionEvent, Format, SourceFile};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = SourceFile::new("report.pdf", std::fs::read("report.pdf")?);
/// let mut events = convert_stream(source, Format::Pdf, Format::Word, &ConversionConfig::default()).await;
/// while let Some(event) = events.next().await {
///     match event {
///         ConversionEvent::Progress(p) => eprintln!("{p}%"),
///         ConversionEvent::Finished(result) => {
///             let out = result?;
///             std::fs::write(&out.file_name, &out.bytes)?;
///         }
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn convert_stream(
    source: SourceFile,
    from: Format,
    to: Format,
    config: &ConversionConfig,
) -> ConversionEventStream {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: ProgressCallback = Arc::new(ChannelCallback {
        tx: tx.clone(),
        inner: config.progress_callback.clone(),
    });
    let progress = ProgressReporter::new(Some(callback));
    let config = config.clone();

    tokio::spawn(async move {
        let result = convert_with_progress(&source, from, to, &config, &progress).await;
        debug!("Stream conversion of '{}' finished (ok: {})", source.name, result.is_ok());
        let _ = tx.send(ConversionEvent::Finished(result));
    });

    Box::pin(UnboundedReceiverStream::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn progress_then_single_finished() {
        let source = SourceFile::new("rows.txt", b"a,b\n1,2\n".to_vec());
        let events: Vec<_> = convert_stream(source, Format::Text, Format::Excel, &ConversionConfig::default())
            .await
            .collect()
            .await;

        let (last, rest) = events.split_last().unwrap();
        assert!(matches!(last, ConversionEvent::Finished(Ok(_))));
        let percents: Vec<u8> = rest
            .iter()
            .map(|e| match e {
                ConversionEvent::Progress(p) => *p,
                ConversionEvent::Finished(_) => panic!("more than one Finished"),
            })
            .collect();
        assert_eq!(percents, vec![5, 90, 100]);
    }

    #[tokio::test]
    async fn unsupported_pair_only_finishes() {
        let source = SourceFile::new("x.png", Vec::new());
        let events: Vec<_> = convert_stream(source, Format::Png, Format::Word, &ConversionConfig::default())
            .await
            .collect()
            .await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            ConversionEvent::Finished(Err(ConvertError::UnsupportedConversion { .. }))
        ));
    }
}
