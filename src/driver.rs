//! Driver — feeds lines through a [`Parser`] and writes JSON records.
//!
//! Reads any async buffered source line by line, writes one JSON [`Record`]
//! per emitted line, and keeps a running [`Summary`]. Opening files and
//! tailing are the caller's business.

use anyhow::Context;
use lognorm_core::{Line, ParseOutcome, Parser, Record};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Lines written as records.
    pub emitted: u64,
    /// Lines dropped by an exclusion rule.
    pub skipped: u64,
    /// Lines the parser rejected.
    pub failed: u64,
    /// Emitted lines whose timestamp could not be decoded.
    pub bad_timestamps: u64,
}

impl std::ops::AddAssign for Summary {
    fn add_assign(&mut self, rhs: Self) {
        self.emitted += rhs.emitted;
        self.skipped += rhs.skipped;
        self.failed += rhs.failed;
        self.bad_timestamps += rhs.bad_timestamps;
    }
}

/// Normalise every line of `reader` into `writer`.
///
/// `source` names the input in diagnostics. Parse failures are logged and
/// counted; only I/O errors abort the run.
pub async fn normalize<R, W>(
    parser: &Parser,
    source: &str,
    reader: R,
    writer: &mut W,
) -> anyhow::Result<Summary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = Summary::default();
    let mut lines = reader.lines();
    let mut lineno = 0u64;

    while let Some(raw) = lines
        .next_line()
        .await
        .with_context(|| format!("reading {source}"))?
    {
        lineno += 1;
        let line = match parser.parse(&raw) {
            Ok(ParseOutcome::Line(line)) => line,
            Ok(ParseOutcome::Skipped) => {
                summary.skipped += 1;
                continue;
            }
            Err(err) => {
                tracing::warn!(source, line = lineno, error = %err, "skipping unparseable line");
                summary.failed += 1;
                continue;
            }
        };

        if let Err(err) = line.datetime() {
            tracing::warn!(source, line = lineno, error = %err, "using fallback timestamp");
            summary.bad_timestamps += 1;
        }

        let mut json = serde_json::to_vec(&Record::from_line(&line))?;
        json.push(b'\n');
        writer.write_all(&json).await.context("writing record")?;
        summary.emitted += 1;
    }

    writer.flush().await.context("flushing output")?;
    tracing::debug!(source, ?summary, "input finished");
    Ok(summary)
}
