//! The pipeline plus its session layer: metrics sink, per-session
//! accumulators and periodic compact summaries.

use toktrim_common::config::types::PipelineConfig;

use crate::metrics::JsonlSink;
use crate::pipeline::{InvocationContext, Pipeline, Processed};
use crate::session::SessionStore;
use crate::summary::SessionSummary;

#[derive(Debug)]
pub struct Handled {
    pub processed: Processed,
    /// Compact session summary, present when one is due.
    pub notification: Option<String>,
}

#[derive(Debug)]
pub struct Engine {
    pipeline: Pipeline,
    sessions: SessionStore,
    sink: Option<JsonlSink>,
}

impl Engine {
    /// Engine with the metrics sink `config` asks for.
    pub fn new(config: PipelineConfig) -> Self {
        let sink = JsonlSink::from_config(&config.metrics);
        Self::with_sink(config, sink)
    }

    pub fn with_sink(config: PipelineConfig, sink: Option<JsonlSink>) -> Self {
        Self {
            pipeline: Pipeline::new(config),
            sessions: SessionStore::new(),
            sink,
        }
    }

    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Process one invocation: filter, record, and decide on a notification.
    /// Sink failures are logged and never affect the output.
    pub fn handle(&self, ctx: &InvocationContext, raw: &str) -> Handled {
        let processed = self.pipeline.process(ctx, raw);

        if let (Some(sink), Some(record)) = (&self.sink, &processed.record)
            && let Err(e) = sink.append(record)
        {
            tracing::warn!("metrics append failed: {e:#}");
        }

        let notifications = &self.pipeline.config().notifications;
        let cadence = if notifications.enabled {
            notifications.update_cadence
        } else {
            0
        };
        let notification = self
            .sessions
            .record_turn(&ctx.session_id, processed.record.clone(), cadence)
            .map(|records| {
                SessionSummary::from_records(Some(&ctx.session_id), &records).render_compact()
            });

        Handled {
            processed,
            notification,
        }
    }

    /// Summary of everything recorded for `session_id` so far.
    pub fn session_summary(&self, session_id: &str) -> SessionSummary {
        let records = self
            .sessions
            .get(session_id)
            .map(|s| s.records)
            .unwrap_or_default();
        SessionSummary::from_records(Some(session_id), &records)
    }
}
