// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::FlowKind};

/// A span builder used by broker flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("hmrc_token_broker.flow", flow = kind.as_str(), stage) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}
