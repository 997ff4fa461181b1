use std::fmt::Debug;

pub type NarrativeSink = Box<dyn FnMut(&str) + Send>;

/// Human-readable account of what an action did, in order.
///
/// Every line is traced and forwarded to the sink as it happens, then kept
/// until the action's report collects it.
#[derive(Default)]
pub struct Narrative {
    lines: Vec<String>,
    sink: Option<NarrativeSink>,
}

impl Debug for Narrative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrative")
            .field("lines", &self.lines)
            .field("sink", &self.sink.as_ref().map(|_| "[fn]"))
            .finish()
    }
}

impl Narrative {
    pub fn set_sink(&mut self, sink: NarrativeSink) {
        self.sink = Some(sink);
    }

    pub fn say(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{line}");
        if let Some(sink) = self.sink.as_mut() {
            sink(&line);
        }
        self.lines.push(line);
    }

    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}
