use super::{
    io::{CsvSink, Durable, SinkError},
    parser::{GcTraceParser, ParsedLine},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// No gc trace line seen yet, so nothing (not even the header) has been written.
    AwaitingFirstMatch,
    Streaming,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Summary {
    pub matched: u64,
    pub skipped: u64,
}

/// Drives lines through the parser into the sink, one at a time.
pub struct State<'p, W: Durable> {
    parser: &'p GcTraceParser,
    sink: CsvSink<W>,
    phase: Phase,
    summary: Summary,
}

impl<'p, W: Durable> State<'p, W> {
    pub fn new(parser: &'p GcTraceParser, sink: CsvSink<W>) -> Self {
        Self {
            parser,
            sink,
            phase: Phase::AwaitingFirstMatch,
            summary: Summary::default(),
        }
    }

    pub fn process(&mut self, line: &str) -> Result<(), ProcessError> {
        let trace = match self.parser.parse(line) {
            ParsedLine::Matched(trace) => trace,
            ParsedLine::NotMatched(line) => {
                tracing::warn!(line, "Not a gc trace line, skipping");
                self.summary.skipped += 1;
                return Ok(());
            }
        };

        if self.phase == Phase::AwaitingFirstMatch {
            self.sink.write_header()?;
            self.phase = Phase::Streaming;
        }

        self.sink.write_trace(&trace)?;
        self.summary.matched += 1;
        tracing::debug!(gc = trace.gc_num, "wrote gc trace row");

        Ok(())
    }

    /// Closes the sink. Consuming `self` is the terminal state: no more lines can be processed.
    pub fn finish(self) -> Result<Summary, ProcessError> {
        self.sink.finish()?;

        tracing::info!(
            matched = self.summary.matched,
            skipped = self.summary.skipped,
            "input exhausted"
        );

        Ok(self.summary)
    }
}

/// Feeds every line from `lines` through a fresh `State` and closes the sink at end of input.
/// Stops at the first read or sink error.
pub fn run<W, I>(
    lines: I,
    parser: &GcTraceParser,
    sink: CsvSink<W>,
) -> Result<Summary, ProcessError>
where
    W: Durable,
    I: IntoIterator<Item = Result<String, std::io::Error>>,
{
    let mut state = State::new(parser, sink);

    for line in lines {
        state.process(&line.map_err(ProcessError::Read)?)?;
    }

    state.finish()
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to compile gc trace pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Failed to read input: {0}")]
    Read(#[source] std::io::Error),
    #[error(transparent)]
    Sink(#[from] SinkError),
}
