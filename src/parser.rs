//! Recognition of Go runtime `GODEBUG=gctrace=1` lines.
//!
//! Only the current line layout is supported:
//!
//! ```text
//! gc 3 @3.182s 0%: 0.015+0.59+0.096 ms clock, 0.19+0.10/1.3/3.0+1.1 ms cpu, 4->4->2 MB, 5 MB goal, 3 MB stacks, 1 MB globals, 12 P
//! ```
//!
//! The three `clock` values are wall time for the STW write-barrier setup, concurrent marking
//! and STW mark termination. The five `cpu` values are CPU time for the STW write barrier, mark
//! assist, background marking, idle marking and STW mark termination.
use super::types::GcTrace;
use regex::{Captures, Regex, RegexBuilder};
use std::str::FromStr;

const GC_TRACE_PATTERN: &str = concat!(
    r"gc\s+(?P<gc_num>\d+)\s+@(?P<timestamp>[\d.]+)s\s+(?P<cpu_percent>[\d.]+)%:\s+",
    r"(?P<wall_stw_write_barrier>[\d.]+)\+(?P<wall_concurrent>[\d.]+)\+(?P<wall_stw_mark_term>[\d.]+)",
    r"\s+ms\s+clock,\s+",
    r"(?P<cpu_stw_write_barrier>[\d.]+)\+(?P<cpu_mark_assist>[\d.]+)/(?P<cpu_mark_background>[\d.]+)",
    r"/(?P<cpu_mark_idle>[\d.]+)\+(?P<cpu_stw_mark_term>[\d.]+)\s+ms\s+cpu,\s+",
    r"(?P<heap_in_use_before>\d+)->(?P<heap_in_use_after>\d+)->(?P<heap_marked_live>\d+)\s+MB,\s+",
    r"(?P<heap_goal>\d+)\s+MB\s+goal,\s+",
    r"(?P<stacks_mb>\d+)\s+MB\s+stacks,\s+",
    r"(?P<globals_mb>\d+)\s+MB\s+globals,\s+",
    r"(?P<num_procs>\d+)\s+P",
);

/// Outcome of parsing a single input line.
#[derive(Debug, PartialEq)]
pub enum ParsedLine<'a> {
    Matched(GcTrace),
    /// The line is not a gc trace line. Carries the original text for reporting.
    NotMatched(&'a str),
}

/// Holds the compiled gc trace pattern. Build it once and share it; `parse` never mutates it.
#[derive(Debug, Clone)]
pub struct GcTraceParser {
    pattern: Regex,
}

impl GcTraceParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // The runtime only prints ASCII digits and spaces; `\d` and `\s` must not admit more
            pattern: RegexBuilder::new(GC_TRACE_PATTERN)
                .unicode(false)
                .build()?,
        })
    }

    pub fn parse<'a>(&self, line: &'a str) -> ParsedLine<'a> {
        let caps = match self.pattern.captures(line) {
            Some(caps) => caps,
            None => return ParsedLine::NotMatched(line),
        };

        ParsedLine::Matched(GcTrace {
            gc_num: field(&caps, "gc_num"),
            timestamp: field(&caps, "timestamp"),
            cpu_percent: field(&caps, "cpu_percent"),
            wall_stw_write_barrier: field(&caps, "wall_stw_write_barrier"),
            wall_concurrent: field(&caps, "wall_concurrent"),
            wall_stw_mark_term: field(&caps, "wall_stw_mark_term"),
            cpu_stw_write_barrier: field(&caps, "cpu_stw_write_barrier"),
            cpu_mark_assist: field(&caps, "cpu_mark_assist"),
            cpu_mark_background: field(&caps, "cpu_mark_background"),
            cpu_mark_idle: field(&caps, "cpu_mark_idle"),
            cpu_stw_mark_term: field(&caps, "cpu_stw_mark_term"),
            heap_in_use_before: field(&caps, "heap_in_use_before"),
            heap_in_use_after: field(&caps, "heap_in_use_after"),
            heap_marked_live: field(&caps, "heap_marked_live"),
            heap_goal: field(&caps, "heap_goal"),
            stacks_mb: field(&caps, "stacks_mb"),
            globals_mb: field(&caps, "globals_mb"),
            num_procs: field(&caps, "num_procs"),
        })
    }
}

/// Converts a captured group to a number. A structurally matched line is never rejected here:
/// a value that fails to convert (e.g. `1.2.3`, or an integer too large for its field) becomes
/// zero and is reported.
fn field<T: FromStr + Default>(caps: &Captures<'_>, name: &'static str) -> T {
    let raw = caps.name(name).map_or("", |m| m.as_str());

    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(field = name, raw, "gc trace field is not a valid number, using 0");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GcTraceParser, ParsedLine};
    use crate::types::GcTrace;

    const SAMPLE: &str = "gc 3 @3.182s 0%: 0.015+0.59+0.096 ms clock, \
        0.19+0.10/1.3/3.0+1.1 ms cpu, 4->4->2 MB, 5 MB goal, 3 MB stacks, 1 MB globals, 12 P";

    fn parse(line: &str) -> ParsedLine<'_> {
        GcTraceParser::new().unwrap().parse(line)
    }

    fn matched(line: &str) -> GcTrace {
        match parse(line) {
            ParsedLine::Matched(trace) => trace,
            ParsedLine::NotMatched(line) => panic!("expected a match for {:?}", line),
        }
    }

    #[test]
    fn test_sample_line() {
        assert_eq!(
            matched(SAMPLE),
            GcTrace {
                gc_num: 3,
                timestamp: 3.182,
                cpu_percent: 0.0,
                wall_stw_write_barrier: 0.015,
                wall_concurrent: 0.59,
                wall_stw_mark_term: 0.096,
                cpu_stw_write_barrier: 0.19,
                cpu_mark_assist: 0.10,
                cpu_mark_background: 1.3,
                cpu_mark_idle: 3.0,
                cpu_stw_mark_term: 1.1,
                heap_in_use_before: 4,
                heap_in_use_after: 4,
                heap_marked_live: 2,
                heap_goal: 5,
                stacks_mb: 3,
                globals_mb: 1,
                num_procs: 12,
            }
        );
    }

    #[test]
    fn test_large_values() {
        let trace = matched(
            "gc 2553 @8452.125s 14%: 0.004+330.5+0.051 ms clock, 0.056+0.12/0.56/0.94+0.61 ms cpu, \
             4096->4100->2048 MB, 8192 MB goal, 64 MB stacks, 12 MB globals, 128 P",
        );

        assert_eq!(trace.gc_num, 2553);
        assert_eq!(trace.timestamp, 8452.125);
        assert_eq!(trace.cpu_percent, 14.0);
        assert_eq!(trace.wall_concurrent, 330.5);
        assert_eq!(
            (trace.heap_in_use_before, trace.heap_in_use_after, trace.heap_marked_live),
            (4096, 4100, 2048)
        );
        assert_eq!(trace.heap_goal, 8192);
        assert_eq!(trace.stacks_mb, 64);
        assert_eq!(trace.globals_mb, 12);
        assert_eq!(trace.num_procs, 128);
    }

    #[test]
    fn test_prefixed_and_suffixed_lines() {
        // Log prefixes and the runtime's "(forced)" suffix don't prevent a match
        let prefixed = format!("2026/10/19 12:00:00 {}", SAMPLE);
        let forced = format!("{} (forced)", SAMPLE);

        assert_eq!(matched(&prefixed), matched(SAMPLE));
        assert_eq!(matched(&forced), matched(SAMPLE));
    }

    #[test]
    fn test_not_matched() {
        let truncated = &SAMPLE[..SAMPLE.len() - 5];
        let lines = [
            "",
            "not a gc line at all",
            truncated,
            // Whitespace splitting a token
            "gc 3 @3.182 s 0%: 0.015+0.59+0.096 ms clock, 0.19+0.10/1.3/3.0+1.1 ms cpu, \
             4->4->2 MB, 5 MB goal, 3 MB stacks, 1 MB globals, 12 P",
            "gc 3 @3.182s 0%: 0.015 +0.59+0.096 ms clock, 0.19+0.10/1.3/3.0+1.1 ms cpu, \
             4->4->2 MB, 5 MB goal, 3 MB stacks, 1 MB globals, 12 P",
            // Wrong field count
            "gc 3 @3.182s 0%: 0.015+0.59 ms clock, 0.19+0.10/1.3/3.0+1.1 ms cpu, \
             4->4->2 MB, 5 MB goal, 3 MB stacks, 1 MB globals, 12 P",
            // Older runtimes don't report stacks and globals
            "gc 2553 @8.452s 14%: 0.004+0.33+0.051 ms clock, 0.056+0.12/0.56/0.94+0.61 ms cpu, \
             4->4->2 MB, 5 MB goal, 12 P",
            "scvg: 0 MB released",
            // Non-ASCII digits and whitespace
            "gc \u{0663} @3.182s 0%: 0.015+0.59+0.096 ms clock, 0.19+0.10/1.3/3.0+1.1 ms cpu, \
             4->4->2 MB, 5 MB goal, 3 MB stacks, 1 MB globals, \u{0661}\u{0662} P",
            "gc\u{00a0}3 @3.182s 0%: 0.015+0.59+0.096 ms clock, 0.19+0.10/1.3/3.0+1.1 ms cpu, \
             4->4->2 MB, 5 MB goal, 3 MB stacks, 1 MB globals, 12 P",
            "gc 3 @3.182s 0%: 0.015+0.59+0.096 ms clock, 0.19+0.10/1.3/3.0+1.1 ms cpu, \
             4->4->2\u{2003}MB, 5 MB goal, 3 MB stacks, 1 MB globals, 12 P",
        ];

        for line in lines {
            assert_eq!(parse(line), ParsedLine::NotMatched(line));
        }
    }

    #[test]
    fn test_unconvertible_fields_default_to_zero() {
        let trace = matched(
            "gc 3 @1.2.3s 0%: 0.015+0.59+0.096 ms clock, 0.19+0.10/1.3/3.0+1.1 ms cpu, \
             4->4->2 MB, 5 MB goal, 3 MB stacks, 1 MB globals, 99999999999 P",
        );

        assert_eq!(trace.timestamp, 0.0);
        assert_eq!(trace.num_procs, 0);

        // Everything else is still populated
        assert_eq!(trace.gc_num, 3);
        assert_eq!(trace.wall_concurrent, 0.59);
        assert_eq!(trace.heap_goal, 5);
    }

    #[test]
    fn test_parser_is_reusable_and_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GcTraceParser>();

        let parser = GcTraceParser::new().unwrap();
        let first = parser.parse(SAMPLE);
        let _ = parser.parse("noise");
        assert_eq!(parser.parse(SAMPLE), first);
    }
}
