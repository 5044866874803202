mod gc_trace;

pub use gc_trace::{GcTrace, CSV_HEADER};
