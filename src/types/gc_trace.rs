use serde::{Serialize, Serializer};

/// CSV column names, in the order `GcTrace` fields are serialized.
pub const CSV_HEADER: [&str; 18] = [
    "GCNum",
    "Timestamp",
    "CPUPercent",
    "WallSTWWriteBarrier",
    "WallConcurrent",
    "WallSTWMarkTerm",
    "CPUSTWWriteBarrier",
    "CPUMarkAssist",
    "CPUMarkBackground",
    "CPUMarkIdle",
    "CPUSTWMarkTerm",
    "HeapInUseBefore",
    "HeapInUseAfter",
    "HeapMarkedLive",
    "HeapGoal",
    "StacksMB",
    "GlobalsMB",
    "NumProcs",
];

/// One completed GC cycle, as reported by a single `gctrace` line.
///
/// Durations are in milliseconds and memory sizes in megabytes, exactly as the
/// runtime prints them. Field order matches `CSV_HEADER`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct GcTrace {
    #[serde(rename = "GCNum")]
    pub gc_num: u64,
    /// Seconds since the traced program started.
    #[serde(rename = "Timestamp", serialize_with = "shortest_decimal")]
    pub timestamp: f64,
    /// Share of available CPU spent in GC since program start.
    #[serde(rename = "CPUPercent", serialize_with = "shortest_decimal")]
    pub cpu_percent: f64,

    // Wall-clock
    #[serde(rename = "WallSTWWriteBarrier", serialize_with = "shortest_decimal")]
    pub wall_stw_write_barrier: f64,
    #[serde(rename = "WallConcurrent", serialize_with = "shortest_decimal")]
    pub wall_concurrent: f64,
    #[serde(rename = "WallSTWMarkTerm", serialize_with = "shortest_decimal")]
    pub wall_stw_mark_term: f64,

    // CPU time
    #[serde(rename = "CPUSTWWriteBarrier", serialize_with = "shortest_decimal")]
    pub cpu_stw_write_barrier: f64,
    #[serde(rename = "CPUMarkAssist", serialize_with = "shortest_decimal")]
    pub cpu_mark_assist: f64,
    #[serde(rename = "CPUMarkBackground", serialize_with = "shortest_decimal")]
    pub cpu_mark_background: f64,
    #[serde(rename = "CPUMarkIdle", serialize_with = "shortest_decimal")]
    pub cpu_mark_idle: f64,
    #[serde(rename = "CPUSTWMarkTerm", serialize_with = "shortest_decimal")]
    pub cpu_stw_mark_term: f64,

    #[serde(rename = "HeapInUseBefore")]
    pub heap_in_use_before: u64,
    #[serde(rename = "HeapInUseAfter")]
    pub heap_in_use_after: u64,
    #[serde(rename = "HeapMarkedLive")]
    pub heap_marked_live: u64,
    /// Heap size the collector aims to stay under until the next cycle.
    #[serde(rename = "HeapGoal")]
    pub heap_goal: u64,
    #[serde(rename = "StacksMB")]
    pub stacks_mb: u64,
    #[serde(rename = "GlobalsMB")]
    pub globals_mb: u64,

    #[serde(rename = "NumProcs")]
    pub num_procs: u32,
}

/// Writes floats the way `Display` does: shortest round-trip digits, no
/// exponent, and `0` rather than `0.0`.
fn shortest_decimal<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
