//! Failure filter for `ank get state` output

/// Substrings marking a line as a failure report (case-sensitive)
pub const FAILURE_MARKERS: [&str; 3] = ["StartingFailed", "Error", "Failed"];

/// Shown when no line carries a failure marker
pub const NO_FAILURES: &str = "No failed workloads found";

/// Lines of `detailed_state` containing a failure marker, verbatim and in order
pub fn extract_failures(detailed_state: &str) -> Vec<&str> {
    detailed_state
        .lines()
        .filter(|line| FAILURE_MARKERS.iter().any(|marker| line.contains(marker)))
        .collect()
}

/// Text for the failures view
pub fn failures_text(detailed_state: &str) -> String {
    let lines = extract_failures(detailed_state);
    if lines.is_empty() {
        return NO_FAILURES.to_string();
    }
    lines.join("\n")
}
