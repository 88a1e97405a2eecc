/// Delimiter between the location and the frame name in a stack-frame line.
const FRAME_DELIMITER: &str = ":in `";

/// Reduce one stack-frame line to its location.
///
/// `"lib/indexer.rs:42:in `map_record`"` becomes `"lib/indexer.rs:42"`.
/// Lines without a frame name come back unchanged.
pub fn caller_location(line: &str) -> &str {
    match line.split_once(FRAME_DELIMITER) {
        Some((location, _frame)) => location,
        None => line,
    }
}
