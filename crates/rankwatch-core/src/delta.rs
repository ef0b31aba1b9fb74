/// Signed rank movement between two positions. Positive means the keyword
/// moved toward rank 1; with no previous position there is no movement.
#[must_use]
pub fn compute_change(current: i32, previous: Option<i32>) -> i32 {
    previous.map_or(0, |prev| prev - current)
}
