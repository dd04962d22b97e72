//! String ordering between chord diagrams and tuning tables.
//!
//! Diagrams list strings highest first (drawing order). Tuning tables,
//! chord data files and arpeggio lanes list them lowest first. All
//! conversions between the two go through this module.

/// Diagram order to tuning order.
pub fn to_tuning_order<T: Clone>(diagram_order: &[T]) -> Vec<T> {
    diagram_order.iter().rev().cloned().collect()
}

/// Tuning order to diagram order.
pub fn to_diagram_order<T: Clone>(tuning_order: &[T]) -> Vec<T> {
    tuning_order.iter().rev().cloned().collect()
}

/// Diagram position of the string at `tuning_index`.
pub fn diagram_index(tuning_index: usize, string_count: usize) -> Option<usize> {
    (tuning_index < string_count).then(|| string_count - 1 - tuning_index)
}

/// Remap an inclusive string range given in tuning order to diagram order.
pub fn range_to_diagram_order(range: [usize; 2], string_count: usize) -> Option<[usize; 2]> {
    let start = diagram_index(range[1], string_count)?;
    let end = diagram_index(range[0], string_count)?;
    Some([start, end])
}
