use crate::evaluate::BallCandidate;

/// Index of the candidate with the largest ellipse area.
///
/// Ties keep the earliest candidate in extraction order.
pub fn select_largest(candidates: &[BallCandidate]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in candidates.iter().enumerate() {
        let area = c.area();
        match best {
            Some((_, b)) if area <= b => {}
            _ => best = Some((i, area)),
        }
    }
    best.map(|(i, _)| i)
}
