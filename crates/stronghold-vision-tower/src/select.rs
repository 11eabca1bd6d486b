use crate::evaluate::TowerCandidate;

/// Index of the candidate with the highest squareness.
///
/// Ties keep the earliest candidate in extraction order.
pub fn select_squarest(candidates: &[TowerCandidate]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in candidates.iter().enumerate() {
        let score = c.squareness();
        match best {
            Some((_, b)) if score <= b => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn rect(x0: i32, y0: i32, w: i32, h: i32) -> TowerCandidate {
        TowerCandidate::from_vertices(vec![
            Point2::new(x0, y0),
            Point2::new(x0 + w, y0),
            Point2::new(x0 + w, y0 + h),
            Point2::new(x0, y0 + h),
        ])
        .unwrap()
    }

    #[test]
    fn empty_set_selects_nothing() {
        assert!(select_squarest(&[]).is_none());
    }

    #[test]
    fn highest_squareness_wins() {
        let cands = [rect(0, 0, 80, 40), rect(100, 0, 40, 38), rect(200, 0, 10, 40)];
        assert_eq!(select_squarest(&cands), Some(1));
    }

    #[test]
    fn ties_keep_first_in_order() {
        let cands = [rect(0, 0, 40, 40), rect(100, 0, 20, 20)];
        for _ in 0..3 {
            assert_eq!(select_squarest(&cands), Some(0));
        }
    }
}
