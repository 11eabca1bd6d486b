use stronghold_vision_core::{BorderFollowingExtractor, Frame, TOWER_FLAG};
use stronghold_vision_tower::{TowerDetector, TowerParams};

const WHITE: [u8; 3] = [255, 255, 255];

/// Octagon `|dx| <= r, |dy| <= r, |dx| + |dy| <= cut` painted white on black.
fn paint_octagon(frame: &mut Frame, cx: i32, cy: i32, r: i32, cut: i32) {
    for y in cy - r..=cy + r {
        for x in cx - r..=cx + r {
            let (dx, dy) = ((x - cx).abs(), (y - cy).abs());
            if dx + dy <= cut {
                frame.put(x, y, WHITE);
            }
        }
    }
}

fn paint_rect(frame: &mut Frame, x0: i32, y0: i32, x1: i32, y1: i32, rgb: [u8; 3]) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            frame.put(x, y, rgb);
        }
    }
}

#[test]
fn octagon_is_selected_over_square() {
    let mut frame = Frame::filled(320, 180, [10, 10, 10]);
    paint_rect(&mut frame, 20, 20, 60, 60, WHITE);
    paint_octagon(&mut frame, 160, 90, 40, 56);

    let detector = TowerDetector::new(TowerParams::default());
    let detection = detector.detect(&frame.view(), &BorderFollowingExtractor::new());

    let target = detection.target().expect("tower target");
    assert_eq!(target.vertices.len(), 8);
    assert_eq!(detection.candidates.len(), 1);
    assert_eq!(detection.reading().values, vec![TOWER_FLAG, 160, 90]);
}

#[test]
fn near_white_is_not_foreground() {
    let mut frame = Frame::filled(320, 180, [0, 0, 0]);
    // one channel at the threshold: never foreground
    paint_rect(&mut frame, 100, 40, 220, 140, [255, 230, 255]);
    let detector = TowerDetector::default();
    let detection = detector.detect(&frame.view(), &BorderFollowingExtractor::new());
    assert!(detection.candidates.is_empty());
    assert_eq!(detection.reading().values, vec![TOWER_FLAG, 0, 0]);
}

#[test]
fn repeated_runs_select_the_same_target() {
    let mut frame = Frame::filled(320, 180, [0, 0, 0]);
    paint_octagon(&mut frame, 80, 90, 40, 56);
    paint_octagon(&mut frame, 240, 90, 40, 56);

    let detector = TowerDetector::default();
    let extractor = BorderFollowingExtractor::new();
    let first = detector.detect(&frame.view(), &extractor);
    assert_eq!(first.candidates.len(), 2);
    for _ in 0..5 {
        let again = detector.detect(&frame.view(), &extractor);
        assert_eq!(again.selected, first.selected);
        assert_eq!(again.reading(), first.reading());
    }
    // identical squareness: extraction order decides
    assert_eq!(first.selected, Some(0));
}
