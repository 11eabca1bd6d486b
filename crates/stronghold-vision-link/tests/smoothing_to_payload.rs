use stronghold_vision_core::{Reading, TargetKind, BALL_FLAG};
use stronghold_vision_link::{
    decode_payload, encode_payload, HistorySmoother, PayloadLayout, SmoothingPolicy,
};

const TELEMETRY: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

#[test]
fn ball_flicker_is_hidden_from_the_wire() {
    let mut smoother = HistorySmoother::new(TargetKind::Ball, SmoothingPolicy::default());
    let layout = PayloadLayout::for_target(TargetKind::Ball);

    let frames = [
        Reading::detection(TargetKind::Ball, &[40, 160, 130]),
        Reading::empty(TargetKind::Ball),
        Reading::detection(TargetKind::Ball, &[40, 160, 130]),
    ];

    for raw in &frames {
        let reported = smoother.update(raw).unwrap();
        let bytes = encode_payload(&layout, &reported, &TELEMETRY).unwrap();
        let decoded = decode_payload(&layout, &bytes).unwrap();
        assert_eq!(decoded.values, vec![BALL_FLAG, 40, 160, 130]);
        assert_eq!(decoded.telemetry, TELEMETRY);
    }
}

#[test]
fn tower_reports_raw_values() {
    let policy = SmoothingPolicy::for_target(TargetKind::Tower);
    let mut smoother = HistorySmoother::new(TargetKind::Tower, policy);
    smoother
        .update(&Reading::detection(TargetKind::Tower, &[100, 50]))
        .unwrap();
    let out = smoother
        .update(&Reading::detection(TargetKind::Tower, &[200, 60]))
        .unwrap();
    assert_eq!(out.fields(), &[200, 60]);
}
