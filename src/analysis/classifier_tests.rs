use super::*;

const WINDOW_LEN: usize = 131;

/// Helper to create an unclassified peak with a narrow extent
fn create_peak(index: usize, amplitude: u32) -> Peak {
    Peak::new(index, amplitude, index.saturating_sub(3), index + 3, amplitude as f64)
}

fn roles(classified: &ClassifiedPeaks) -> Vec<PeakRole> {
    classified.peaks.iter().map(|p| p.role).collect()
}

#[test]
fn test_classify_no_peaks() {
    let classified = PeakClassifier::default().classify(Vec::new(), WINDOW_LEN);
    assert!(classified.is_empty());
    assert!(classified.edge().is_none());
    assert!(classified.liquid().is_none());
}

#[test]
fn test_classify_single_late_peak_is_liquid() {
    let classified = PeakClassifier::default().classify(vec![create_peak(100, 800)], WINDOW_LEN);
    assert!(classified.edge().is_none());
    assert_eq!(classified.liquid().map(|p| p.index), Some(100));
    assert_eq!(roles(&classified), vec![PeakRole::Liquid]);
}

#[test]
fn test_classify_single_early_peak_is_edge() {
    let classified = PeakClassifier::default().classify(vec![create_peak(30, 800)], WINDOW_LEN);
    assert_eq!(classified.edge().map(|p| p.index), Some(30));
    assert!(classified.liquid().is_none());
}

#[test]
fn test_classify_single_peak_split_boundary() {
    // 0.55 * 131 = 72.05: index 72 stays Edge, 73 becomes Liquid
    let classifier = PeakClassifier::default();
    let at_split = classifier.classify(vec![create_peak(72, 500)], WINDOW_LEN);
    assert_eq!(roles(&at_split), vec![PeakRole::Edge]);

    let past_split = classifier.classify(vec![create_peak(73, 500)], WINDOW_LEN);
    assert_eq!(roles(&past_split), vec![PeakRole::Liquid]);
}

#[test]
fn test_classify_two_peaks_ignores_amplitude() {
    let classified = PeakClassifier::default()
        .classify(vec![create_peak(110, 300), create_peak(20, 5000)], WINDOW_LEN);
    assert_eq!(classified.edge().map(|p| p.index), Some(20));
    assert_eq!(classified.liquid().map(|p| p.index), Some(110));
    assert_eq!(roles(&classified), vec![PeakRole::Edge, PeakRole::Liquid]);
}

#[test]
fn test_classify_many_picks_strongest_in_right_zone() {
    // edge 10: zone starts at 10 + 0.4 * 121 = 58.4
    let classified = PeakClassifier::default().classify(
        vec![
            create_peak(10, 1000),
            create_peak(40, 4000),
            create_peak(80, 2500),
            create_peak(110, 1200),
        ],
        WINDOW_LEN,
    );
    assert_eq!(classified.edge().map(|p| p.index), Some(10));
    assert_eq!(classified.liquid().map(|p| p.index), Some(80));
    assert_eq!(
        roles(&classified),
        vec![
            PeakRole::Edge,
            PeakRole::Interference,
            PeakRole::Liquid,
            PeakRole::Interference
        ]
    );
}

#[test]
fn test_classify_empty_right_zone_falls_back_to_rightmost() {
    let classified = PeakClassifier::default().classify(
        vec![create_peak(10, 1000), create_peak(20, 900), create_peak(50, 700)],
        WINDOW_LEN,
    );
    assert_eq!(classified.liquid().map(|p| p.index), Some(50));
    assert_eq!(
        roles(&classified),
        vec![PeakRole::Edge, PeakRole::Interference, PeakRole::Liquid]
    );
}

#[test]
fn test_classify_right_zone_tie_prefers_leftmost() {
    let classified = PeakClassifier::default().classify(
        vec![
            create_peak(10, 1000),
            create_peak(90, 2000),
            create_peak(120, 2000),
        ],
        WINDOW_LEN,
    );
    assert_eq!(classified.liquid().map(|p| p.index), Some(90));
}

#[test]
fn test_classify_at_most_one_edge_and_liquid() {
    let peaks: Vec<Peak> = (0..12)
        .map(|i| create_peak(5 + i * 10, 300 + (i as u32 * 37) % 900))
        .collect();
    let classified = PeakClassifier::default().classify(peaks, WINDOW_LEN);

    assert_eq!(classified.with_role(PeakRole::Edge).count(), 1);
    assert_eq!(classified.with_role(PeakRole::Liquid).count(), 1);
    assert_eq!(classified.with_role(PeakRole::Unknown).count(), 0);
    assert_eq!(classified.with_role(PeakRole::Interference).count(), 10);
}

#[test]
fn test_classify_respects_configured_fractions() {
    let classifier = PeakClassifier::new(0.4, 0.9);
    let classified = classifier.classify(vec![create_peak(100, 800)], WINDOW_LEN);
    assert_eq!(roles(&classified), vec![PeakRole::Edge]);
}

#[test]
fn test_from_tagged_locates_roles() {
    let classified = ClassifiedPeaks::from_tagged(vec![
        create_peak(90, 2000).with_role(PeakRole::Liquid),
        create_peak(10, 800).with_role(PeakRole::Edge),
        create_peak(40, 500).with_role(PeakRole::Interference),
    ]);
    assert_eq!(classified.edge().map(|p| p.index), Some(10));
    assert_eq!(classified.liquid().map(|p| p.index), Some(90));
    assert_eq!(classified.peaks[1].index, 40);
}
