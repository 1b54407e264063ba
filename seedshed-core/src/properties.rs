//! Property-based checks of the end-to-end watershed invariants.
//!
//! Fixtures are small random volumes with sparse seeds. Each runner checks
//! one invariant against the output of a full run and reports violations as
//! proptest failures so shrinking can isolate a minimal counterexample.

use std::collections::VecDeque;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use test_strategy::Arbitrary;

use crate::test_utils::suite_proptest_config;
use crate::{
    AffinityField, AffinityGraph, AffinityPolarity, OrderingStrategy, Segmentation, ThresholdGate,
    UNASSIGNED, VolumeShape, WatershedBuilder, WatershedReport,
};

/// Shape of the random affinity values in a fixture.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Arbitrary)]
enum AffinityProfile {
    /// Every magnitude equally likely.
    #[weight(3)]
    Uniform,
    /// Only a handful of magnitudes, so most edges tie.
    #[weight(2)]
    Plateau,
    /// Mostly strong edges crossed by occasional weak membrane planes.
    #[weight(2)]
    Membrane,
}

#[derive(Clone, Debug)]
struct VolumeFixture {
    shape: VolumeShape,
    seeds: Vec<u32>,
    affinity: Vec<u8>,
    threshold: u8,
}

impl VolumeFixture {
    fn generate(profile: AffinityProfile, dims: [usize; 3], threshold: u8, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let [depth, height, width] = dims;
        let shape = VolumeShape::new(depth, height, width).expect("fixture dims are small");
        let voxels = shape.voxel_count();

        let seeds = (0..voxels)
            .map(|_| {
                if rng.gen_bool(0.15) {
                    rng.gen_range(1..=3)
                } else {
                    UNASSIGNED
                }
            })
            .collect();
        let affinity = (0..3 * voxels)
            .map(|slot| match profile {
                AffinityProfile::Uniform => rng.r#gen::<u8>(),
                AffinityProfile::Plateau => [0, 64, 128, 255][rng.gen_range(0..4)],
                AffinityProfile::Membrane => {
                    if (slot % voxels) % 3 == 0 {
                        rng.gen_range(0..40)
                    } else {
                        rng.gen_range(180..=255)
                    }
                }
            })
            .collect();

        Self {
            shape,
            seeds,
            affinity,
            threshold,
        }
    }

    fn without_seeds(&self) -> Self {
        Self {
            seeds: vec![UNASSIGNED; self.seeds.len()],
            ..self.clone()
        }
    }

    fn dims(&self) -> [usize; 4] {
        let [depth, height, width] = self.shape.dims();
        [3, depth, height, width]
    }

    fn segment(
        &self,
        affinity: &[u8],
        threshold: u8,
        polarity: AffinityPolarity,
        ordering: OrderingStrategy,
    ) -> (Vec<u32>, WatershedReport) {
        let mut labels = self.seeds.clone();
        let field = AffinityField::new(affinity, self.dims()).expect("fixture field is congruent");
        let mut segmentation =
            Segmentation::new(&mut labels, self.shape).expect("fixture labels are congruent");
        let report = WatershedBuilder::new()
            .with_threshold(threshold)
            .with_polarity(polarity)
            .with_ordering(ordering)
            .build()
            .expect("fixture configuration is valid")
            .run(&mut segmentation, &field)
            .expect("fixture run succeeds");
        (labels, report)
    }

    fn segment_default(&self) -> (Vec<u32>, WatershedReport) {
        self.segment(
            &self.affinity,
            self.threshold,
            AffinityPolarity::Similarity,
            OrderingStrategy::Bucket,
        )
    }
}

fn fixture_strategy() -> impl Strategy<Value = VolumeFixture> {
    (
        any::<AffinityProfile>(),
        [1_usize..=4, 1_usize..=5, 1_usize..=6],
        any::<u8>(),
        any::<u64>(),
    )
        .prop_map(|(profile, dims, threshold, seed)| {
            VolumeFixture::generate(profile, dims, threshold, seed)
        })
}

fn run_seed_preservation_property(fixture: &VolumeFixture) -> Result<(), TestCaseError> {
    let (labels, report) = fixture.segment_default();
    for (voxel, (seed, label)) in fixture.seeds.iter().zip(&labels).enumerate() {
        if *seed != UNASSIGNED {
            prop_assert_eq!(*label, *seed, "seed voxel {} was relabelled", voxel);
        }
        if *label != UNASSIGNED {
            prop_assert!(
                fixture.seeds.contains(label),
                "label {} at voxel {} was never seeded",
                label,
                voxel
            );
        }
    }
    prop_assert_eq!(report.labelled_voxels() + report.unassigned_voxels(), labels.len());
    Ok(())
}

/// Admitted edges never join an unassigned voxel to a labelled one: the edge
/// would have carried the label across when it was processed.
fn run_no_open_frontier_property(fixture: &VolumeFixture) -> Result<(), TestCaseError> {
    let (labels, _) = fixture.segment_default();
    let field = AffinityField::new(&fixture.affinity, fixture.dims()).expect("congruent");
    let gate = ThresholdGate::new(fixture.threshold, AffinityPolarity::Similarity);
    for edge in AffinityGraph::new(&field).edges() {
        if !gate.admits(edge.weight()) {
            continue;
        }
        let lower = labels[edge.lower()];
        let upper = labels[edge.upper()];
        prop_assert!(
            (lower == UNASSIGNED) == (upper == UNASSIGNED),
            "admitted edge {:?} straddles labelled and unassigned voxels",
            edge.id()
        );
    }
    Ok(())
}

/// Differently labelled neighbours only meet across edges that were gated
/// out or processed as conflicts.
fn run_no_cross_label_bleed_property(fixture: &VolumeFixture) -> Result<(), TestCaseError> {
    let (labels, report) = fixture.segment_default();
    let field = AffinityField::new(&fixture.affinity, fixture.dims()).expect("congruent");
    let gate = ThresholdGate::new(fixture.threshold, AffinityPolarity::Similarity);
    let contested = AffinityGraph::new(&field)
        .edges()
        .filter(|edge| gate.admits(edge.weight()))
        .filter(|edge| {
            let lower = labels[edge.lower()];
            let upper = labels[edge.upper()];
            lower != UNASSIGNED && upper != UNASSIGNED && lower != upper
        })
        .count();
    prop_assert!(
        contested <= report.conflicts(),
        "{} admitted edges separate labels but only {} conflicts were recorded",
        contested,
        report.conflicts()
    );
    if report.conflicts() == 0 {
        prop_assert_eq!(contested, 0);
    }
    Ok(())
}

/// Without seeds nothing can be claimed, whatever the affinities or threshold.
fn run_no_seed_idempotence_property(fixture: &VolumeFixture) -> Result<(), TestCaseError> {
    let unseeded = fixture.without_seeds();
    for ordering in [OrderingStrategy::Bucket, OrderingStrategy::ComparisonSort] {
        let (labels, report) = unseeded.segment(
            &unseeded.affinity,
            unseeded.threshold,
            AffinityPolarity::Similarity,
            ordering,
        );
        prop_assert_eq!(&labels, &unseeded.seeds);
        prop_assert_eq!(report.seed_voxels(), 0);
        prop_assert_eq!(report.labelled_voxels(), 0);
        prop_assert_eq!(report.claims(), 0);
        prop_assert_eq!(report.conflicts(), 0);
    }
    Ok(())
}

/// Every labelled voxel reaches a seed of its own label through admitted
/// edges without leaving that label's territory.
fn run_label_connectivity_property(fixture: &VolumeFixture) -> Result<(), TestCaseError> {
    let (labels, _) = fixture.segment_default();
    let field = AffinityField::new(&fixture.affinity, fixture.dims()).expect("congruent");
    let gate = ThresholdGate::new(fixture.threshold, AffinityPolarity::Similarity);

    let mut adjacency = vec![Vec::new(); labels.len()];
    for edge in AffinityGraph::new(&field).edges() {
        if gate.admits(edge.weight()) && labels[edge.lower()] == labels[edge.upper()] {
            adjacency[edge.lower()].push(edge.upper());
            adjacency[edge.upper()].push(edge.lower());
        }
    }

    let mut reached = vec![false; labels.len()];
    let mut queue: VecDeque<usize> = fixture
        .seeds
        .iter()
        .enumerate()
        .filter(|(_, seed)| **seed != UNASSIGNED)
        .map(|(voxel, _)| voxel)
        .collect();
    for voxel in &queue {
        reached[*voxel] = true;
    }
    while let Some(voxel) = queue.pop_front() {
        for next in &adjacency[voxel] {
            if !reached[*next] {
                reached[*next] = true;
                queue.push_back(*next);
            }
        }
    }

    for (voxel, label) in labels.iter().enumerate() {
        if *label != UNASSIGNED {
            prop_assert!(reached[voxel], "voxel {} labelled {} is cut off", voxel, label);
        }
    }
    Ok(())
}

fn run_strategy_agreement_property(fixture: &VolumeFixture) -> Result<(), TestCaseError> {
    let polarity = AffinityPolarity::Similarity;
    let (bucket, bucket_report) = fixture.segment(
        &fixture.affinity,
        fixture.threshold,
        polarity,
        OrderingStrategy::Bucket,
    );
    let (sorted, sorted_report) = fixture.segment(
        &fixture.affinity,
        fixture.threshold,
        polarity,
        OrderingStrategy::ComparisonSort,
    );
    prop_assert_eq!(bucket, sorted);
    prop_assert_eq!(bucket_report, sorted_report);
    Ok(())
}

/// Inverting every magnitude and the threshold under the opposite polarity
/// yields the same ordering, so the same labels.
fn run_polarity_agreement_property(fixture: &VolumeFixture) -> Result<(), TestCaseError> {
    let (similarity, _) = fixture.segment_default();
    let inverted: Vec<u8> = fixture.affinity.iter().map(|weight| u8::MAX - weight).collect();
    let (dissimilarity, _) = fixture.segment(
        &inverted,
        u8::MAX - fixture.threshold,
        AffinityPolarity::Dissimilarity,
        OrderingStrategy::Bucket,
    );
    prop_assert_eq!(similarity, dissimilarity);
    Ok(())
}

/// Lowering the threshold only appends weaker edges to the processing order,
/// so every voxel labelled at the higher threshold keeps its label.
fn run_threshold_monotonicity_property(fixture: &VolumeFixture) -> Result<(), TestCaseError> {
    let (strict, _) = fixture.segment_default();
    let relaxed_threshold = fixture.threshold / 2;
    let (relaxed, _) = fixture.segment(
        &fixture.affinity,
        relaxed_threshold,
        AffinityPolarity::Similarity,
        OrderingStrategy::Bucket,
    );
    for (voxel, (before, after)) in strict.iter().zip(&relaxed).enumerate() {
        if *before != UNASSIGNED {
            prop_assert_eq!(
                *after,
                *before,
                "voxel {} changed label when the threshold dropped to {}",
                voxel,
                relaxed_threshold
            );
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(suite_proptest_config(128))]

    #[test]
    fn seeds_survive_and_labels_come_from_seeds(fixture in fixture_strategy()) {
        run_seed_preservation_property(&fixture)?;
    }

    #[test]
    fn admitted_edges_never_leave_an_open_frontier(fixture in fixture_strategy()) {
        run_no_open_frontier_property(&fixture)?;
    }

    #[test]
    fn differing_labels_meet_only_across_conflicts(fixture in fixture_strategy()) {
        run_no_cross_label_bleed_property(&fixture)?;
    }

    #[test]
    fn unseeded_volumes_stay_unassigned(fixture in fixture_strategy()) {
        run_no_seed_idempotence_property(&fixture)?;
    }

    #[test]
    fn labelled_voxels_connect_to_their_seed(fixture in fixture_strategy()) {
        run_label_connectivity_property(&fixture)?;
    }

    #[test]
    fn ordering_strategies_agree(fixture in fixture_strategy()) {
        run_strategy_agreement_property(&fixture)?;
    }

    #[test]
    fn polarities_agree_on_inverted_affinities(fixture in fixture_strategy()) {
        run_polarity_agreement_property(&fixture)?;
    }

    #[test]
    fn relaxing_the_threshold_keeps_existing_labels(fixture in fixture_strategy()) {
        run_threshold_monotonicity_property(&fixture)?;
    }
}

#[rstest::rstest]
#[case::uniform(AffinityProfile::Uniform, 42)]
#[case::plateau(AffinityProfile::Plateau, 42)]
#[case::plateau_ties(AffinityProfile::Plateau, 7777)]
#[case::membrane(AffinityProfile::Membrane, 999)]
fn fixed_seed_fixtures_hold_every_invariant(#[case] profile: AffinityProfile, #[case] seed: u64) {
    let fixture = VolumeFixture::generate(profile, [3, 4, 5], 100, seed);
    run_seed_preservation_property(&fixture).expect("seeds preserved");
    run_no_open_frontier_property(&fixture).expect("no open frontier");
    run_no_cross_label_bleed_property(&fixture).expect("no cross-label bleed");
    run_no_seed_idempotence_property(&fixture).expect("unseeded run is a no-op");
    run_label_connectivity_property(&fixture).expect("labels connected");
    run_strategy_agreement_property(&fixture).expect("strategies agree");
    run_polarity_agreement_property(&fixture).expect("polarities agree");
}
