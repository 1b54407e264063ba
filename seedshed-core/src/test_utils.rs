//! Shared test utilities for `seedshed-core`.

use proptest::test_runner::Config as ProptestConfig;
use seedshed_test_support::ci::property_test_profile::ProptestRunProfile;

/// Builds a proptest configuration from the shared CI profile.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}
