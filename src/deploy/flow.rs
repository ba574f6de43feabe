// ABOUTME: Generic release flow struct parameterized by state marker.
// ABOUTME: Carries the release record and the rollback target through the phases.

use std::marker::PhantomData;

use crate::release::Release;

use super::state::Pending;

/// A release transaction in progress, parameterized by its current phase.
///
/// The phase type parameter `S` makes illegal phase orderings unrepresentable:
/// you cannot health-gate an artifact that was never transported.
#[derive(Debug)]
pub struct ReleaseFlow<S> {
    pub(crate) release: Release,
    /// The release that was live when this transaction started; the
    /// rollback target for post-transport failures.
    pub(crate) previous: Option<Release>,
    pub(crate) _state: PhantomData<S>,
}

impl ReleaseFlow<Pending> {
    /// Start a flow for a freshly recorded pending release.
    pub fn new(release: Release, previous: Option<Release>) -> Self {
        Self {
            release,
            previous,
            _state: PhantomData,
        }
    }
}

impl<S> ReleaseFlow<S> {
    pub fn release(&self) -> &Release {
        &self.release
    }

    /// The rollback target, if any.
    pub fn previous(&self) -> Option<&Release> {
        self.previous.as_ref()
    }

    /// Tear the flow down into its record and rollback target.
    pub fn into_parts(self) -> (Release, Option<Release>) {
        (self.release, self.previous)
    }
}
