/// Number of direct replies of a node, as known from two independent sources
///
/// `exact` is set by actually loading the children, `estimated` by the cheap
/// count probe or by the collaborator's precomputed reply count. Once an exact
/// value is known, late estimates are ignored.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ChildCount {
    exact: Option<u64>,
    estimated: Option<u64>,
}

impl ChildCount {
    pub fn unknown() -> ChildCount {
        ChildCount::default()
    }

    pub fn from_estimate(estimated: Option<u64>) -> ChildCount {
        ChildCount {
            exact: None,
            estimated,
        }
    }

    pub fn exact(&self) -> Option<u64> {
        self.exact
    }

    pub fn estimated(&self) -> Option<u64> {
        self.estimated
    }

    pub fn display(&self) -> u64 {
        self.exact.or(self.estimated).unwrap_or(0)
    }

    /// Returns whether the estimate was recorded
    pub fn offer_estimate(&mut self, n: u64) -> bool {
        if self.exact.is_some() {
            return false;
        }
        self.estimated = Some(n);
        true
    }

    pub(crate) fn set_exact(&mut self, n: u64) {
        self.exact = Some(n);
    }

    /// One more reply was submitted while the children were not loaded
    pub(crate) fn bump_estimate(&mut self) {
        self.estimated = Some(self.estimated.unwrap_or(0) + 1);
    }
}
