//! Deterministic trial compiler for tests and dry runs.

use std::cell::RefCell;
use std::collections::BTreeSet;

use crate::{TrialCompiler, TrialOutcome, TrialRequest, TrialStage};

/// Fails any trial that mentions a rejected flag; passes everything else.
///
/// Every request is recorded so callers can assert on how many trials ran
/// and with what flags.
#[derive(Debug, Default)]
pub struct ScriptedTrialCompiler {
    rejected: BTreeSet<String>,
    requests: RefCell<Vec<TrialRequest>>,
}

impl ScriptedTrialCompiler {
    /// A toolchain that accepts every flag
    pub fn accepting() -> Self {
        Self::default()
    }

    /// A toolchain that rejects the given flags at link time
    pub fn rejecting<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rejected: flags.into_iter().map(Into::into).collect(),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Number of trials attempted so far
    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Copy of every request received, in order
    pub fn requests(&self) -> Vec<TrialRequest> {
        self.requests.borrow().clone()
    }
}

impl TrialCompiler for ScriptedTrialCompiler {
    fn try_link(&self, request: &TrialRequest) -> TrialOutcome {
        self.requests.borrow_mut().push(request.clone());

        match request.flags().find(|flag| self.rejected.contains(*flag)) {
            Some(flag) => TrialOutcome::fail(
                TrialStage::Link,
                format!("{}: unrecognized command-line option '{}'", request.compiler, flag),
            ),
            None => TrialOutcome::pass(),
        }
    }
}
