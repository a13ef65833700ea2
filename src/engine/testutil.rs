//! Test-only decision source driven by a closure, so phase and controller
//! tests can script every actor deterministically.

use crate::engine::decision::DecisionSource;
use crate::model::action::{ActionRequest, Decision};

pub struct ScriptedSource<F: FnMut(&ActionRequest) -> Decision> {
    script: F,
}

impl<F: FnMut(&ActionRequest) -> Decision> ScriptedSource<F> {
    pub fn new(script: F) -> Self {
        Self { script }
    }
}

impl<F: FnMut(&ActionRequest) -> Decision> DecisionSource for ScriptedSource<F> {
    fn decide(&mut self, request: &ActionRequest) -> Decision {
        (self.script)(request)
    }
}

/// The option key that selects `target`, falling back to the first key when
/// `target` is not on offer (e.g. the impostor voting for someone else).
pub fn key_for(request: &ActionRequest, target: &str) -> Decision {
    request
        .options
        .iter()
        .find(|(_, id)| id.as_str() == target)
        .or_else(|| request.options.iter().next())
        .map(|(key, _)| Decision::Key(key.clone()))
        .unwrap_or_else(|| Decision::Key(String::new()))
}
