use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use herald_common::Message;
use parking_lot::Mutex;

use super::Provider;
use crate::{ProviderError, ProviderOutcome};

#[derive(Debug, Clone)]
enum Step {
    Reply(Result<ProviderOutcome, ProviderError>),
    Hang,
}

/// Provider that replays a fixed script, for exercising retry and fallback.
///
/// Each send consumes the next scripted step; once the script runs out every
/// further send repeats the final step. Calls are counted.
#[derive(Debug)]
pub struct ScriptedProvider {
    name: String,
    script: Mutex<VecDeque<Step>>,
    last: Step,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Replays `outcomes` in order
    #[must_use]
    pub fn new<I>(name: impl Into<String>, outcomes: I) -> Self
    where
        I: IntoIterator<Item = Result<ProviderOutcome, ProviderError>>,
    {
        let script: VecDeque<Step> = outcomes.into_iter().map(Step::Reply).collect();
        let last = script
            .back()
            .cloned()
            .unwrap_or(Step::Reply(Ok(ProviderOutcome::delivered())));

        Self {
            name: name.into(),
            script: Mutex::new(script),
            last,
            calls: AtomicUsize::new(0),
        }
    }

    /// Accepts every send
    #[must_use]
    pub fn succeeding(name: impl Into<String>) -> Self {
        Self::new(name, [Ok(ProviderOutcome::delivered())])
    }

    /// Refuses every send with `"<name> temporarily unavailable"`
    #[must_use]
    pub fn failing(name: impl Into<String>) -> Self {
        let name: String = name.into();
        let error = format!("{name} temporarily unavailable");
        Self::new(name, [Ok(ProviderOutcome::failed(error))])
    }

    /// Refuses the first `failures` sends, then accepts
    #[must_use]
    pub fn failing_then_succeeding(name: impl Into<String>, failures: usize) -> Self {
        let name: String = name.into();
        let error = format!("{name} temporarily unavailable");
        let outcomes = std::iter::repeat_n(Ok(ProviderOutcome::failed(error)), failures)
            .chain(std::iter::once(Ok(ProviderOutcome::delivered())));
        Self::new(name, outcomes)
    }

    /// Faults on every send
    #[must_use]
    pub fn faulting(name: impl Into<String>, fault: ProviderError) -> Self {
        Self::new(name, [Err(fault)])
    }

    /// Never completes a send
    #[must_use]
    pub fn hanging(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            last: Step::Hang,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of sends made so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.last.clone())
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, _message: &Message) -> Result<ProviderOutcome, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.next_step() {
            Step::Reply(reply) => reply,
            Step::Hang => std::future::pending().await,
        }
    }
}
