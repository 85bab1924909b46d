//! Flow node trait: one step with a Prep/Exec/Post lifecycle.
//!
//! `prep` reads and mutates shared state synchronously and returns the prep
//! records for this step (the CoT node returns exactly one per round).
//! `exec` does the expensive work (the LLM call) and may be retried;
//! `exec_fallback` supplies a default result once retries are exhausted.
//! `post` folds the results back into state and routes via `Action`.

use async_trait::async_trait;

use crate::error::AgentError;

use super::{Action, RunContext};

/// One step in a flow: Prep → Exec (×prep records, with retries) → Post.
///
/// The three phases of one node never overlap; the flow drives them
/// serially. State is only touched in `prep` and `post`, so `exec` can
/// suspend without holding any borrow of the shared state.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Send,
{
    /// Prep record produced per exec invocation.
    type Prep: Send + Sync;
    /// Typed result of one exec invocation.
    type Exec: Send + Sync;

    /// Node id (e.g. `"cot"`). Must be unique within a flow.
    fn id(&self) -> &str;

    /// Reads/mutates state and returns zero or more prep records.
    fn prep(&self, state: &mut S) -> Result<Vec<Self::Prep>, AgentError>;

    /// Performs the expensive work for one prep record. Honour
    /// `ctx.cancel` at every await point.
    async fn exec(&self, ctx: &RunContext, prep: &Self::Prep) -> Result<Self::Exec, AgentError>;

    /// Supplies a default result after all retries failed. The default
    /// re-raises, which aborts the flow.
    fn exec_fallback(
        &self,
        _prep: &Self::Prep,
        err: AgentError,
    ) -> Result<Self::Exec, AgentError> {
        Err(err)
    }

    /// Folds prep records and exec results back into state and decides the
    /// next action.
    fn post(
        &self,
        state: &mut S,
        prep: Vec<Self::Prep>,
        results: Vec<Self::Exec>,
    ) -> Result<Action, AgentError>;
}

/// Object-safe face of a node: one full step including retries.
///
/// Implemented for every `Node<S>` via the blanket impl below so a `Flow`
/// can hold heterogeneous nodes as `Arc<dyn StepNode<S>>`.
#[async_trait]
pub trait StepNode<S>: Send + Sync
where
    S: Send,
{
    fn id(&self) -> &str;

    /// Runs prep, exec (with up to `max_attempts` tries per prep record,
    /// then fallback), and post. `max_attempts` below 1 is treated as 1.
    async fn step(
        &self,
        ctx: &RunContext,
        state: &mut S,
        max_attempts: u32,
    ) -> Result<Action, AgentError>;
}

#[async_trait]
impl<S, N> StepNode<S> for N
where
    S: Send,
    N: Node<S>,
{
    fn id(&self) -> &str {
        Node::id(self)
    }

    async fn step(
        &self,
        ctx: &RunContext,
        state: &mut S,
        max_attempts: u32,
    ) -> Result<Action, AgentError> {
        let preps = self.prep(state)?;
        let mut results = Vec::with_capacity(preps.len());
        for prep in &preps {
            let mut attempt = 1u32;
            let result = loop {
                match self.exec(ctx, prep).await {
                    Ok(r) => break r,
                    // Cancellation skips the remaining retries.
                    Err(AgentError::Cancelled) => {
                        break self.exec_fallback(prep, AgentError::Cancelled)?
                    }
                    Err(err) if attempt < max_attempts.max(1) => {
                        tracing::warn!(
                            node = Node::id(self),
                            attempt,
                            error = %err,
                            "exec failed, retrying"
                        );
                        attempt += 1;
                    }
                    Err(err) => {
                        tracing::warn!(
                            node = Node::id(self),
                            attempt,
                            error = %err,
                            "exec failed, using fallback"
                        );
                        break self.exec_fallback(prep, err)?;
                    }
                }
            };
            results.push(result);
        }
        self.post(state, preps, results)
    }
}
