//! Flow: a root node plus `(node, action)` edges, run to completion.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AgentError;

use super::{Action, RunContext, StepNode};

/// Owns named nodes and the successor mapping.
///
/// Execution starts at the node given to `new`, runs one step, then follows
/// the `(current, action)` edge. No edge for the returned action ends the
/// run, as does `Action::End`. Self-edges are permitted.
pub struct Flow<S> {
    start: String,
    nodes: HashMap<String, Arc<dyn StepNode<S>>>,
    edges: HashMap<(String, Action), String>,
    max_attempts: u32,
}

impl<S> Flow<S>
where
    S: Send,
{
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            nodes: HashMap::new(),
            edges: HashMap::new(),
            max_attempts: 1,
        }
    }

    /// Total exec attempts per prep record before `exec_fallback` runs.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn StepNode<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        action: Action,
        to: impl Into<String>,
    ) -> &mut Self {
        self.edges.insert((from.into(), action), to.into());
        self
    }

    /// Runs the flow to completion over `state`.
    ///
    /// A cancelled context stops before the next step; whatever the nodes
    /// accumulated in `state` so far is left for the caller.
    pub async fn run(&self, ctx: &RunContext, state: &mut S) -> Result<(), AgentError> {
        let mut current = self.start.clone();
        loop {
            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| AgentError::Flow(format!("unknown node: {}", current)))?;
            tracing::debug!(node = %current, "flow step");
            let action = node.step(ctx, state, self.max_attempts).await?;
            if action == Action::End {
                return Ok(());
            }
            match self.edges.get(&(current.clone(), action)) {
                Some(next) => current = next.clone(),
                None => return Ok(()),
            }
            if ctx.cancel.is_cancelled() {
                tracing::debug!(node = %current, "flow cancelled between steps");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::flow::Node;

    #[derive(Default)]
    struct CountState {
        count: u32,
        fallbacks: u32,
    }

    /// Increments the count each round; ends once the limit is reached.
    struct CountNode {
        limit: u32,
    }

    #[async_trait]
    impl Node<CountState> for CountNode {
        type Prep = u32;
        type Exec = u32;

        fn id(&self) -> &str {
            "count"
        }

        fn prep(&self, state: &mut CountState) -> Result<Vec<u32>, AgentError> {
            Ok(vec![state.count])
        }

        async fn exec(&self, _ctx: &RunContext, prep: &u32) -> Result<u32, AgentError> {
            Ok(prep + 1)
        }

        fn post(
            &self,
            state: &mut CountState,
            _prep: Vec<u32>,
            results: Vec<u32>,
        ) -> Result<Action, AgentError> {
            state.count = results[0];
            if state.count >= self.limit {
                Ok(Action::End)
            } else {
                Ok(Action::Continue)
            }
        }
    }

    /// Always fails exec; fallback records the failure and post ends.
    struct FailingNode;

    #[async_trait]
    impl Node<CountState> for FailingNode {
        type Prep = ();
        type Exec = u32;

        fn id(&self) -> &str {
            "failing"
        }

        fn prep(&self, _state: &mut CountState) -> Result<Vec<()>, AgentError> {
            Ok(vec![()])
        }

        async fn exec(&self, _ctx: &RunContext, _prep: &()) -> Result<u32, AgentError> {
            Err(AgentError::Llm("boom".to_string()))
        }

        fn exec_fallback(&self, _prep: &(), _err: AgentError) -> Result<u32, AgentError> {
            Ok(99)
        }

        fn post(
            &self,
            state: &mut CountState,
            _prep: Vec<()>,
            results: Vec<u32>,
        ) -> Result<Action, AgentError> {
            state.fallbacks += 1;
            state.count = results[0];
            Ok(Action::End)
        }
    }

    /// **Scenario**: a self-edge loops until post returns End.
    #[tokio::test]
    async fn self_edge_loops_until_end() {
        let mut flow = Flow::new("count");
        flow.add_node("count", Arc::new(CountNode { limit: 3 }));
        flow.add_edge("count", Action::Continue, "count");
        let mut state = CountState::default();
        flow.run(&RunContext::new(), &mut state).await.unwrap();
        assert_eq!(state.count, 3);
    }

    /// **Scenario**: a missing edge ends the flow without error.
    #[tokio::test]
    async fn missing_edge_ends_flow() {
        let mut flow = Flow::new("count");
        flow.add_node("count", Arc::new(CountNode { limit: 10 }));
        let mut state = CountState::default();
        flow.run(&RunContext::new(), &mut state).await.unwrap();
        assert_eq!(state.count, 1);
    }

    /// **Scenario**: exec exhaustion runs the fallback instead of aborting.
    #[tokio::test]
    async fn retries_exhausted_use_fallback() {
        let mut flow = Flow::new("failing").with_max_attempts(3);
        flow.add_node("failing", Arc::new(FailingNode));
        let mut state = CountState::default();
        flow.run(&RunContext::new(), &mut state).await.unwrap();
        assert_eq!(state.count, 99);
        assert_eq!(state.fallbacks, 1);
    }

    /// **Scenario**: an unknown start node is a flow error.
    #[tokio::test]
    async fn unknown_start_node_is_error() {
        let flow: Flow<CountState> = Flow::new("nope");
        let mut state = CountState::default();
        let err = flow.run(&RunContext::new(), &mut state).await.unwrap_err();
        assert!(matches!(err, AgentError::Flow(_)));
    }
}
