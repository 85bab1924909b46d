//! Sentinel actions returned by `Node::post`.

/// Routing decision after one node step.
///
/// `Continue` follows the matching edge (possibly back to the same node);
/// `End` stops the flow unconditionally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Continue,
    End,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Continue => "continue",
            Action::End => "end",
        }
    }
}
