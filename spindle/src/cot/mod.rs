//! Chain-of-Thought reasoning loop: state, node, prompts, YAML parsing,
//! supervisor, and the runner that assembles the flow.

mod node;
mod prompts;
mod runner;
mod state;
pub mod supervisor;
mod yaml;

pub use node::{CotNode, CotPrep};
pub use prompts::{build_messages, format_plan, format_thoughts, seed_plan, COT_SYSTEM_PROMPT};
pub use runner::CotRunner;
pub use state::{
    PlanStep, ThinkingState, ThoughtData, CONCLUSION_EN, CONCLUSION_ZH, STEP_DONE, STEP_PENDING,
    STEP_VERIFICATION_NEEDED,
};
pub use supervisor::{
    extract_best_solution, extract_conclusion_result, validate_solution, MAX_SUPERVISOR_RETRIES,
    MAX_THOUGHTS,
};
pub use yaml::{extract_yaml_block, parse_thought};
