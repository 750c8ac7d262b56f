use verse_agent::AgentRuntime;

use crate::commands::{
    async_runtime, failure_class, load_config, CommandResult, EXIT_PIPELINE, EXIT_RUNTIME_INIT,
};

const COMMAND: &str = "ask";

pub fn run(query: &str) -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let agent = match AgentRuntime::from_config(&config) {
        Ok(agent) => agent,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to build agent runtime: {error:#}"),
                EXIT_RUNTIME_INIT,
            );
        }
    };

    let runtime = match async_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    match runtime.block_on(agent.handle_query(query)) {
        Ok(outcome) => CommandResult::success_with_data(
            COMMAND,
            format!("{} outcome", outcome.outcome_name()),
            serde_json::to_value(&outcome).ok(),
        ),
        Err(error) => CommandResult::failure(
            COMMAND,
            failure_class(error.kind()),
            error.to_string(),
            EXIT_PIPELINE,
        ),
    }
}
