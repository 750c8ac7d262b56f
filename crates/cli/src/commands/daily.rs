use serde_json::json;
use verse_agent::AgentRuntime;
use verse_telex::{channel_from_config, format_daily_message};

use crate::commands::{
    async_runtime, failure_class, load_config, CommandResult, EXIT_DELIVERY, EXIT_PIPELINE,
    EXIT_RUNTIME_INIT,
};

const COMMAND: &str = "daily";

pub fn run(dry_run: bool) -> CommandResult {
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

    let channel = match channel_from_config(&config.telex) {
        Ok(channel) => channel,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to build delivery channel: {error}"),
                EXIT_RUNTIME_INIT,
            );
        }
    };

    let runtime = match async_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    runtime.block_on(async {
        let record = match agent.daily_verse().await {
            Ok(record) => record,
            Err(error) => {
                return CommandResult::failure(
                    COMMAND,
                    failure_class(error.kind()),
                    error.to_string(),
                    EXIT_PIPELINE,
                );
            }
        };

        let message = format_daily_message(&record);
        let data = json!({
            "reference": record.reference,
            "channel": if dry_run { "none" } else { channel.name() },
            "message": message.text,
        });

        if dry_run {
            return CommandResult::success_with_data(COMMAND, "dry run; not delivered", Some(data));
        }

        match channel.post(&message).await {
            Ok(()) => CommandResult::success_with_data(
                COMMAND,
                format!("daily verse delivered via {}", channel.name()),
                Some(data),
            ),
            Err(error) => {
                CommandResult::failure(COMMAND, "delivery", error.to_string(), EXIT_DELIVERY)
            }
        }
    })
}
