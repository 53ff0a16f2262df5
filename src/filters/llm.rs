use super::FilterArgs;
use crate::backend::CompletionRequest;
use crate::error::Result;
use crate::runtime::Runtime;
use crate::value::Value;

/// Send the value as a single user message to `model` and return the reply.
pub(super) fn prompt(input: Value, args: &FilterArgs, rt: &mut Runtime) -> Result<Value> {
    let request = CompletionRequest {
        model: args.str("model").unwrap_or_default().to_string(),
        prompt: input.as_text(),
        temperature: args.number("temperature"),
        max_tokens: args.count("max_tokens"),
    };
    tracing::info!(
        model = %request.model,
        prompt_chars = request.prompt.chars().count(),
        "requesting completion"
    );

    let reply = rt.completion.complete(&request)?;
    Ok(Value::text(reply))
}
