//! Expression evaluation for `${{ }}` placeholders in step parameters
//!
//! Supports:
//! - ${{ context.KEY }}      value written by an earlier step
//! - ${{ env.VAR_NAME }}     runner environment
//! - ${{ execution.id }}     current execution ID

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::context::StepContext;
use super::params::ResolvedParams;

static EXPRESSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\{\s*([^}]+?)\s*\}\}").unwrap());

/// Errors that can occur during expression evaluation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Invalid expression syntax: {0}")]
    InvalidSyntax(String),
}

/// Evaluate all expressions in a string
pub fn evaluate(input: &str, ctx: &StepContext) -> Result<String, ExpressionError> {
    let mut result = input.to_string();

    for cap in EXPRESSION_REGEX.captures_iter(input) {
        let (Some(full_match), Some(expr)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let value = evaluate_single(expr.as_str().trim(), ctx)?;
        result = result.replace(full_match.as_str(), &value);
    }

    Ok(result)
}

/// Evaluate a single expression (without the ${{ }} wrapper)
fn evaluate_single(expr: &str, ctx: &StepContext) -> Result<String, ExpressionError> {
    let parts: Vec<&str> = expr.splitn(2, '.').collect();
    if parts.len() != 2 || parts[1].is_empty() {
        return Err(ExpressionError::InvalidSyntax(expr.to_string()));
    }

    match parts[0] {
        "context" => ctx
            .get(parts[1])
            .map(str::to_string)
            .ok_or_else(|| ExpressionError::UnknownVariable(format!("context.{}", parts[1]))),
        "env" => ctx
            .get_env(parts[1])
            .map(str::to_string)
            .ok_or_else(|| ExpressionError::UnknownVariable(format!("env.{}", parts[1]))),
        "execution" if parts[1] == "id" => Ok(ctx.execution_id.clone()),
        _ => Err(ExpressionError::UnknownVariable(expr.to_string())),
    }
}

/// Evaluate expressions in every string of the resolved parameters, in place
pub fn evaluate_params(
    params: &mut ResolvedParams,
    ctx: &StepContext,
) -> Result<(), ExpressionError> {
    for value in params.as_map_mut().values_mut() {
        evaluate_value(value, ctx)?;
    }
    Ok(())
}

fn evaluate_value(value: &mut Value, ctx: &StepContext) -> Result<(), ExpressionError> {
    match value {
        Value::String(s) if s.contains("${{") => {
            *s = evaluate(s, ctx)?;
        }
        Value::Array(items) => {
            for item in items {
                evaluate_value(item, ctx)?;
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                evaluate_value(item, ctx)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_context() -> StepContext {
        let mut ctx = StepContext::new("exec_42");
        ctx.set("generated_prompt", "a fox running through snow");
        ctx.set_env("STYLE", "watercolor");
        ctx
    }

    #[test]
    fn test_evaluate_context() {
        let ctx = test_context();
        let result = evaluate("${{ context.generated_prompt }}, 4k", &ctx).unwrap();
        assert_eq!(result, "a fox running through snow, 4k");
    }

    #[test]
    fn test_evaluate_multiple() {
        let ctx = test_context();
        let result = evaluate("${{env.STYLE}} / ${{ execution.id }}", &ctx).unwrap();
        assert_eq!(result, "watercolor / exec_42");
    }

    #[test]
    fn test_unknown_variable() {
        let ctx = test_context();
        assert_eq!(
            evaluate("${{ context.missing }}", &ctx),
            Err(ExpressionError::UnknownVariable("context.missing".to_string()))
        );
        assert!(evaluate("${{ nothing }}", &ctx).is_err());
    }

    #[test]
    fn test_evaluate_params_nested() {
        let ctx = test_context();
        let mut params = ResolvedParams::default();
        params.insert("prompt", json!("${{ context.generated_prompt }}"));
        params.insert("tags", json!(["${{ env.STYLE }}", 3]));
        params.insert("seed", json!(7));

        evaluate_params(&mut params, &ctx).unwrap();

        assert_eq!(params.get_str("prompt"), Some("a fox running through snow"));
        assert_eq!(params.get("tags"), Some(&json!(["watercolor", 3])));
        assert_eq!(params.get_u64("seed"), Some(7));
    }
}
