// crates/cfdot-cli/src/args.rs - Positional and flag validators shared by commands
//
// Each helper turns raw strings from clap into a typed value or a
// validation error (exit 3) with the message operators already know.

use std::fs;

use cfdot_core::CfdotError;
use cfdot_core::error::CfdotResult;
use serde::de::DeserializeOwned;

pub const MISSING_ARGUMENTS: &str = "Missing arguments";
pub const TOO_MANY_ARGUMENTS: &str = "Too many arguments specified";

/// Exactly `N` positionals, or the uniform missing/too-many error
pub fn exact_args<const N: usize>(args: &[String]) -> CfdotResult<[&str; N]> {
    if args.len() < N {
        return Err(CfdotError::validation(MISSING_ARGUMENTS));
    }
    if args.len() > N {
        return Err(CfdotError::validation(TOO_MANY_ARGUMENTS));
    }

    let mut out = [""; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.as_str();
    }
    Ok(out)
}

pub fn no_args(args: &[String]) -> CfdotResult<()> {
    exact_args::<0>(args).map(|_| ())
}

pub fn process_guid(raw: &str) -> CfdotResult<String> {
    non_empty(raw, "Process guid should be non empty string")
}

pub fn task_guid(raw: &str) -> CfdotResult<String> {
    non_empty(raw, "Task guid should be non empty string")
}

fn non_empty(raw: &str, message: &str) -> CfdotResult<String> {
    if raw.is_empty() {
        return Err(CfdotError::validation(message));
    }
    Ok(raw.to_string())
}

/// A non-negative instance index
pub fn index(raw: &str) -> CfdotResult<i32> {
    raw.parse::<i32>()
        .ok()
        .filter(|index| *index >= 0)
        .ok_or_else(|| {
            CfdotError::validation(format!(
                "The value {raw} is not a valid index. Should be a non-negative integer"
            ))
        })
}

pub fn optional_index(raw: Option<&str>) -> CfdotResult<Option<i32>> {
    raw.map(index).transpose()
}

/// At most one domain filter, however it was spelled
pub fn single_domain(domains: &[String]) -> CfdotResult<Option<String>> {
    match domains {
        [] => Ok(None),
        [domain] => Ok(Some(domain.clone())),
        _ => Err(CfdotError::validation("Only one domain may be specified")),
    }
}

/// Inline JSON, or `@PATH` naming a file that holds it
pub fn load_spec<T: DeserializeOwned>(raw: &str) -> CfdotResult<T> {
    let contents = match raw.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).map_err(|err| {
            CfdotError::validation(format!("Unable to read spec file '{path}': {err}"))
        })?,
        None => raw.to_string(),
    };

    serde_json::from_str(&contents)
        .map_err(|err| CfdotError::validation(format!("Invalid JSON: {err}")))
}
