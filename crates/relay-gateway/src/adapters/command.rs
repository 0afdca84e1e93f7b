//! Command-running execution collaborator.
//!
//! Runs the diagnostic program configured for a query type. Arguments are
//! passed straight to the program (no shell), so a validated target can never
//! be interpreted as shell syntax.

use crate::domain::config::{CommandTemplate, ExecutionConfig};
use crate::domain::error::AgentError;
use crate::domain::request::{QueryResult, QueryType, Request};
use crate::ports::QueryExecutor;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, warn};

/// Maximum stderr bytes echoed back in an error message
const MAX_STDERR_BYTES: usize = 512;

/// Executes queries by spawning configured programs
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    commands: HashMap<QueryType, CommandTemplate>,
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(config: &ExecutionConfig) -> Self {
        let mut commands = HashMap::new();
        for (name, template) in &config.commands {
            match name.parse::<QueryType>() {
                Ok(query_type) => {
                    commands.insert(query_type, template.clone());
                }
                Err(()) => warn!(name = %name, "Ignoring command for unknown query type"),
            }
        }

        Self {
            commands,
            timeout: config.timeout,
        }
    }

    /// Program and fully substituted argument list for `request`.
    pub fn command_line(&self, request: &Request) -> Result<(String, Vec<String>), AgentError> {
        let template = self
            .commands
            .get(&request.query_type())
            .ok_or_else(|| AgentError::unsupported(request.query_type()))?;

        let source = request.source().map(|s| s.to_string()).unwrap_or_default();
        let substitute = |arg: &String| {
            arg.replace("{target}", request.target())
                .replace("{vrf}", request.vrf())
                .replace("{source}", &source)
        };

        let mut args = Vec::with_capacity(template.source_args.len() + template.args.len());
        if request.source().is_some() {
            args.extend(template.source_args.iter().map(&substitute));
        }
        args.extend(template.args.iter().map(&substitute));

        Ok((template.program.clone(), args))
    }
}

#[async_trait]
impl QueryExecutor for CommandExecutor {
    async fn execute(&self, request: &Request) -> Result<QueryResult, AgentError> {
        let (program, args) = self.command_line(request)?;
        debug!(program = %program, args = ?args, "Running query command");

        let child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!(program = %program, error = %e, "Failed to spawn query command");
                return Err(AgentError::execution_failed("command could not be started"));
            }
            Err(_) => {
                warn!(
                    program = %program,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Query command timed out"
                );
                return Err(AgentError::timeout(request.query_type().as_str()));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        // Diagnostic tools exit non-zero on partial loss but still print useful output.
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = truncate(stderr.trim(), MAX_STDERR_BYTES);
            warn!(program = %program, status = %output.status, stderr = %stderr, "Query command failed");

            let details = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr.to_string()
            };
            return Err(AgentError::execution_failed(details));
        }

        Ok(json!({
            "query_type": request.query_type(),
            "target": request.target(),
            "output": stdout,
        }))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
