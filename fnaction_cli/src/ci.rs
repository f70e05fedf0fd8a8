// SPDX-License-Identifier: MIT

//! Detection of the hosting CI system plus its two side channels: log
//! annotations (so warnings and errors surface in the run summary) and step
//! outputs (so downstream steps can consume the deployed external id).

use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiSystem {
    GitHubActions,
    AzurePipelines,
    Local,
}

impl CiSystem {
    pub fn detect() -> Self {
        if truthy(std::env::var("GITHUB_ACTIONS").ok()) {
            CiSystem::GitHubActions
        } else if truthy(std::env::var("TF_BUILD").ok()) {
            CiSystem::AzurePipelines
        } else {
            CiSystem::Local
        }
    }
}

fn truthy(value: Option<String>) -> bool {
    value.map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Workflow-command prefix for a log record, or `None` when the line should be
/// printed plain. The mapping is shifted one level up on purpose: plain lines
/// drown in CI run logs, so info surfaces as a warning annotation and warnings
/// join errors. Annotation payloads are single-line, so messages get their
/// newlines escaped separately.
fn annotation_prefix(ci: CiSystem, level: log::Level) -> Option<&'static str> {
    match (ci, level) {
        (CiSystem::GitHubActions, log::Level::Error | log::Level::Warn) => Some("::error::"),
        (CiSystem::GitHubActions, log::Level::Info) => Some("::warning::"),
        (CiSystem::GitHubActions, log::Level::Debug | log::Level::Trace) => Some("::debug::"),
        (CiSystem::AzurePipelines, log::Level::Error | log::Level::Warn) => Some("##vso[task.logissue type=error]"),
        (CiSystem::AzurePipelines, log::Level::Info) => Some("##vso[task.logissue type=warning]"),
        (CiSystem::AzurePipelines, log::Level::Debug | log::Level::Trace) => Some("##[debug]"),
        (CiSystem::Local, _) => None,
    }
}

fn escape_annotation(message: &str) -> String {
    message.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Installs the global logger. Defaults to info level; `RUST_LOG` overrides.
/// On a CI system the non-info levels are emitted as workflow commands so they
/// show up as annotations on the run.
pub fn init_logging(ci: CiSystem) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if ci != CiSystem::Local {
        builder.format(move |buf, record| match annotation_prefix(ci, record.level()) {
            Some(prefix) => writeln!(buf, "{}{}", prefix, escape_annotation(&record.args().to_string())),
            None => writeln!(buf, "{}", record.args()),
        });
    }
    builder.init();
}

/// Publishes a step output. On GitHub the output file from the environment is
/// preferred; runners too old to set it get the legacy workflow command.
pub fn emit_output(ci: CiSystem, name: &str, value: &str) {
    match ci {
        CiSystem::GitHubActions => {
            if let Ok(path) = std::env::var("GITHUB_OUTPUT") {
                match append_line(&path, &format!("{}={}", name, value)) {
                    Ok(()) => return,
                    Err(err) => log::warn!("Could not write to GITHUB_OUTPUT file '{}': {}", path, err),
                }
            }
            println!("{}", legacy_output_line(ci, name, value));
        }
        CiSystem::AzurePipelines => println!("{}", legacy_output_line(ci, name, value)),
        CiSystem::Local => log::info!("Output '{}': {}", name, value),
    }
}

fn legacy_output_line(ci: CiSystem, name: &str, value: &str) -> String {
    match ci {
        CiSystem::GitHubActions => format!("::set-output name={}::{}", name, value),
        CiSystem::AzurePipelines => format!("##vso[task.setvariable variable={};isOutput=true]{}", name, value),
        CiSystem::Local => format!("{}={}", name, value),
    }
}

fn append_line(path: &str, line: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new().append(true).open(path)?;
    writeln!(file, "{}", line)
}
