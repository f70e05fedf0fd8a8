// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ActionError, ActionResult};
use fnaction_api::credentials::Credentials;
use fnaction_api::schedules::ScheduleSpec;

pub const DEFAULT_DEPLOY_TIMEOUT: Duration = Duration::from_secs(1500);
pub const DEFAULT_COMMON_FOLDER: &str = "common";
pub const MAX_METADATA_KEY_LEN: usize = 32;
pub const MAX_METADATA_VALUE_LEN: usize = 500;
pub const MAX_OWNER_LEN: usize = 128;

/// One row of the input table: the environment variable (without the CI
/// prefix) and whether the run can proceed without it.
struct InputSpec {
    name: &'static str,
    required: bool,
}

const INPUTS: &[InputSpec] = &[
    InputSpec { name: "function_external_id", required: true },
    InputSpec { name: "function_folder", required: true },
    InputSpec { name: "function_file", required: true },
    InputSpec { name: "project", required: true },
    InputSpec { name: "cluster", required: true },
    InputSpec { name: "deployment_client_id", required: true },
    InputSpec { name: "deployment_client_secret", required: true },
    InputSpec { name: "deployment_tenant_id", required: true },
    InputSpec { name: "common_folder", required: false },
    InputSpec { name: "function_secrets", required: false },
    InputSpec { name: "schedule_file", required: false },
    InputSpec { name: "schedules_client_id", required: false },
    InputSpec { name: "schedules_client_secret", required: false },
    InputSpec { name: "schedules_tenant_id", required: false },
    InputSpec { name: "data_set_id", required: false },
    InputSpec { name: "cpu", required: false },
    InputSpec { name: "memory", required: false },
    InputSpec { name: "metadata", required: false },
    InputSpec { name: "owner", required: false },
    InputSpec { name: "description", required: false },
    InputSpec { name: "deploy_timeout", required: false },
    InputSpec { name: "remove_only", required: false },
    InputSpec { name: "remove_schedules", required: false },
    InputSpec { name: "post_deploy_cleanup", required: false },
    InputSpec { name: "await_deployment_success", required: false },
];

/// Snapshot of the process environment, keyed case-insensitively. Both
/// supported CI systems pass action inputs as `INPUT_<NAME>`; missing inputs
/// arrive as empty strings, which are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.to_uppercase(), v)).collect(),
        }
    }

    pub fn input(&self, name: &str) -> Option<&str> {
        self.vars
            .get(&format!("INPUT_{}", name.to_uppercase()))
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
            .map(str::trim)
    }

    /// Checks every required row of the input table up front and reports all
    /// missing variables in one error.
    pub fn check_required(&self) -> ActionResult<()> {
        let missing: Vec<&str> = INPUTS
            .iter()
            .filter(|spec| spec.required && self.input(spec.name).is_none())
            .map(|spec| spec.name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ActionError::config(format!("missing required input(s): {}", missing.join(", "))))
        }
    }
}

fn parse_bool(env: &EnvSource, name: &str, default: bool) -> ActionResult<bool> {
    match env.input(name) {
        None => Ok(default),
        Some(raw) => match raw.to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ActionError::config(format!("input '{}' must be 'true' or 'false', got '{}'", name, other))),
        },
    }
}

fn parse_non_negative_float(env: &EnvSource, name: &str) -> ActionResult<Option<f64>> {
    match env.input(name) {
        None => Ok(None),
        Some(raw) => {
            let value = f64::from_str(raw).map_err(|_| ActionError::config(format!("input '{}' is not a number: '{}'", name, raw)))?;
            if value < 0.0 {
                return Err(ActionError::config(format!("input '{}' must be non-negative, got {}", name, value)));
            }
            Ok(Some(value))
        }
    }
}

/// Entry file: word characters, hyphens or spaces per path segment, forward
/// slashes only, restricted extension. Rejects absolute paths, empty
/// segments, backslashes and anything that could traverse out of the folder.
pub fn validate_entry_file(file: &str) -> ActionResult<()> {
    let pattern = regex::Regex::new(r"^[\w\- ]+(/[\w\- ]+)*\.(py|js)$").unwrap();
    if pattern.is_match(file) {
        Ok(())
    } else {
        Err(ActionError::config(format!(
            "invalid function file '{}': must be a relative path of word characters, hyphens or spaces ending in .py or .js",
            file
        )))
    }
}

pub fn validate_schedule_file_name(file: &str) -> ActionResult<()> {
    let pattern = regex::Regex::new(r"^[\w\- ]+(/[\w\- ]+)*\.ya?ml$").unwrap();
    if pattern.is_match(file) {
        Ok(())
    } else {
        Err(ActionError::config(format!("invalid schedule file '{}': must be a relative .yaml/.yml path", file)))
    }
}

/// Standard 5-field cron. The `cron` crate wants a seconds field, so one is
/// prepended for validation only; the expression is sent upstream verbatim.
pub fn validate_cron(expression: &str) -> ActionResult<()> {
    if expression.split_whitespace().count() != 5 {
        return Err(ActionError::config(format!("invalid cron expression '{}': expected 5 fields", expression)));
    }
    cron::Schedule::from_str(&format!("0 {}", expression))
        .map(|_| ())
        .map_err(|e| ActionError::config(format!("invalid cron expression '{}': {}", expression, e)))
}

pub fn decode_secrets(raw: &str) -> ActionResult<HashMap<String, String>> {
    use base64::Engine;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(raw)
        .map_err(|_| ActionError::config("invalid secret, must be a valid base64 encoded JSON object".to_string()))?;
    serde_json::from_slice(&decoded)
        .map_err(|_| ActionError::config("invalid secret, must be a valid base64 encoded JSON object".to_string()))
}

pub fn parse_metadata(raw: &str) -> ActionResult<HashMap<String, String>> {
    let metadata: HashMap<String, String> =
        serde_json::from_str(raw).map_err(|e| ActionError::config(format!("metadata is not a JSON object of strings: {}", e)))?;
    for (key, value) in &metadata {
        // Bounds are in characters, not bytes.
        if key.chars().count() > MAX_METADATA_KEY_LEN {
            return Err(ActionError::config(format!(
                "metadata key '{}' exceeds {} characters",
                key, MAX_METADATA_KEY_LEN
            )));
        }
        if value.chars().count() > MAX_METADATA_VALUE_LEN {
            return Err(ActionError::config(format!(
                "metadata value for key '{}' exceeds {} characters",
                key, MAX_METADATA_VALUE_LEN
            )));
        }
    }
    Ok(metadata)
}

fn verify_directory(path: &Path, input: &str) -> ActionResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ActionError::config(format!("invalid folder path for '{}': '{}', not a directory", input, path.display())))
    }
}

/// The validated deployment request. Immutable once built; constructed once
/// per run from the environment.
#[derive(Debug, Clone)]
pub struct FunctionConfig {
    pub external_id: String,
    pub folder: PathBuf,
    pub file: String,
    pub common_folder: Option<PathBuf>,
    pub secrets: Option<HashMap<String, String>>,
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub data_set_id: Option<i64>,
    pub metadata: HashMap<String, String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub deploy_timeout: Duration,
    pub await_deployment_success: bool,
    pub post_deploy_cleanup: bool,
    pub remove_schedules: bool,
}

impl FunctionConfig {
    pub fn from_env(env: &EnvSource) -> ActionResult<Self> {
        env.check_required()?;

        let external_id = env.input("function_external_id").unwrap().to_string();
        let folder = PathBuf::from(env.input("function_folder").unwrap());
        verify_directory(&folder, "function_folder")?;

        let file = env.input("function_file").unwrap().to_string();
        validate_entry_file(&file)?;
        if !folder.join(&file).is_file() {
            return Err(ActionError::config(format!(
                "function file '{}' not found under '{}'",
                file,
                folder.display()
            )));
        }

        let common_folder = match env.input("common_folder") {
            Some(given) => {
                let path = PathBuf::from(given);
                verify_directory(&path, "common_folder")?;
                Some(path)
            }
            // Fall back to the conventional 'common/' sibling when present.
            None => Some(PathBuf::from(DEFAULT_COMMON_FOLDER)).filter(|p| p.is_dir()),
        };

        let secrets = env.input("function_secrets").map(decode_secrets).transpose()?;
        let metadata = env.input("metadata").map(parse_metadata).transpose()?.unwrap_or_default();

        let owner = env.input("owner").map(str::to_string);
        if let Some(owner) = &owner {
            if owner.len() > MAX_OWNER_LEN {
                return Err(ActionError::config(format!("owner exceeds {} characters", MAX_OWNER_LEN)));
            }
        }

        let data_set_id = env
            .input("data_set_id")
            .map(|raw| i64::from_str(raw).map_err(|_| ActionError::config(format!("data_set_id is not an integer: '{}'", raw))))
            .transpose()?;

        let deploy_timeout = match env.input("deploy_timeout") {
            None => DEFAULT_DEPLOY_TIMEOUT,
            Some(raw) => Duration::from_secs(
                u64::from_str(raw).map_err(|_| ActionError::config(format!("deploy_timeout is not a non-negative integer: '{}'", raw)))?,
            ),
        };

        let remove_only = parse_bool(env, "remove_only", false)?;
        let remove_schedules = parse_bool(env, "remove_schedules", true)?;
        if remove_only && !remove_schedules {
            return Err(ActionError::config(
                "remove_only removes all schedules, which contradicts remove_schedules=false".to_string(),
            ));
        }

        Ok(Self {
            external_id,
            folder,
            file,
            common_folder,
            secrets,
            cpu: parse_non_negative_float(env, "cpu")?,
            memory: parse_non_negative_float(env, "memory")?,
            data_set_id,
            metadata,
            owner,
            description: env.input("description").map(str::to_string),
            deploy_timeout,
            await_deployment_success: parse_bool(env, "await_deployment_success", true)?,
            post_deploy_cleanup: parse_bool(env, "post_deploy_cleanup", false)?,
            remove_schedules,
        })
    }

    /// Forward-slash is not allowed in remote file names.
    pub fn archive_name(&self) -> String {
        archive_name(&self.external_id)
    }

    pub fn create_request(&self, file_id: i64) -> fnaction_api::function::CreateFunctionRequest {
        fnaction_api::function::CreateFunctionRequest {
            external_id: self.external_id.clone(),
            name: self.external_id.clone(),
            file_id,
            function_path: self.file.clone(),
            owner: self.owner.clone(),
            description: self.description.clone(),
            secrets: self.secrets.clone(),
            cpu: self.cpu,
            memory: self.memory,
            metadata: self.metadata.clone(),
        }
    }
}

pub fn archive_name(external_id: &str) -> String {
    format!("{}.zip", external_id.replace('/', "-"))
}

/// The short-circuit configuration: when `remove_only` is set the run stops
/// after tearing the function (and its schedules) down.
#[derive(Debug, Clone)]
pub struct DeleteConfig {
    pub remove_only: bool,
    pub external_id: String,
}

impl DeleteConfig {
    pub fn from_env(env: &EnvSource) -> ActionResult<Self> {
        let external_id = env
            .input("function_external_id")
            .ok_or_else(|| ActionError::config("missing required input(s): function_external_id".to_string()))?
            .to_string();
        Ok(Self {
            remove_only: parse_bool(env, "remove_only", false)?,
            external_id,
        })
    }
}

pub fn deploy_credentials(env: &EnvSource) -> ActionResult<Credentials> {
    env.check_required()?;
    Ok(Credentials {
        client_id: env.input("deployment_client_id").unwrap().to_string(),
        client_secret: env.input("deployment_client_secret").unwrap().to_string(),
        tenant_id: env.input("deployment_tenant_id").unwrap().to_string(),
        cluster: env.input("cluster").unwrap().to_string(),
        project: env.input("project").unwrap().to_string(),
    })
}

/// Zero or more declarative cron attachments plus the runtime credential the
/// service will invoke the function with.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub schedules: Vec<ScheduleSpec>,
    pub credentials: Option<Credentials>,
}

impl ScheduleConfig {
    /// A missing or unreadable schedule file is a warning and "no schedules",
    /// never fatal; an existing file with bad cron syntax is a config error.
    pub fn from_env(env: &EnvSource, function: &FunctionConfig) -> ActionResult<Self> {
        let file = match env.input("schedule_file") {
            None => return Ok(Self { schedules: vec![], credentials: None }),
            Some(file) => file.to_string(),
        };
        validate_schedule_file_name(&file)?;

        let path = function.folder.join(&file);
        if !path.is_file() {
            log::warn!("Ignoring given schedule file '{}', path does not exist: {}", file, path.display());
            return Ok(Self { schedules: vec![], credentials: None });
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| ActionError::config(format!("cannot read '{}': {}", path.display(), e)))?;
        let schedules = parse_schedule_file(&raw, &function.external_id)?;
        if schedules.is_empty() {
            return Ok(Self { schedules, credentials: None });
        }

        // Schedules run under their own credential; required once any exist.
        let (client_id, client_secret) = match (env.input("schedules_client_id"), env.input("schedules_client_secret")) {
            (Some(id), Some(secret)) => (id.to_string(), secret.to_string()),
            _ => {
                return Err(ActionError::config(
                    "schedules require runtime client credentials: missing one or both of \
                     ['schedules_client_id', 'schedules_client_secret']"
                        .to_string(),
                ))
            }
        };
        let credentials = Credentials {
            client_id,
            client_secret,
            tenant_id: env
                .input("schedules_tenant_id")
                .or_else(|| env.input("deployment_tenant_id"))
                .unwrap_or_default()
                .to_string(),
            cluster: env.input("cluster").unwrap_or_default().to_string(),
            project: env.input("project").unwrap_or_default().to_string(),
        };
        Ok(Self {
            schedules,
            credentials: Some(credentials),
        })
    }
}

#[derive(Debug, serde::Deserialize)]
struct RawSchedule {
    name: Option<String>,
    cron: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Parses the YAML sequence and scopes every schedule name with the
/// function's external id so that equally-named schedules on different
/// functions never collide.
pub fn parse_schedule_file(raw: &str, external_id: &str) -> ActionResult<Vec<ScheduleSpec>> {
    let parsed: Vec<RawSchedule> = match serde_yaml::from_str(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Schedule file could not be parsed, continuing without schedules: {}", e);
            return Ok(vec![]);
        }
    };
    parsed
        .into_iter()
        .enumerate()
        .map(|(i, schedule)| {
            validate_cron(&schedule.cron)?;
            let name = schedule.name.unwrap_or_else(|| format!("undefined-{}", i));
            Ok(ScheduleSpec {
                name: format!("{}:{}", external_id, name),
                cron: schedule.cron,
                data: schedule.data,
            })
        })
        .collect()
}
