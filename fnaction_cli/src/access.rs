// SPDX-License-Identifier: MIT

use crate::error::{ActionError, ActionResult, MissingCapabilityReport};
use fnaction_api::iam::Group;

const ACL_PROJECT_LIST: &str = "projectsAcl:LIST (scope: 'all')";
const ACL_GROUPS_LIST: &str = "groupsAcl:LIST (scope: 'all' OR 'currentuserscope')";
const MISSING_MORE_HINT: &str = "(There might be more missing, but the above-mentioned are needed first to check!)";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
    Create,
    List,
    Owner,
    Other(String),
}

impl Action {
    fn parse(raw: &str) -> Self {
        match raw {
            "READ" => Action::Read,
            "WRITE" => Action::Write,
            "CREATE" => Action::Create,
            "LIST" => Action::List,
            "OWNER" => Action::Owner,
            other => Action::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Read => write!(fmt, "READ"),
            Action::Write => write!(fmt, "WRITE"),
            Action::Create => write!(fmt, "CREATE"),
            Action::List => write!(fmt, "LIST"),
            Action::Owner => write!(fmt, "OWNER"),
            Action::Other(raw) => write!(fmt, "{}", raw),
        }
    }
}

/// Permission domains the deployment cares about. One variant per ACL kind,
/// parsed explicitly from the wire name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclKind {
    Projects,
    Groups,
    Functions,
    Sessions,
    Files,
    Datasets,
    Other(String),
}

impl AclKind {
    fn parse(raw: &str) -> Self {
        match raw {
            "projectsAcl" => AclKind::Projects,
            "groupsAcl" => AclKind::Groups,
            "functionsAcl" => AclKind::Functions,
            "sessionsAcl" => AclKind::Sessions,
            "filesAcl" => AclKind::Files,
            "datasetsAcl" => AclKind::Datasets,
            other => AclKind::Other(other.to_string()),
        }
    }
}

/// The resource subset a capability applies to. A capability with an
/// unrecognized scope grants nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    CurrentUser,
    Dataset(Vec<i64>),
    Ids(Vec<i64>),
}

impl Scope {
    pub fn is_all(&self) -> bool {
        matches!(self, Scope::All)
    }

    pub fn covers_dataset(&self, id: i64) -> bool {
        matches!(self, Scope::Dataset(ids) if ids.contains(&id))
    }

    pub fn covers_id(&self, id: i64) -> bool {
        matches!(self, Scope::Ids(ids) if ids.contains(&id))
    }
}

/// A single granted permission record, parsed from the raw wire shape
/// `{"<kind>Acl": {"actions": [...], "scope": {...}}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Capability {
    pub kind: AclKind,
    pub actions: Vec<Action>,
    pub scope: Scope,
}

impl Capability {
    /// Returns `None` for records that do not parse or that are scoped to
    /// other projects; granting nothing is the safe reading of either.
    pub fn parse(raw: &serde_json::Value, project: &str) -> Option<Self> {
        let object = raw.as_object()?;

        if let Some(project_scope) = object.get("projectScope").and_then(|v| v.as_object()) {
            if let Some(projects) = project_scope.get("projects").and_then(|v| v.as_array()) {
                if !projects.iter().filter_map(|p| p.as_str()).any(|p| p == project) {
                    return None;
                }
            }
        }

        let (acl_name, body) = object.iter().find(|(key, _)| key.ends_with("Acl"))?;
        let body = body.as_object()?;
        let actions = body
            .get("actions")?
            .as_array()?
            .iter()
            .filter_map(|a| a.as_str())
            .map(Action::parse)
            .collect();
        let scope = parse_scope(body.get("scope")?)?;
        Some(Self {
            kind: AclKind::parse(acl_name),
            actions,
            scope,
        })
    }

    fn has_action(&self, action: &Action) -> bool {
        self.actions.contains(action)
    }
}

fn parse_scope(raw: &serde_json::Value) -> Option<Scope> {
    let object = raw.as_object()?;
    if object.contains_key("all") {
        return Some(Scope::All);
    }
    if object.contains_key("currentuserscope") {
        return Some(Scope::CurrentUser);
    }
    if let Some(dataset_scope) = object.get("datasetScope") {
        return Some(Scope::Dataset(parse_scope_ids(dataset_scope)));
    }
    if let Some(id_scope) = object.get("idScope").or_else(|| object.get("idscope")) {
        return Some(Scope::Ids(parse_scope_ids(id_scope)));
    }
    None
}

// The service serializes scope ids either as numbers or as decimal strings.
fn parse_scope_ids(raw: &serde_json::Value) -> Vec<i64> {
    raw.get("ids")
        .and_then(|v| v.as_array())
        .map(|ids| {
            ids.iter()
                .filter_map(|id| id.as_i64().or_else(|| id.as_str().and_then(|s| s.parse().ok())))
                .collect()
        })
        .unwrap_or_default()
}

pub fn parse_capabilities(groups: &[Group], project: &str) -> Vec<Capability> {
    groups
        .iter()
        .flat_map(|group| group.capabilities.iter())
        .filter_map(|raw| Capability::parse(raw, project))
        .collect()
}

fn capabilities_of(capabilities: &[Capability], kind: AclKind) -> impl Iterator<Item = &Capability> {
    capabilities.iter().filter(move |c| c.kind == kind)
}

/// Checks the two baseline list grants without which nothing else can even be
/// inspected, distinguishing "cannot authenticate at all" from "authenticated
/// but under-scoped".
pub async fn missing_basic_capabilities(api: &dyn fnaction_api::FunctionHostApi) -> Vec<String> {
    let inspection = match api.inspect_token().await {
        // Token inspection only fails when BOTH baseline grants are absent.
        Err(_) => return vec![ACL_PROJECT_LIST.to_string(), ACL_GROUPS_LIST.to_string(), MISSING_MORE_HINT.to_string()],
        Ok(inspection) => inspection,
    };
    if !inspection.projects.is_empty() && !inspection.capabilities.is_empty() {
        return vec![];
    }
    // One of the two is missing; listing groups tells us which.
    match api.list_groups().await {
        Ok(_) => vec![ACL_PROJECT_LIST.to_string(), MISSING_MORE_HINT.to_string()],
        Err(_) => vec![ACL_GROUPS_LIST.to_string(), MISSING_MORE_HINT.to_string()],
    }
}

/// The target project must be among the projects the credential is valid for.
pub async fn verify_project(api: &dyn fnaction_api::FunctionHostApi, project: &str, credential: &str) -> ActionResult<()> {
    let inspection = api.inspect_token().await?;
    if inspection.projects.iter().any(|p| p == project) {
        log::info!("{} credentials verified towards project '{}'!", capitalized(credential), project);
        Ok(())
    } else {
        Err(ActionError::config(format!(
            "{} credentials NOT verified towards given project '{}', only: {:?}",
            capitalized(credential),
            project,
            inspection.projects
        )))
    }
}

pub fn missing_function_capabilities(capabilities: &[Capability], required: &[Action]) -> Vec<String> {
    let granted: Vec<&Action> = capabilities_of(capabilities, AclKind::Functions)
        .flat_map(|c| c.actions.iter())
        .collect();
    required
        .iter()
        .filter(|action| !granted.contains(action))
        .map(|action| format!("functionsAcl:{} (scope: 'all')", action))
        .collect()
}

pub fn missing_session_capabilities(capabilities: &[Capability]) -> Vec<String> {
    let has_create = capabilities_of(capabilities, AclKind::Sessions).any(|c| c.has_action(&Action::Create));
    if has_create {
        vec![]
    } else {
        vec!["sessionsAcl:CREATE (scope: 'all')".to_string()]
    }
}

/// Files checks. Without a dataset the grants must be all-scope; with one,
/// dataset-scoped grants are also accepted, which in turn needs read access
/// to the dataset to resolve write protection (write-protected escalates the
/// requirement to OWNER).
pub async fn missing_files_capabilities(
    api: &dyn fnaction_api::FunctionHostApi,
    capabilities: &[Capability],
    data_set_id: Option<i64>,
) -> ActionResult<Vec<String>> {
    let required = [Action::Read, Action::Write];
    let all_scope_actions: Vec<&Action> = capabilities_of(capabilities, AclKind::Files)
        .filter(|c| c.scope.is_all())
        .flat_map(|c| c.actions.iter())
        .collect();
    let mut missing_files: Vec<&Action> = required.iter().filter(|a| !all_scope_actions.contains(a)).collect();

    let ds_id = match data_set_id {
        None => {
            return Ok(missing_files
                .iter()
                .map(|a| format!("filesAcl:{} (scope: 'all') (Tip: consider using a data set!)", a))
                .collect());
        }
        Some(ds_id) => ds_id,
    };

    let mut missing = vec![];
    let dataset_scope_actions: Vec<&Action> = capabilities_of(capabilities, AclKind::Files)
        .filter(|c| c.scope.covers_dataset(ds_id))
        .flat_map(|c| c.actions.iter())
        .collect();
    missing_files.retain(|a| !dataset_scope_actions.contains(a));
    missing.extend(
        missing_files
            .iter()
            .map(|a| format!("filesAcl:{} (scope: 'all' OR 'dataset: {}')", a, ds_id)),
    );

    let dataset_actions: Vec<&Action> = capabilities_of(capabilities, AclKind::Datasets)
        .filter(|c| c.scope.is_all() || c.scope.covers_id(ds_id))
        .flat_map(|c| c.actions.iter())
        .collect();
    if !dataset_actions.contains(&&Action::Read) {
        // Without read access we cannot even tell whether it is write protected.
        missing.push(format!("datasetsAcl:READ (scope: 'all' OR 'id: {}')", ds_id));
        if !dataset_actions.contains(&&Action::Owner) {
            missing.push("(If the data set is write protected, you will also need OWNER)".to_string());
        }
        return Ok(missing);
    }

    let dataset = api
        .retrieve_dataset(ds_id)
        .await?
        .ok_or_else(|| ActionError::config(format!("no data set exists with id: {}", ds_id)))?;
    if dataset.write_protected && !dataset_actions.contains(&&Action::Owner) {
        missing.push(format!(
            "datasetsAcl:OWNER (scope: 'all' OR 'id: {}'). NB: 'all' scope is not recommended!",
            ds_id
        ));
    }
    Ok(missing)
}

async fn check_basics_and_parse(
    api: &dyn fnaction_api::FunctionHostApi,
    project: &str,
    credential: &str,
) -> ActionResult<Vec<Capability>> {
    let missing_basic = missing_basic_capabilities(api).await;
    if !missing_basic.is_empty() {
        return Err(missing_error(credential, missing_basic));
    }
    verify_project(api, project, credential).await?;
    let groups = api.list_groups().await?;
    Ok(parse_capabilities(&groups, project))
}

/// Preflight for the deployment credential. Every domain is checked and every
/// missing grant is collected before failing, so the operator gets the whole
/// fix list in one run. Read-only remote calls only.
pub async fn verify_deploy_capabilities(
    api: &dyn fnaction_api::FunctionHostApi,
    project: &str,
    data_set_id: Option<i64>,
) -> ActionResult<()> {
    let credential = "deploy";
    let capabilities = check_basics_and_parse(api, project, credential).await?;

    let mut missing = missing_function_capabilities(&capabilities, &[Action::Read, Action::Write]);
    missing.extend(missing_session_capabilities(&capabilities));
    missing.extend(missing_files_capabilities(api, &capabilities, data_set_id).await?);
    if missing.is_empty() {
        log::info!("Deploy credentials capabilities verified!");
        Ok(())
    } else {
        Err(missing_error(credential, missing))
    }
}

/// Preflight for the schedule runtime credential: the service needs it to
/// write function calls and open sessions on the operator's behalf.
pub async fn verify_schedule_capabilities(api: &dyn fnaction_api::FunctionHostApi, project: &str) -> ActionResult<()> {
    let credential = "schedule";
    let capabilities = check_basics_and_parse(api, project, credential).await?;

    let mut missing = missing_function_capabilities(&capabilities, &[Action::Write]);
    missing.extend(missing_session_capabilities(&capabilities));
    if missing.is_empty() {
        log::info!("Schedule credentials capabilities verified!");
        Ok(())
    } else {
        Err(missing_error(credential, missing))
    }
}

fn missing_error(credential: &str, missing: Vec<String>) -> ActionError {
    ActionError::MissingCapabilities(MissingCapabilityReport {
        credential: credential.to_string(),
        missing,
    })
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
