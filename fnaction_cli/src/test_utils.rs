// SPDX-License-Identifier: MIT

//! Handwritten in-memory implementation of the remote service for unit tests,
//! with a per-call event log and knobs for injecting failures.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use fnaction_api::common::{ApiError, ApiResult};
use fnaction_api::datasets::Dataset;
use fnaction_api::files::FileHandle;
use fnaction_api::function::{CreateFunctionRequest, Function, FunctionError, FunctionLimits, FunctionStatus, LimitRange};
use fnaction_api::iam::{Group, TokenInspection};
use fnaction_api::schedules::{ScheduleHandle, ScheduleSpec};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateFunction(String),
    DeleteFunction(String),
    DeleteFunctionById(i64),
    UploadFile(String),
    DeleteFile(String),
    CreateSchedule(String),
    DeleteSchedule(i64),
}

pub struct MockState {
    pub functions: HashMap<String, Function>,
    pub files: HashMap<String, FileHandle>,
    pub datasets: HashMap<i64, Dataset>,
    pub schedules: Vec<ScheduleHandle>,
    pub groups: Vec<Group>,
    pub token: Option<TokenInspection>,
    pub limits: FunctionLimits,
    pub calls: Vec<Call>,
    /// Errors returned by successive `create_function` calls before any succeeds.
    pub create_function_errors: VecDeque<ApiError>,
    /// Statuses applied on successive `retrieve_function_by_id` polls.
    pub status_sequence: VecDeque<FunctionStatus>,
    /// Error details attached once a polled function turns `Failed`.
    pub failure: Option<FunctionError>,
    /// When set, every `delete_file` fails with a clone of this error.
    pub delete_file_error: Option<ApiError>,
    /// When set, `list_groups` fails.
    pub groups_error: Option<ApiError>,
    /// The `uploaded` flag stays false for this many `retrieve_file_by_id` polls.
    pub upload_ready_after: u32,
    file_polls: u32,
    next_id: i64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            functions: HashMap::new(),
            files: HashMap::new(),
            datasets: HashMap::new(),
            schedules: Vec::new(),
            groups: Vec::new(),
            token: None,
            limits: FunctionLimits {
                cpu: LimitRange { min: 0.1, max: 1.0 },
                memory: LimitRange { min: 0.1, max: 2.5 },
            },
            calls: Vec::new(),
            create_function_errors: VecDeque::new(),
            status_sequence: VecDeque::new(),
            failure: None,
            delete_file_error: None,
            groups_error: None,
            upload_ready_after: 0,
            file_polls: 0,
            next_id: 1000,
        }
    }
}

impl MockState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MockApi {
    pub state: Mutex<MockState>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn insert_function(&self, external_id: &str, status: FunctionStatus) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.functions.insert(
            external_id.to_string(),
            Function {
                id,
                external_id: external_id.to_string(),
                status,
                error: None,
            },
        );
        id
    }

    pub fn insert_file(&self, external_id: &str, data_set_id: Option<i64>) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.files.insert(
            external_id.to_string(),
            FileHandle {
                id,
                external_id: external_id.to_string(),
                uploaded: true,
                data_set_id,
            },
        );
        id
    }
}

#[async_trait::async_trait]
impl fnaction_api::function::FunctionsApi for MockApi {
    async fn create_function(&self, request: CreateFunctionRequest) -> ApiResult<Function> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateFunction(request.external_id.clone()));
        if let Some(err) = state.create_function_errors.pop_front() {
            return Err(err);
        }
        if state.functions.contains_key(&request.external_id) {
            return Err(ApiError::status(
                409,
                format!("function with external id '{}' already exists", request.external_id),
            ));
        }
        let id = state.next_id();
        let function = Function {
            id,
            external_id: request.external_id.clone(),
            status: FunctionStatus::Queued,
            error: None,
        };
        state.functions.insert(request.external_id, function.clone());
        Ok(function)
    }

    async fn retrieve_function(&self, external_id: &str) -> ApiResult<Option<Function>> {
        Ok(self.state.lock().unwrap().functions.get(external_id).cloned())
    }

    async fn retrieve_function_by_id(&self, id: i64) -> ApiResult<Function> {
        let mut state = self.state.lock().unwrap();
        let next_status = state.status_sequence.pop_front();
        let failure = state.failure.clone();
        let function = state
            .functions
            .values_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ApiError::status(404, format!("function {} not found", id)))?;
        if let Some(status) = next_status {
            if status == FunctionStatus::Failed {
                function.error = failure;
            }
            function.status = status;
        }
        Ok(function.clone())
    }

    async fn delete_function(&self, external_id: &str) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteFunction(external_id.to_string()));
        state
            .functions
            .remove(external_id)
            .map(|_| ())
            .ok_or_else(|| ApiError::status(404, format!("function '{}' not found", external_id)))
    }

    async fn delete_function_by_id(&self, id: i64) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteFunctionById(id));
        let external_id = state.functions.values().find(|f| f.id == id).map(|f| f.external_id.clone());
        match external_id {
            Some(external_id) => {
                state.functions.remove(&external_id);
                Ok(())
            }
            None => Err(ApiError::status(404, format!("function {} not found", id))),
        }
    }

    async fn function_limits(&self) -> ApiResult<FunctionLimits> {
        Ok(self.state.lock().unwrap().limits)
    }
}

#[async_trait::async_trait]
impl fnaction_api::files::FilesApi for MockApi {
    async fn upload_file(&self, _bytes: Vec<u8>, name: &str, data_set_id: Option<i64>) -> ApiResult<FileHandle> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::UploadFile(name.to_string()));
        state.file_polls = 0;
        let id = state.next_id();
        let handle = FileHandle {
            id,
            external_id: name.to_string(),
            uploaded: state.upload_ready_after == 0,
            data_set_id,
        };
        state.files.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    async fn retrieve_file(&self, external_id: &str) -> ApiResult<Option<FileHandle>> {
        Ok(self.state.lock().unwrap().files.get(external_id).cloned())
    }

    async fn retrieve_file_by_id(&self, id: i64) -> ApiResult<FileHandle> {
        let mut state = self.state.lock().unwrap();
        state.file_polls += 1;
        let uploaded = state.file_polls > state.upload_ready_after;
        let file = state
            .files
            .values_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ApiError::status(404, format!("file {} not found", id)))?;
        file.uploaded = uploaded;
        Ok(file.clone())
    }

    async fn delete_file(&self, external_id: &str) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteFile(external_id.to_string()));
        if let Some(err) = state.delete_file_error.clone() {
            return Err(err);
        }
        state
            .files
            .remove(external_id)
            .map(|_| ())
            .ok_or_else(|| ApiError::status(404, format!("file '{}' not found", external_id)))
    }
}

#[async_trait::async_trait]
impl fnaction_api::schedules::SchedulesApi for MockApi {
    async fn create_schedule(
        &self,
        function_id: i64,
        _credentials: &fnaction_api::credentials::ClientCredentials,
        spec: &ScheduleSpec,
    ) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateSchedule(spec.name.clone()));
        let function_external_id = state
            .functions
            .values()
            .find(|f| f.id == function_id)
            .map(|f| f.external_id.clone())
            .ok_or_else(|| ApiError::status(404, format!("function {} not found", function_id)))?;
        let id = state.next_id();
        state.schedules.push(ScheduleHandle {
            id,
            name: spec.name.clone(),
            cron: spec.cron.clone(),
            function_external_id,
        });
        Ok(())
    }

    async fn list_schedules(&self, function_external_id: &str) -> ApiResult<Vec<ScheduleHandle>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .schedules
            .iter()
            .filter(|s| s.function_external_id == function_external_id)
            .cloned()
            .collect())
    }

    async fn delete_schedule(&self, id: i64) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteSchedule(id));
        let before = state.schedules.len();
        state.schedules.retain(|s| s.id != id);
        if state.schedules.len() < before {
            Ok(())
        } else {
            Err(ApiError::status(404, format!("schedule {} not found", id)))
        }
    }
}

#[async_trait::async_trait]
impl fnaction_api::datasets::DatasetsApi for MockApi {
    async fn retrieve_dataset(&self, id: i64) -> ApiResult<Option<Dataset>> {
        Ok(self.state.lock().unwrap().datasets.get(&id).cloned())
    }
}

#[async_trait::async_trait]
impl fnaction_api::iam::IamApi for MockApi {
    async fn inspect_token(&self) -> ApiResult<TokenInspection> {
        self.state
            .lock()
            .unwrap()
            .token
            .clone()
            .ok_or_else(|| ApiError::status(401, "Unauthorized".to_string()))
    }

    async fn list_groups(&self) -> ApiResult<Vec<Group>> {
        let state = self.state.lock().unwrap();
        if let Some(err) = state.groups_error.clone() {
            return Err(err);
        }
        Ok(state.groups.clone())
    }
}
