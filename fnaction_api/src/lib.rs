// SPDX-License-Identifier: MIT

pub mod common;
pub mod credentials;
pub mod datasets;
pub mod files;
pub mod function;
pub mod http_impl;
pub mod iam;
pub mod schedules;

/// Everything a deployment run needs from the remote service, bundled so that
/// call sites can hold a single trait object.
pub trait FunctionHostApi:
    function::FunctionsApi + files::FilesApi + schedules::SchedulesApi + datasets::DatasetsApi + iam::IamApi + Sync + Send
{
}

impl<T> FunctionHostApi for T where
    T: function::FunctionsApi + files::FilesApi + schedules::SchedulesApi + datasets::DatasetsApi + iam::IamApi + Sync + Send
{
}
