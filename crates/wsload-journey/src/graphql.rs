//! GraphQL documents and payload builders for the lifecycle operations
//!
//! Every builder returns a serialized `{query, variables}` body ready to be
//! wrapped in a `RequestDescriptor`.

use serde::Serialize;
use serde_json::json;

/// JSON pointer to the workspace id in a successful `CreateProject` response
pub const CREATED_PROJECT_ID: &str = "/data/createProject/id";

const CREATE_PROJECT: &str = "mutation CreateProject($input: CreateProjectInput!) {
    createProject(input: $input) { id name __typename }
}";

const UPDATE_PROJECT_CONFIGURATION: &str =
    "mutation UpdateProjectConfiguration($input: UpdateProjectConfigurationInput!) {
    updateProjectConfiguration(input: $input) { projectId features __typename }
}";

const CREATE_TABLE: &str = "mutation CreateTable($input: CreateTableInput!) {
    createTable(input: $input) { id name __typename }
}";

const ADD_RECORDS: &str = "mutation AddRecords($input: AddRecordsInput!) {
    addRecords(input: $input) { id __typename }
}";

const GET_RECORDS: &str = "query GetRecords($input: GetRecordsInput!) {
    getRecords(input: $input) { records __typename }
}";

const REMOVE_TABLE: &str = "mutation RemoveTable($input: GetEntityInput!) {
    removeTable(input: $input)
}";

const DELETE_PROJECT: &str = "mutation DeleteProject($id: String!) {
    deleteOrganization(id: $id) { id __typename }
}";

/// One field of a record row
#[derive(Debug, Clone, Serialize)]
pub struct RecordField {
    pub key: String,
    pub value: String,
}

/// The single-row payload every journey inserts
pub fn default_records() -> Vec<Vec<RecordField>> {
    vec![vec![RecordField {
        key: "title".to_string(),
        value: "Test Record 1".to_string(),
    }]]
}

pub fn create_project(workspace_name: &str) -> String {
    json!({
        "query": CREATE_PROJECT,
        "variables": {
            "input": {
                "name": workspace_name,
                "slug": workspace_name,
                "type": "organization",
            }
        }
    })
    .to_string()
}

pub fn promote_to_enterprise(workspace_id: &str) -> String {
    json!({
        "query": UPDATE_PROJECT_CONFIGURATION,
        "variables": {
            "input": {
                "projectId": workspace_id,
                "type": "enterprise",
            }
        }
    })
    .to_string()
}

/// Flips the trash feature on so the workspace can be deleted
pub fn enable_trash_feature(workspace_id: &str) -> String {
    json!({
        "query": UPDATE_PROJECT_CONFIGURATION,
        "variables": {
            "input": {
                "projectId": workspace_id,
                "features": { "useTrashFeature": true },
            }
        }
    })
    .to_string()
}

pub fn create_table(workspace_id: &str, table_name: &str) -> String {
    json!({
        "query": CREATE_TABLE,
        "variables": {
            "input": {
                "clientId": workspace_id,
                "name": table_name,
                "schema": {
                    "fields": [ { "name": "title", "type": "string" } ]
                },
            }
        }
    })
    .to_string()
}

pub fn add_records(workspace_id: &str, table_name: &str, records: &[Vec<RecordField>]) -> String {
    json!({
        "query": ADD_RECORDS,
        "variables": {
            "input": {
                "clientId": workspace_id,
                "tableId": table_name,
                "records": records,
            }
        }
    })
    .to_string()
}

pub fn get_records(workspace_id: &str, table_name: &str) -> String {
    json!({
        "query": GET_RECORDS,
        "variables": {
            "input": {
                "clientId": workspace_id,
                "tableId": table_name,
            }
        }
    })
    .to_string()
}

pub fn remove_table(workspace_id: &str, table_name: &str) -> String {
    json!({
        "query": REMOVE_TABLE,
        "variables": {
            "input": {
                "clientId": workspace_id,
                "id": table_name,
            }
        }
    })
    .to_string()
}

pub fn delete_project(workspace_id: &str) -> String {
    json!({
        "query": DELETE_PROJECT,
        "variables": { "id": workspace_id }
    })
    .to_string()
}
