use std::fmt::Debug;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::exception::CoreRsResult;
use crate::validate::Validator;

/// Reads a json file and validates the result before handing it out.
pub fn load_file<T>(path: &Path) -> CoreRsResult<T>
where
    T: DeserializeOwned + Validator,
{
    let json = fs::read_to_string(path).map_err(|err| {
        exception!(
            message = format!("failed to read file, path={}", path.to_string_lossy()),
            source = err
        )
    })?;
    let value: T = serde_json::from_str(&json).map_err(|err| {
        exception!(
            message = format!("failed to parse file, path={}", path.to_string_lossy()),
            source = err
        )
    })?;
    value.validate()?;
    Ok(value)
}

pub fn from_json<T>(json: &str) -> CoreRsResult<T>
where
    T: DeserializeOwned,
{
    serde_json::from_str(json)
        .map_err(|err| exception!(message = format!("failed to deserialize, json={json}"), source = err))
}

pub fn to_json<T>(object: &T) -> CoreRsResult<String>
where
    T: Serialize + Debug,
{
    serde_json::to_string(object).map_err(|err| {
        exception!(
            message = format!("failed to serialize, object={object:?}"),
            source = err
        )
    })
}
