use crate::domain::models::{ActivityCategory, CostType};
use crate::infrastructure::error::InfraError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const STORE_JSON: &str = "store.json";
const DEFAULT_CREDENTIAL_ACCOUNT: &str = "default";

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigBundle {
    pub app: serde_json::Value,
    pub store: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Memory,
    Sqlite,
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreSettings {
    pub kind: StoreKind,
    pub endpoint: Option<String>,
    pub credential_account: String,
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([
        (
            APP_JSON,
            serde_json::json!({
                "schema": 1,
                "appName": "Activity Calendar",
                "timezone": "UTC",
                "costTypes": ["Transportation", "Meals", "Accommodation", "Other"],
                "categories": ["vacation", "sick", "education", "business"]
            }),
        ),
        (
            STORE_JSON,
            serde_json::json!({
                "schema": 1,
                "kind": "sqlite",
                "endpoint": null,
                "credentialAccount": DEFAULT_CREDENTIAL_ACCOUNT
            }),
        ),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_configs(config_dir: &Path) -> Result<ConfigBundle, InfraError> {
    Ok(ConfigBundle {
        app: read_config(&config_dir.join(APP_JSON))?,
        store: read_config(&config_dir.join(STORE_JSON))?,
    })
}

fn read_string_list(value: &serde_json::Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(serde_json::Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Display time zone; UTC when the config leaves it blank.
pub fn read_timezone(config_dir: &Path) -> Result<Tz, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let Some(name) = app
        .get("timezone")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
    else {
        return Ok(Tz::UTC);
    };
    name.parse::<Tz>()
        .map_err(|error| InfraError::InvalidConfig(format!("invalid timezone '{name}': {error}")))
}

pub fn read_cost_types(config_dir: &Path) -> Result<Vec<CostType>, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let configured = read_string_list(&app, "costTypes");
    if configured.is_empty() {
        return Ok(CostType::STANDARD.to_vec());
    }
    Ok(configured.into_iter().map(CostType::from).collect())
}

pub fn read_categories(config_dir: &Path) -> Result<Vec<ActivityCategory>, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    Ok(read_string_list(&app, "categories")
        .into_iter()
        .map(ActivityCategory::from)
        .collect())
}

pub fn read_store_settings(config_dir: &Path) -> Result<StoreSettings, InfraError> {
    let path = config_dir.join(STORE_JSON);
    let store = read_config(&path)?;
    let kind = match store
        .get("kind")
        .and_then(serde_json::Value::as_str)
        .map(|value| value.trim().to_ascii_lowercase())
        .as_deref()
    {
        None | Some("") | Some("sqlite") => StoreKind::Sqlite,
        Some("memory") => StoreKind::Memory,
        Some("rest") => StoreKind::Rest,
        Some(other) => {
            return Err(InfraError::InvalidConfig(format!(
                "unsupported store kind '{other}' in {}",
                path.display()
            )));
        }
    };
    let endpoint = store
        .get("endpoint")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);
    if kind == StoreKind::Rest && endpoint.is_none() {
        return Err(InfraError::InvalidConfig(format!(
            "store endpoint is required for the rest store in {}",
            path.display()
        )));
    }
    let credential_account = store
        .get("credentialAccount")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_CREDENTIAL_ACCOUNT)
        .to_string();

    Ok(StoreSettings {
        kind,
        endpoint,
        credential_account,
    })
}

pub fn save_store_settings(config_dir: &Path, settings: &StoreSettings) -> Result<(), InfraError> {
    let path = config_dir.join(STORE_JSON);
    let mut store = read_config(&path)?;
    let object = store.as_object_mut().ok_or_else(|| {
        InfraError::InvalidConfig(format!("invalid object structure in {}", path.display()))
    })?;
    object.insert("kind".to_string(), serde_json::to_value(settings.kind)?);
    object.insert(
        "endpoint".to_string(),
        settings
            .endpoint
            .as_deref()
            .map(|value| serde_json::Value::String(value.to_string()))
            .unwrap_or(serde_json::Value::Null),
    );
    object.insert(
        "credentialAccount".to_string(),
        serde_json::Value::String(settings.credential_account.clone()),
    );

    let formatted = serde_json::to_string_pretty(&store)?;
    fs::write(path, format!("{formatted}\n"))?;
    Ok(())
}
