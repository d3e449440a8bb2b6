// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: device  -  remote build target lookup
//
//  devices.json is written by the IDE and keyed by platform, then by device
//  name. Two irregularities are kept as explicit special cases:
//
//    android   the device table sits one level deeper, under "Auto"
//    ios       the device names a host Mac (`hostmac`) whose record in the
//              "mac" table supplies the connection fields
//
//  Table order is file order (serde_json `preserve_order`), so "first
//  device" is whatever the config author listed first.
// ─────────────────────────────────────────────────────────────────────────────

use std::path::Path;

use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, RubberError};
use crate::platform::Platform;

pub const DEVICES_FILE: &str = "devices.json";

/// One device entry. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    pub displayname:        String,
    #[serde(rename = "productType")]
    pub product_type:       String,
    pub version:            String,
    pub device:             String,
    #[serde(rename = "type")]
    pub kind:               String,
    pub status:             String,
    pub hostmac:            String,
    #[serde(rename = "deviceIP")]
    pub device_ip:          String,
    pub target_ip:          String,
    pub hostname:           String,
    pub username:           String,
    pub encrypted_password: String,
    pub install_dir:        String,
}

impl DeviceRecord {
    fn from_value(value: &Value) -> Self {
        let field = |key: &str| match value.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        DeviceRecord {
            displayname:        field("displayname"),
            product_type:       field("productType"),
            version:            field("version"),
            device:             field("device"),
            kind:               field("type"),
            status:             field("status"),
            hostmac:            field("hostmac"),
            device_ip:          field("deviceIP"),
            target_ip:          field("target_ip"),
            hostname:           field("hostname"),
            username:           field("username"),
            encrypted_password: field("encrypted_password"),
            install_dir:        field("install_dir"),
        }
    }
}

/// Device chosen for a build, plus the host Mac record when one applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDevice {
    pub name:     String,
    pub device:   DeviceRecord,
    pub host_mac: Option<DeviceRecord>,
}

impl ResolvedDevice {
    /// Device fields with the host Mac's connection fields laid over them.
    pub fn effective(&self) -> DeviceRecord {
        let mut out = self.device.clone();
        if let Some(host) = &self.host_mac {
            let over = |own: &mut String, theirs: &str| {
                if !theirs.is_empty() { *own = theirs.to_owned(); }
            };
            over(&mut out.hostname, &host.hostname);
            over(&mut out.username, &host.username);
            over(&mut out.encrypted_password, &host.encrypted_password);
            over(&mut out.install_dir, &host.install_dir);
        }
        out
    }
}

/// Resolve the target device for `platform`.
///
/// Platforms that build locally get `Ok(None)` without touching the file.
pub fn resolve(config: Option<&Path>, platform: Platform, device_name: Option<&str>) -> Result<Option<ResolvedDevice>> {
    if !platform.capability().requires_remote_client {
        return Ok(None);
    }

    let path = match config {
        Some(p) if p.is_file() => p,
        other => {
            return Err(RubberError::MissingDeviceConfig {
                platform: platform.to_string(),
                path: other.map(|p| format!("{} does not exist", p.display()))
                    .unwrap_or_else(|| "no path given".into()),
            })
        }
    };

    let unreadable = |reason: String| RubberError::DeviceConfigUnreadable {
        path: path.to_path_buf(),
        reason,
    };

    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|e| unreadable(e.to_string()))?;
    let root = value.as_object()
        .ok_or_else(|| unreadable("top level is not an object".into()))?;

    let (name, device) = select_device(root, platform, device_name, path)?;

    let host_mac = if platform == Platform::Ios {
        Some(host_mac(root, &name, &device, path)?)
    } else {
        None
    };

    debug!("{platform}: target device '{name}'");
    Ok(Some(ResolvedDevice { name, device, host_mac }))
}

/// The device table for `platform`, honouring the android nesting.
pub fn device_table<'a>(root: &'a Map<String, Value>, platform: Platform) -> Option<&'a Map<String, Value>> {
    let section = root.get(platform.id())?;
    let table = match platform {
        Platform::Android => section.get("Auto")?,
        _ => section,
    };
    table.as_object()
}

/// Pick `device_name`, or the first device when none is given.
pub fn select_device(
    root: &Map<String, Value>,
    platform: Platform,
    device_name: Option<&str>,
    path: &Path,
) -> Result<(String, DeviceRecord)> {
    let table = device_table(root, platform).ok_or_else(|| RubberError::DeviceConfigUnreadable {
        path: path.to_path_buf(),
        reason: format!("no '{platform}' device table"),
    })?;

    let (name, value) = match device_name.filter(|n| !n.is_empty()) {
        None => table.iter().next()
            .map(|(k, v)| (k.clone(), v))
            .ok_or_else(|| RubberError::DeviceConfigUnreadable {
                path: path.to_path_buf(),
                reason: format!("the '{platform}' device table is empty"),
            })?,
        Some(name) => table.get(name)
            .map(|v| (name.to_owned(), v))
            .ok_or_else(|| RubberError::UnknownDevice {
                platform: platform.to_string(),
                device: name.to_owned(),
                path: path.to_path_buf(),
            })?,
    };

    Ok((name, DeviceRecord::from_value(value)))
}

fn host_mac(root: &Map<String, Value>, name: &str, device: &DeviceRecord, path: &Path) -> Result<DeviceRecord> {
    root.get(Platform::Mac.id())
        .and_then(|macs| macs.get(&device.hostmac))
        .filter(|v| v.is_object())
        .map(DeviceRecord::from_value)
        .ok_or_else(|| RubberError::MissingHostMac {
            device: name.to_owned(),
            hostmac: device.hostmac.clone(),
            path: path.to_path_buf(),
        })
}
