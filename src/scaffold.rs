// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: scaffold  -  blank project generator
//
//  Writes the same minimal tree the IDE creates for a new project: the
//  descriptor, inherited main options with a fresh game GUID, one empty
//  room and the resource-tree folder views. The IDE fills in the rest the
//  first time the project is opened.
// ─────────────────────────────────────────────────────────────────────────────

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{Result, RubberError};
use crate::project::{inherited_options_path, PROJECT_MODEL};

/// Resource id of the main options, fixed by the IDE.
const MAIN_OPTIONS_ID: &str = "ed6a955d-5826-4f98-a450-10b414266c27";
const NULL_ID: &str = "00000000-0000-0000-0000-000000000000";

/// (folder name, filter type, localised name) for every top-level view.
const VIEWS: &[(&str, &str, &str)] = &[
    ("sprites",    "GMSprite",       "ResourceTree_Sprites"),
    ("tilesets",   "GMTileSet",      "ResourceTree_Tilesets"),
    ("sounds",     "GMSound",        "ResourceTree_Sounds"),
    ("paths",      "GMPath",         "ResourceTree_Paths"),
    ("scripts",    "GMScript",       "ResourceTree_Scripts"),
    ("shaders",    "GMShader",       "ResourceTree_Shaders"),
    ("fonts",      "GMFont",         "ResourceTree_Fonts"),
    ("timelines",  "GMTimeline",     "ResourceTree_Timelines"),
    ("object",     "GMObject",       "ResourceTree_Objects"),
    ("rooms",      "GMRoom",         "ResourceTree_Rooms"),
    ("notes",      "GMNotes",        "ResourceTree_Notes"),
    ("datafiles",  "GMIncludedFile", "ResourceTree_IncludedFiles"),
    ("extensions", "GMExtension",    "ResourceTree_Extensions"),
    ("options",    "GMOptions",      "ResourceTree_Options"),
    ("configs",    "GMConfig",       "ResourceTree_Configs"),
];

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Descriptor path for a user-supplied target: `x.yyp` as-is, otherwise
/// `<dir>/<dir name>.yyp`.
pub fn descriptor_path(target: &Path) -> PathBuf {
    if target.extension().is_some_and(|e| e == "yyp") {
        return target.to_path_buf();
    }
    let name = target.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".into());
    target.join(format!("{name}.yyp"))
}

/// Tracks resources as they are written so the descriptor can list them.
struct Writer {
    root:      PathBuf,
    resources: Vec<Value>,
}

impl Writer {
    /// Write `resource` at `rel` (backslash-separated, as the IDE stores it).
    fn push(&mut self, resource: &Value, rel: &str) -> Result<()> {
        let path = rel.split('\\').fold(self.root.clone(), |p, part| p.join(part));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string(resource)?)?;
        debug!("wrote {}", path.display());

        self.resources.push(json!({
            "Key": resource["id"],
            "Value": {
                "id": new_id(),
                "resourcePath": rel,
                "resourceType": resource["modelName"],
            }
        }));
        Ok(())
    }
}

/// Generate a blank project whose descriptor ends up at `descriptor`.
pub fn make_blank_project(descriptor: &Path) -> Result<()> {
    if descriptor.exists() {
        return Err(RubberError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists", descriptor.display()),
        )));
    }
    let root = descriptor.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

    let options = inherited_options_path(&root);
    if let Some(parent) = options.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&options, main_options(&new_id()))?;

    let mut w = Writer { root, resources: Vec::new() };

    let room0 = room("room0");
    w.push(&room0, r"rooms\room0\room0.yy")?;

    let mut root_children = Vec::new();
    for (folder, filter, localised) in VIEWS {
        let children: Vec<Value> = match *filter {
            "GMRoom"    => vec![room0["id"].clone()],
            "GMOptions" => vec![json!(MAIN_OPTIONS_ID)],
            _ => Vec::new(),
        };
        let v = view(folder, filter, localised, children);
        w.push(&v, &format!(r"views\{}.yy", v["id"].as_str().unwrap_or_default()))?;
        root_children.push(v["id"].clone());
    }
    let root_view = view("Default", "root", "", root_children);
    w.push(&root_view, &format!(r"views\{}.yy", root_view["id"].as_str().unwrap_or_default()))?;

    let yyp = json!({
        "id": new_id(),
        "modelName": PROJECT_MODEL,
        "mvc": "1.0",
        "IsDnDProject": false,
        "configs": [],
        "option_ecma": false,
        "parentProject": {
            "id": new_id(),
            "modelName": "GMProjectParent",
            "mvc": "1.0",
            "alteredResources": [{
                "Key": MAIN_OPTIONS_ID,
                "Value": {
                    "configDeltas": ["inherited"],
                    "id": new_id(),
                    "resourcePath": r"options\main\options_main.yy",
                    "resourceType": "GMMainOptions"
                }
            }],
            "hiddenResources": [],
            "projectPath": "${base_project}"
        },
        "resources": w.resources,
        "script_order": [],
        "tutorial": ""
    });
    std::fs::write(descriptor, serde_json::to_string(&yyp)?)?;

    info!("project generated at {}", descriptor.display());
    Ok(())
}

/// The inherited options file is a `←`-delimited list of JSON fragments.
fn main_options(guid: &str) -> String {
    format!(
        "1.0.0←{MAIN_OPTIONS_ID}←{MAIN_OPTIONS_ID}|{{\n    \"option_gameguid\": \"{guid}\"\n}}\
         ←1225f6b0-ac20-43bd-a82e-be73fa0b6f4f|{{\n    \"targets\": 29263750006690030\n}}\
         ←7b2c4976-1e09-44e5-8256-c527145e03bb|{{\n    \"targets\": 29263750006690030\n}}"
    )
}

fn view(folder: &str, filter: &str, localised: &str, children: Vec<Value>) -> Value {
    let id = new_id();
    json!({
        "id": id,
        "modelName": "GMFolder",
        "mvc": "1.1",
        "name": id,
        "children": children,
        "filterType": filter,
        "folderName": folder,
        "isDefaultView": filter == "root",
        "localisedFolderName": localised,
    })
}

fn layer(kind: &str, name: &str, depth: i32, extra: Value) -> Value {
    let mut l = json!({
        "__type": format!("{kind}_Model:#YoYoStudio.MVCFormat"),
        "name": name,
        "id": new_id(),
        "depth": depth,
        "grid_x": 32,
        "grid_y": 32,
        "hierarchyFrozen": false,
        "hierarchyVisible": true,
        "inheritLayerDepth": false,
        "inheritLayerSettings": false,
        "inheritSubLayers": false,
        "inheritVisibility": false,
        "layers": [],
        "m_parentID": NULL_ID,
        "m_serialiseFrozen": false,
        "modelName": kind,
        "mvc": "1.0",
        "userdefined_depth": false,
        "visible": true,
    });
    if let (Some(obj), Value::Object(more)) = (l.as_object_mut(), extra) {
        obj.extend(more);
    }
    l
}

fn room(name: &str) -> Value {
    let views: Vec<Value> = (0..8).map(|_| json!({
        "id": new_id(), "modelName": "GMRView", "mvc": "1.0",
        "hborder": 32, "hport": 768, "hspeed": -1, "hview": 768,
        "inherit": false, "objId": NULL_ID, "vborder": 32, "visible": false,
        "vspeed": -1, "wport": 1024, "wview": 1024,
        "xport": 0, "xview": 0, "yport": 0, "yview": 0
    })).collect();

    json!({
        "name": name,
        "id": new_id(),
        "creationCodeFile": "",
        "inheritCode": false,
        "inheritCreationOrder": false,
        "inheritLayers": false,
        "instanceCreationOrderIDs": [],
        "IsDnD": false,
        "layers": [
            layer("GMRInstanceLayer", "Instances", 0, json!({ "instances": [] })),
            layer("GMRBackgroundLayer", "Background", 100, json!({
                "animationFPS": 15, "animationSpeedType": "0",
                "colour": { "Value": 4278190080u32 },
                "hspeed": 0, "htiled": false, "spriteId": NULL_ID,
                "stretch": false, "userdefined_animFPS": false,
                "vspeed": 0, "vtiled": false, "x": 0, "y": 0
            })),
        ],
        "modelName": "GMRoom",
        "parentId": NULL_ID,
        "physicsSettings": {
            "id": new_id(), "inheritPhysicsSettings": false,
            "modelName": "GMRoomPhysicsSettings", "PhysicsWorld": false,
            "PhysicsWorldGravityX": 0, "PhysicsWorldGravityY": 10,
            "PhysicsWorldPixToMeters": 0.1, "mvc": "1.0"
        },
        "roomSettings": {
            "id": new_id(), "Height": 768, "inheritRoomSettings": false,
            "modelName": "GMRoomSettings", "persistent": false,
            "mvc": "1.0", "Width": 1024
        },
        "mvc": "1.0",
        "views": views,
        "viewSettings": {
            "id": new_id(), "clearDisplayBuffer": true, "clearViewBackground": false,
            "enableViews": false, "inheritViewSettings": false,
            "modelName": "GMRoomViewSettings", "mvc": "1.0"
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{self, IdentitySource};
    use tempfile::TempDir;

    #[test]
    fn descriptor_path_rules() {
        assert_eq!(descriptor_path(Path::new("/p/game.yyp")), PathBuf::from("/p/game.yyp"));
        assert_eq!(descriptor_path(Path::new("/p/game")), PathBuf::from("/p/game/game.yyp"));
    }

    #[test]
    fn blank_project_is_valid_and_identifiable() {
        let dir = TempDir::new().unwrap();
        let yyp = descriptor_path(&dir.path().join("demo"));
        make_blank_project(&yyp).unwrap();

        assert!(project::validate(&yyp));
        let id = project::locate(&yyp).unwrap();
        assert_eq!(id.source, IdentitySource::MainOptions);
        assert_eq!(id.guid.len(), 36);

        let root = yyp.parent().unwrap();
        assert!(root.join("rooms").join("room0").join("room0.yy").is_file());
        let descriptor: Value = serde_json::from_str(&std::fs::read_to_string(&yyp).unwrap()).unwrap();
        assert_eq!(descriptor["resources"].as_array().unwrap().len(), VIEWS.len() + 2);
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let yyp = dir.path().join("x.yyp");
        std::fs::write(&yyp, "{}").unwrap();
        assert!(make_blank_project(&yyp).is_err());
    }
}
