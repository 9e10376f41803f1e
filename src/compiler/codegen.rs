//! C++ source generation for compiled levels
//!
//! Mesh objects become `CreateObject` calls in `GameLevel::Initialize`. The
//! transform is read from the `posX`..`rotZ` properties and interpolated as-is:
//! a missing property leaves an empty argument and nothing is escaped, so
//! quotes or newlines in names or values can produce invalid C++.

use crate::level::{LevelData, LevelObject, ObjectType};

/// Level implementation unit
pub const LEVEL_SOURCE_FILE: &str = "GameLevel.cpp";
/// Level class declaration
pub const LEVEL_HEADER_FILE: &str = "GameLevel.h";
/// Application entry point
pub const ENTRY_POINT_FILE: &str = "Main.cpp";

/// Setting used as the game window caption
pub const GAME_TITLE_SETTING: &str = "GameTitle";

const POSITION_KEYS: [&str; 3] = ["posX", "posY", "posZ"];
const ROTATION_KEYS: [&str; 3] = ["rotX", "rotY", "rotZ"];

const TITLE_PLACEHOLDER: &str = "@GAME_TITLE@";

/// One generated file, relative to the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub file_name: &'static str,
    pub contents: String,
}

/// Generates every source file for a level
pub fn generate(level: &LevelData) -> Vec<GeneratedFile> {
    vec![
        GeneratedFile {
            file_name: LEVEL_SOURCE_FILE,
            contents: level_source(level),
        },
        GeneratedFile {
            file_name: LEVEL_HEADER_FILE,
            contents: LEVEL_HEADER.to_string(),
        },
        GeneratedFile {
            file_name: ENTRY_POINT_FILE,
            contents: entry_point(level.setting(GAME_TITLE_SETTING).unwrap_or_default()),
        },
    ]
}

/// Transform properties a mesh is missing, as `(object name, key)` pairs
pub fn missing_transform_properties(level: &LevelData) -> Vec<(String, &'static str)> {
    level
        .objects_by_type(ObjectType::Mesh)
        .into_iter()
        .flat_map(|obj| {
            POSITION_KEYS
                .iter()
                .chain(ROTATION_KEYS.iter())
                .filter(|key| obj.property(key).is_none())
                .map(|key| (obj.name().to_string(), *key))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Builds `GameLevel.cpp`
pub fn level_source(level: &LevelData) -> String {
    let mut out = String::new();

    out.push_str("#include \"Engine.h\"\n");
    out.push_str("#include \"GameLevel.h\"\n\n");

    out.push_str("void GameLevel::Initialize(Engine* engine) {\n");
    out.push_str("    engine_ = engine;\n");
    out.push_str("    // Generated from level editor\n");
    for mesh in level.objects_by_type(ObjectType::Mesh) {
        out.push_str(&create_object_call(mesh));
    }
    out.push_str("}\n\n");

    out.push_str("void GameLevel::Update(float deltaTime) {\n");
    out.push_str("    // Custom update logic\n");
    out.push_str("}\n\n");

    out.push_str("void GameLevel::Render() {\n");
    out.push_str("    // Custom render logic\n");
    out.push_str("}\n");

    out
}

fn create_object_call(mesh: &LevelObject) -> String {
    let position = POSITION_KEYS.map(|key| mesh.property_text(key)).join(", ");
    let rotation = ROTATION_KEYS.map(|key| mesh.property_text(key)).join(", ");

    format!(
        "    // Create {name}\n    CreateObject(\"{name}\", XMFLOAT3({position}), XMFLOAT3({rotation}));\n",
        name = mesh.name(),
    )
}

/// Builds `Main.cpp` with the given window caption
pub fn entry_point(title: &str) -> String {
    ENTRY_POINT.replace(TITLE_PLACEHOLDER, title)
}

const LEVEL_HEADER: &str = r#"#pragma once
#include <string>
#include "Engine.h"

class GameLevel {
public:
    void Initialize(Engine* engine);
    void Update(float deltaTime);
    void Render();

private:
    Engine* engine_ = nullptr;

    // Helper methods
    void CreateObject(const std::string& name, XMFLOAT3 position, XMFLOAT3 rotation) {
        // Implementation for creating game objects
    }
};
"#;

const ENTRY_POINT: &str = r#"#include <windows.h>
#include "Engine.h"
#include "GameLevel.h"

LPCWSTR szTitle = L"@GAME_TITLE@";
LPCWSTR szWindowClass = L"DIRECTXGAMEWINDOW";
HINSTANCE hInst;
Engine* g_engine = nullptr;
GameLevel* g_level = nullptr;

LRESULT CALLBACK WndProc(HWND, UINT, WPARAM, LPARAM);

ATOM MyRegisterClass(HINSTANCE hInstance)
{
    WNDCLASS wc = {};
    wc.lpfnWndProc = WndProc;
    wc.hInstance = hInstance;
    wc.lpszClassName = szWindowClass;
    wc.hbrBackground = (HBRUSH)(COLOR_WINDOW + 1);
    return RegisterClass(&wc);
}

BOOL InitInstance(HINSTANCE hInstance, int nCmdShow)
{
    hInst = hInstance;
    HWND hWnd = CreateWindow(szWindowClass, szTitle, WS_OVERLAPPEDWINDOW,
        CW_USEDEFAULT, 0, 800, 600, nullptr, nullptr, hInstance, nullptr);
    if (!hWnd)
        return FALSE;
    ShowWindow(hWnd, nCmdShow);
    UpdateWindow(hWnd);

    // Create and initialize the engine
    g_engine = new Engine(hWnd);
    if (!g_engine->Initialize()) {
        MessageBox(hWnd, L"Engine initialization failed!", L"Error", MB_OK);
        delete g_engine;
        g_engine = nullptr;
        return FALSE;
    }

    // Create and initialize game level
    g_level = new GameLevel();
    g_level->Initialize(g_engine);

    SetTimer(hWnd, 1, 16, NULL); // ~60fps
    return TRUE;
}

int APIENTRY wWinMain(_In_ HINSTANCE hInstance,
    _In_opt_ HINSTANCE hPrevInstance,
    _In_ LPWSTR    lpCmdLine,
    _In_ int       nCmdShow)
{
    MyRegisterClass(hInstance);
    if (!InitInstance(hInstance, nCmdShow))
        return FALSE;

    MSG msg;
    while (GetMessage(&msg, nullptr, 0, 0))
    {
        TranslateMessage(&msg);
        DispatchMessage(&msg);
    }
    return (int)msg.wParam;
}

LRESULT CALLBACK WndProc(HWND hWnd, UINT message, WPARAM wParam, LPARAM lParam)
{
    switch (message)
    {
    case WM_TIMER:
        if (g_engine) {
            g_engine->Update();
            if (g_level) g_level->Update(1.0f/60.0f);
        }
        break;
    case WM_PAINT:
    {
        if (g_engine) {
            g_engine->Render();
            if (g_level) g_level->Render();
        }
        ValidateRect(hWnd, NULL); // Mark as painted
    }
    break;
    case WM_DESTROY:
        if (g_level) {
            delete g_level;
            g_level = nullptr;
        }
        if (g_engine) {
            delete g_engine;
            g_engine = nullptr;
        }
        PostQuitMessage(0);
        break;
    default:
        return DefWindowProc(hWnd, message, wParam, lParam);
    }
    return 0;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn rock_level() -> LevelData {
        let mut level = LevelData::new();
        level.add_object(
            LevelObject::new("Rock", ObjectType::Mesh)
                .with_property("posX", "1.0")
                .with_property("posY", "2.0")
                .with_property("posZ", "3.0"),
        );
        level.add_object(LevelObject::new("Sun", ObjectType::Light).with_property("posX", "9"));
        level.set_setting(GAME_TITLE_SETTING, "MyGame");
        level
    }

    #[test]
    fn test_mesh_objects_become_create_calls() {
        let source = level_source(&rock_level());
        assert!(source.contains("    // Create Rock\n"));
        assert!(source.contains("CreateObject(\"Rock\", XMFLOAT3(1.0, 2.0, 3.0), XMFLOAT3(, , ));"));
        // Lights are not meshes
        assert!(!source.contains("Sun"));
    }

    #[test]
    fn test_meshes_emitted_in_document_order() {
        let mut level = LevelData::new();
        for name in ["B", "A", "C"] {
            level.add_object(LevelObject::new(name, ObjectType::Mesh));
        }
        let source = level_source(&level);
        let b = source.find("\"B\"").unwrap();
        let a = source.find("\"A\"").unwrap();
        let c = source.find("\"C\"").unwrap();
        assert!(b < a && a < c);
    }

    #[test]
    fn test_entry_point_title() {
        let main = entry_point("MyGame");
        assert!(main.contains("LPCWSTR szTitle = L\"MyGame\";"));
        assert!(!main.contains(TITLE_PLACEHOLDER));
        assert!(entry_point("").contains("LPCWSTR szTitle = L\"\";"));
    }

    #[test]
    fn test_generate_file_set() {
        let files = generate(&rock_level());
        let names: Vec<&str> = files.iter().map(|f| f.file_name).collect();
        assert_eq!(names, vec![LEVEL_SOURCE_FILE, LEVEL_HEADER_FILE, ENTRY_POINT_FILE]);
        assert!(files[1].contents.contains("class GameLevel"));
        assert!(files[2].contents.contains("MyGame"));
    }

    #[test]
    fn test_missing_transform_properties() {
        let missing = missing_transform_properties(&rock_level());
        let keys: Vec<&str> = missing.iter().map(|(_, key)| *key).collect();
        assert_eq!(keys, vec!["rotX", "rotY", "rotZ"]);
        assert!(missing.iter().all(|(name, _)| name == "Rock"));
    }
}
