//! Shader validation - every WGSL file must parse and validate with naga.
//!
//! Needs no GPU, so it runs everywhere the crate builds.

use std::fs;
use std::path::Path;

fn shader_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src/gpu/shaders")
}

fn validate_shader(path: &Path) -> Result<naga::Module, String> {
    let source = fs::read_to_string(path).map_err(|e| format!("{path:?}: {e}"))?;
    let module = naga::front::wgsl::parse_str(&source)
        .map_err(|e| format!("{path:?}: {}", e.emit_to_string(&source)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("{path:?}: {e:?}"))?;
    Ok(module)
}

fn entry_points(module: &naga::Module) -> Vec<(naga::ShaderStage, String)> {
    module
        .entry_points
        .iter()
        .map(|ep| (ep.stage, ep.name.clone()))
        .collect()
}

#[test]
fn test_all_shaders_validate() {
    let mut errors = Vec::new();
    let mut shader_count = 0;

    for entry in fs::read_dir(shader_dir()).expect("shader dir") {
        let path = entry.expect("dir entry").path();
        if path.extension().is_some_and(|ext| ext == "wgsl") {
            shader_count += 1;
            if let Err(e) = validate_shader(&path) {
                errors.push(e);
            }
        }
    }

    assert!(shader_count >= 2, "expected the kernel and surface shaders");
    assert!(errors.is_empty(), "shader errors:\n{}", errors.join("\n"));
}

#[test]
fn test_kernel_entry_points() {
    let module = validate_shader(&shader_dir().join("kuramoto.wgsl")).unwrap();
    let entries = entry_points(&module);
    for name in ["initialize", "update_velocity", "update_phase"] {
        assert!(
            entries
                .iter()
                .any(|(stage, n)| *stage == naga::ShaderStage::Compute && n == name),
            "missing compute entry point {name}"
        );
    }
    for ep in &module.entry_points {
        assert_eq!(ep.workgroup_size, [64, 1, 1], "{}", ep.name);
    }
}

#[test]
fn test_surface_entry_points() {
    let module = validate_shader(&shader_dir().join("surface.wgsl")).unwrap();
    let entries = entry_points(&module);
    assert!(entries.contains(&(naga::ShaderStage::Vertex, "vs_main".to_string())));
    assert!(entries.contains(&(naga::ShaderStage::Fragment, "fs_main".to_string())));
}
