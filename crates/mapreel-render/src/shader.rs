//! Loading and compiling panel shaders.
//!
//! Panel shaders are WGSL files named `<directory>/<name>.wgsl` with `vs_main` and `fs_main`
//! entry points and a fixed binding interface shared by every panel.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use mapreel_core::{MapreelError, MapreelResult};

/// Names a panel shader must declare.
pub const REQUIRED_IDENTIFIERS: &[&str] = &[
    "vertex_matrix",
    "vertex_position",
    "vertex_texture_coordinate",
    "texture_sampler",
];

/// Names a panel shader may declare; absence only warns.
pub const OPTIONAL_IDENTIFIERS: &[&str] = &[
    "texture_width",
    "texture_height",
    "texel_width",
    "texel_height",
];

pub const VERTEX_ENTRY_POINT: &str = "vs_main";
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";

/// Full-screen triangle filled with a uniform colour.
pub const SOLID_SHADER: &str = include_str!("solid.wgsl");

/// Full-screen triangle blending the premultiplied overlay texture.
pub const OVERLAY_SHADER: &str = include_str!("overlay.wgsl");

pub fn shader_path(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!("{}.wgsl", name))
}

/// Names a parsed shader declares: globals, struct members, entry points and their arguments.
#[derive(Debug, Default)]
pub struct ShaderInterface {
    names: HashSet<String>,
    entry_points: Vec<(String, naga::ShaderStage)>,
}

impl ShaderInterface {
    /// Parse WGSL and collect its declared names. Comments never count.
    pub fn reflect(name: &str, source: &str) -> MapreelResult<Self> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| {
            MapreelError::Resource(format!(
                "shader '{}' failed to parse: {}",
                name,
                e.emit_to_string(source)
            ))
        })?;

        let mut names = HashSet::new();
        for (_, global) in module.global_variables.iter() {
            names.extend(global.name.clone());
        }
        for (_, ty) in module.types.iter() {
            if let naga::TypeInner::Struct { members, .. } = &ty.inner {
                names.extend(members.iter().filter_map(|member| member.name.clone()));
            }
        }
        for entry_point in &module.entry_points {
            names.extend(
                entry_point
                    .function
                    .arguments
                    .iter()
                    .filter_map(|argument| argument.name.clone()),
            );
        }

        Ok(Self {
            names,
            entry_points: module
                .entry_points
                .iter()
                .map(|entry_point| (entry_point.name.clone(), entry_point.stage))
                .collect(),
        })
    }

    pub fn declares(&self, identifier: &str) -> bool {
        self.names.contains(identifier)
    }

    pub fn has_entry_point(&self, name: &str, stage: naga::ShaderStage) -> bool {
        self.entry_points
            .iter()
            .any(|(entry, entry_stage)| entry == name && *entry_stage == stage)
    }
}

/// Check the binding interface of a panel shader.
pub fn check_interface(name: &str, source: &str) -> MapreelResult<()> {
    let interface = ShaderInterface::reflect(name, source)?;

    let missing: Vec<&str> = REQUIRED_IDENTIFIERS
        .iter()
        .copied()
        .filter(|identifier| !interface.declares(identifier))
        .collect();
    if !missing.is_empty() {
        return Err(MapreelError::Resource(format!(
            "shader '{}' does not declare {}",
            name,
            missing.join(", ")
        )));
    }

    for (entry_point, stage) in [
        (VERTEX_ENTRY_POINT, naga::ShaderStage::Vertex),
        (FRAGMENT_ENTRY_POINT, naga::ShaderStage::Fragment),
    ] {
        if !interface.has_entry_point(entry_point, stage) {
            return Err(MapreelError::Resource(format!(
                "shader '{}' has no {:?} entry point '{}'",
                name, stage, entry_point
            )));
        }
    }

    for identifier in OPTIONAL_IDENTIFIERS {
        if !interface.declares(identifier) {
            tracing::warn!("Shader '{}' does not use '{}'", name, identifier);
        }
    }
    Ok(())
}

/// Read a panel shader by name and check its interface.
pub fn load_panel_shader(directory: &Path, name: &str) -> MapreelResult<String> {
    let path = shader_path(directory, name);
    let source = std::fs::read_to_string(&path).map_err(|e| {
        MapreelError::Resource(format!("cannot read shader {}: {}", path.display(), e))
    })?;
    check_interface(name, &source)?;
    tracing::debug!("Loaded shader '{}' from {}", name, path.display());
    Ok(source)
}

/// Compile WGSL, turning validation errors into [`MapreelError::Resource`].
pub fn compile(device: &wgpu::Device, label: &str, source: &str) -> MapreelResult<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(MapreelError::Resource(format!(
            "shader '{}' failed to compile: {}",
            label, error
        ))),
        None => Ok(module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "
        struct PanelUniforms { vertex_matrix: mat4x4<f32> };
        @group(0) @binding(0) var<uniform> panel: PanelUniforms;
        @group(0) @binding(1) var texture_sampler: texture_2d<f32>;

        @vertex
        fn vs_main(
            @location(0) vertex_position: vec3<f32>,
            @location(1) vertex_texture_coordinate: vec2<f32>,
        ) -> @builtin(position) vec4<f32> {
            return panel.vertex_matrix * vec4<f32>(vertex_position, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return textureLoad(texture_sampler, vec2<i32>(0, 0), 0);
        }
    ";

    #[test]
    fn test_reflect_collects_declared_names() {
        let interface = ShaderInterface::reflect("minimal", MINIMAL).unwrap();
        for identifier in REQUIRED_IDENTIFIERS {
            assert!(interface.declares(identifier), "{}", identifier);
        }
        assert!(interface.declares("panel"));
        assert!(!interface.declares("texel_width"));
        assert!(interface.has_entry_point("vs_main", naga::ShaderStage::Vertex));
        assert!(!interface.has_entry_point("vs_main", naga::ShaderStage::Fragment));
    }

    #[test]
    fn test_required_identifiers() {
        assert!(check_interface("minimal", MINIMAL).is_ok());

        let broken = MINIMAL.replace("texture_sampler", "tex");
        let err = check_interface("broken", &broken).unwrap_err();
        assert!(matches!(err, MapreelError::Resource(_)));
        assert!(err.to_string().contains("texture_sampler"));
    }

    #[test]
    fn test_name_in_comment_does_not_count() {
        let unbound = MINIMAL
            .replace(
                "@group(0) @binding(1) var texture_sampler: texture_2d<f32>;",
                "// texture_sampler is not bound here\n/* texture_sampler */",
            )
            .replace(
                "return textureLoad(texture_sampler, vec2<i32>(0, 0), 0);",
                "return vec4<f32>(1.0);",
            );
        let err = check_interface("unbound", &unbound).unwrap_err();
        assert!(matches!(err, MapreelError::Resource(_)));
        assert!(err.to_string().contains("texture_sampler"));
    }

    #[test]
    fn test_missing_entry_point() {
        let broken = MINIMAL.replace("fs_main", "shade");
        assert!(check_interface("broken", &broken).is_err());

        let wrong_stage = MINIMAL
            .replace("@vertex", "@@")
            .replace("@fragment", "@vertex")
            .replace("@@", "@fragment");
        assert!(check_interface("wrong_stage", &wrong_stage).is_err());
    }

    #[test]
    fn test_unparsable_shader_is_a_resource_error() {
        let err = check_interface("garbage", "fn vs_main( {").unwrap_err();
        assert!(matches!(err, MapreelError::Resource(_)));
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_load_panel_shader() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("minimal.wgsl"), MINIMAL).unwrap();
        assert!(load_panel_shader(dir.path(), "minimal").is_ok());
        assert!(matches!(
            load_panel_shader(dir.path(), "missing"),
            Err(MapreelError::Resource(_))
        ));
    }

    #[test]
    fn test_builtin_shaders_use_entry_points() {
        for (name, source) in [("solid", SOLID_SHADER), ("overlay", OVERLAY_SHADER)] {
            let interface = ShaderInterface::reflect(name, source).unwrap();
            assert!(interface.has_entry_point(VERTEX_ENTRY_POINT, naga::ShaderStage::Vertex));
            assert!(interface.has_entry_point(FRAGMENT_ENTRY_POINT, naga::ShaderStage::Fragment));
        }
    }

    #[test]
    fn test_shipped_panel_shaders() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/shaders");
        for name in ["bilinear", "bicubic"] {
            let source = load_panel_shader(&dir, name).unwrap();
            let interface = ShaderInterface::reflect(name, &source).unwrap();
            for identifier in OPTIONAL_IDENTIFIERS {
                assert!(interface.declares(identifier), "{} lacks {}", name, identifier);
            }
        }
    }
}
