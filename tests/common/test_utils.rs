use std::path::{Path, PathBuf};

use cgmath::{Deg, Point3};
use run_ngin::{
    backend::recording::RecordingBackend, camera::Camera, config::GameConfig,
    context::RenderContext,
};
use tempfile::TempDir;

/// Vertex stage declaring every camera matrix.
pub const LIT_VERT: &str = r#"
struct Matrices {
    M: mat4x4<f32>,
    V: mat4x4<f32>,
    MV: mat4x4<f32>,
    MVP: mat4x4<f32>,
}
@group(0) @binding(0) var<uniform> u: Matrices;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coords: vec2<f32>,
}

@vertex
fn vs_main(@location(0) tex_coords: vec2<f32>, @location(1) normal: vec3<f32>, @location(2) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.tex_coords = tex_coords;
    out.clip_position = u.MVP * vec4<f32>(position, 1.0);
    return out;
}
"#;

pub const TEXTURED_FRAG: &str = r#"
@group(1) @binding(0) var t: texture_2d<f32>;
@group(1) @binding(1) var s: sampler;

@fragment
fn fs_main(@location(0) tex_coords: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(t, s, tex_coords);
}
"#;

/// Vertex stage that only declares `MVP`.
pub const FLAT_VERT: &str = r#"
struct Matrices {
    MVP: mat4x4<f32>,
}
@group(0) @binding(0) var<uniform> u: Matrices;

@vertex
fn vs_main(@location(2) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.MVP * vec4<f32>(position, 1.0);
}
"#;

pub const FLAT_FRAG: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

/// `MVP` plus a vec4 `tint`.
pub const TINTED_VERT: &str = r#"
struct Matrices {
    MVP: mat4x4<f32>,
    tint: vec4<f32>,
}
@group(0) @binding(0) var<uniform> u: Matrices;

@vertex
fn vs_main(@location(2) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.MVP * vec4<f32>(position, 1.0) * u.tint.w;
}
"#;

/// One triangle with texture coordinates and normals.
pub const TRIANGLE_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

/// Two triangles, textured through `quad.mtl`.
pub const QUAD_OBJ: &str = "\
mtllib quad.mtl
v -1.0 0.0 -2.0
v 1.0 0.0 -2.0
v 1.0 0.0 2.0
v -1.0 0.0 2.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 1.0 0.0
usemtl quad
f 1/1/1 4/4/1 3/3/1
f 1/1/1 3/3/1 2/2/1
";

pub const QUAD_MTL: &str = "\
newmtl quad
Kd 1.0 1.0 1.0
map_Kd quad.png
";

/// Positions and normals only.
pub const NO_TEXCOORDS_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vn 0.0 0.0 1.0
f 1//1 2//1 3//1
";

/// A scratch assets directory that disappears with the test.
pub struct Assets {
    dir: TempDir,
}

impl Assets {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("could not create a temp dir"),
        }
    }

    /// Shaders `lit`, `flat` and `tinted`, meshes `triangle` and `quad` (with texture).
    pub fn standard() -> Self {
        let assets = Self::new();
        assets.shader("lit", LIT_VERT, TEXTURED_FRAG);
        assets.shader("flat", FLAT_VERT, FLAT_FRAG);
        assets.shader("tinted", TINTED_VERT, FLAT_FRAG);
        assets.file("triangle.obj", TRIANGLE_OBJ);
        assets.file("quad.obj", QUAD_OBJ);
        assets.file("quad.mtl", QUAD_MTL);
        assets.png("quad.png", 4, 4, [255, 0, 0, 255]);
        assets
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("could not create asset dir");
        }
        std::fs::write(&path, content).expect("could not write asset");
        path
    }

    pub fn shader(&self, name: &str, vert: &str, frag: &str) {
        self.file(&format!("{name}.vert"), vert);
        self.file(&format!("{name}.frag"), frag);
    }

    pub fn png(&self, name: &str, width: u32, height: u32, colour: [u8; 4]) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("could not create asset dir");
        }
        image::RgbaImage::from_pixel(width, height, image::Rgba(colour))
            .save(&path)
            .expect("could not write png");
        path
    }

    /// Six faces below `dir`, each a different shade of red so the order can be checked.
    pub fn cubemap(&self, dir: &str, size: u32) {
        for (i, face) in run_ngin::resources::texture::CUBE_FACES.iter().enumerate() {
            self.png(&format!("{dir}/{face}.png"), size, size, face_colour(i));
        }
    }

    pub fn context(&self) -> RenderContext<RecordingBackend> {
        RenderContext::new(RecordingBackend::new(), self.path())
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::new()
    }
}

pub fn face_colour(index: usize) -> [u8; 4] {
    [10 + 40 * index as u8, 0, 0, 255]
}

pub fn camera() -> Camera {
    Camera::new(
        Point3::new(0.0, 3.0, -6.0),
        Point3::new(0.0, 0.5, 6.0),
        Deg(60.0),
        4.0 / 3.0,
    )
}

/// The default configuration pointed at the assets shipped with the crate.
pub fn game_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.assets.root = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
    config.gameplay.seed = Some(7);
    config
}

pub fn assert_mat4_eq(actual: [[f32; 4]; 4], expected: [[f32; 4]; 4]) {
    for c in 0..4 {
        for r in 0..4 {
            assert!(
                (actual[c][r] - expected[c][r]).abs() < 1e-5,
                "column {c} row {r}: {} != {}",
                actual[c][r],
                expected[c][r]
            );
        }
    }
}
