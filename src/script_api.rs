//! Host-defined description of the script capability surface.
//!
//! This is the single source editors use for autocomplete and hover docs.
//! It is written by hand next to the Rhai registrations; the tests below run
//! every example against a real engine so the two cannot drift apart.

use serde::Serialize;

use crate::playground::{LoopKind, Mode};

pub const SCRIPT_API_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct ApiParam {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiMethod {
    pub name: String,
    pub description: String,
    pub params: Vec<ApiParam>,
    pub returns: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub readonly: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiType {
    pub name: String,
    pub description: String,
    pub constructors: Vec<ApiMethod>,
    pub methods: Vec<ApiMethod>,
    pub properties: Vec<ApiProperty>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiFunction {
    pub name: String,
    pub description: String,
    pub example: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptApiMetadata {
    pub version: u32,
    pub mode: Mode,
    pub types: Vec<ApiType>,
    pub functions: Vec<ApiFunction>,
}

fn num(name: &str) -> ApiParam {
    ApiParam {
        name: name.to_string(),
        type_name: "number".to_string(),
        optional: false,
        default: None,
    }
}

fn text(name: &str) -> ApiParam {
    ApiParam {
        type_name: "string".to_string(),
        ..num(name)
    }
}

fn optional(param: ApiParam, default: &str) -> ApiParam {
    ApiParam {
        optional: true,
        default: Some(default.to_string()),
        ..param
    }
}

fn method(name: &str, description: &str, params: Vec<ApiParam>, returns: &str, example: &str) -> ApiMethod {
    ApiMethod {
        name: name.to_string(),
        description: description.to_string(),
        params,
        returns: returns.to_string(),
        example: Some(example.to_string()),
    }
}

fn props(names: &[&str], readonly: bool) -> Vec<ApiProperty> {
    names
        .iter()
        .map(|n| ApiProperty {
            name: n.to_string(),
            type_name: if *n == "color" { "string" } else { "number" }.to_string(),
            readonly,
        })
        .collect()
}

fn shape_methods(ctor: &str) -> Vec<ApiMethod> {
    vec![
        method(
            "setVelocity",
            "Pixels moved per frame on each axis.",
            vec![num("vx"), num("vy")],
            "()",
            &format!("let s = {ctor}; s.setVelocity(2, -1);"),
        ),
        method(
            "setColor",
            "Hex, hsl() or a basic color name.",
            vec![text("color")],
            "()",
            &format!("let s = {ctor}; s.setColor(\"hsl(200, 80%, 50%)\");"),
        ),
        method(
            "setRotationSpeed",
            "Radians added to the rotation every frame.",
            vec![num("speed")],
            "()",
            &format!("let s = {ctor}; s.setRotationSpeed(0.05);"),
        ),
    ]
}

fn snake_type() -> ApiType {
    ApiType {
        name: "Snake".to_string(),
        description: "A square sprite that crawls in one direction and wraps at the edges.".to_string(),
        constructors: vec![
            method("Snake", "Snake at (200, 200).", vec![], "Snake", "let s = Snake();"),
            method("Snake", "Snake at (x, y).", vec![num("x"), num("y")], "Snake", "let s = Snake(100, 50);"),
        ],
        methods: vec![
            method("setColor", "Fill color.", vec![text("color")], "()", "let s = Snake(); s.setColor(\"#ffcc00\");"),
            method(
                "setSpeed",
                "Pixels per frame, clamped to 0.1..10.",
                vec![num("speed")],
                "()",
                "let s = Snake(); s.setSpeed(4);",
            ),
            method(
                "move",
                "Turn to \"up\", \"down\", \"left\" or \"right\". Anything else is ignored.",
                vec![text("direction")],
                "()",
                "let s = Snake(); s.move(\"down\");",
            ),
        ],
        properties: props(&["x", "y", "speed"], true),
    }
}

fn ball_type() -> ApiType {
    ApiType {
        name: "BouncingBall".to_string(),
        description: "A ball under gravity that loses energy on every bounce.".to_string(),
        constructors: vec![
            method("BouncingBall", "Radius 15 ball at (200, 100).", vec![], "BouncingBall", "let b = BouncingBall();"),
            method(
                "BouncingBall",
                "Radius 15 ball at (x, y).",
                vec![num("x"), num("y")],
                "BouncingBall",
                "let b = BouncingBall(50, 50);",
            ),
            method(
                "BouncingBall",
                "Ball at (x, y) with the given radius.",
                vec![num("x"), num("y"), num("radius")],
                "BouncingBall",
                "let b = BouncingBall(200, 100, 25);",
            ),
        ],
        methods: vec![
            method("setColor", "Fill color.", vec![text("color")], "()", "let b = BouncingBall(); b.setColor(\"orange\");"),
            method(
                "setVelocity",
                "Pixels moved per frame on each axis.",
                vec![num("vx"), num("vy")],
                "()",
                "let b = BouncingBall(); b.setVelocity(3, -2);",
            ),
            method(
                "setGravity",
                "Added to the vertical velocity every frame.",
                vec![num("g")],
                "()",
                "let b = BouncingBall(); b.setGravity(0.5);",
            ),
            method(
                "setBounce",
                "Fraction of speed kept on a bounce, clamped to 0..1.",
                vec![num("b")],
                "()",
                "let b = BouncingBall(); b.setBounce(0.9);",
            ),
        ],
        properties: props(&["x", "y", "radius"], true),
    }
}

fn drawing_types() -> Vec<ApiType> {
    let circle = "Circle(100, 100, 20)";
    let rect = "Rectangle(100, 100, 40, 20)";
    let tri = "Triangle(100, 100, 15)";

    vec![
        ApiType {
            name: "Circle".to_string(),
            description: "Bounces off the edges while overlapping them, wraps once fully outside.".to_string(),
            constructors: vec![method(
                "Circle",
                "Circle centred on (x, y).",
                vec![num("x"), num("y"), num("radius"), optional(text("color"), "#ff0000")],
                "Circle",
                "let c = Circle(300, 200, 40, \"#3366ff\");",
            )],
            methods: shape_methods(circle),
            properties: props(&["x", "y", "rotation", "radius"], true),
        },
        ApiType {
            name: "Rectangle".to_string(),
            description: "Axis-aligned box from its top-left corner, rotated about its centre.".to_string(),
            constructors: vec![method(
                "Rectangle",
                "Rectangle with top-left corner (x, y).",
                vec![num("x"), num("y"), num("width"), num("height"), optional(text("color"), "#00ff00")],
                "Rectangle",
                "let r = Rectangle(10, 10, 80, 40);",
            )],
            methods: shape_methods(rect),
            properties: props(&["x", "y", "rotation", "width", "height"], true),
        },
        ApiType {
            name: "Triangle".to_string(),
            description: "Isosceles triangle centred on its position.".to_string(),
            constructors: vec![method(
                "Triangle",
                "Triangle centred on (x, y).",
                vec![num("x"), num("y"), num("size"), optional(text("color"), "#0000ff")],
                "Triangle",
                "let t = Triangle(600, 300, 30, \"purple\");",
            )],
            methods: shape_methods(tri),
            properties: props(&["x", "y", "rotation"], true),
        },
        ApiType {
            name: "Particle".to_string(),
            description: "Short-lived dot that fades out as its life decays from 255.".to_string(),
            constructors: vec![method(
                "Particle",
                "Particle at (x, y) with a random size between 5 and 15.",
                vec![num("x"), num("y"), optional(text("color"), "#ff00ff")],
                "Particle",
                "let p = Particle(600, 300); p.vx = 1.5; p.vy = -2;",
            )],
            methods: vec![method(
                "setGravity",
                "Added to vy every frame; 0 disables it.",
                vec![num("g")],
                "()",
                "let p = Particle(10, 10); p.setGravity(0);",
            )],
            properties: props(&["x", "y", "vx", "vy", "life", "decay", "size", "gravity", "color"], false),
        },
    ]
}

fn functions() -> Vec<ApiFunction> {
    [
        ("print", "Write an info line to the console.", "print(\"hello\");"),
        ("debug", "Write the debug form of a value to the console.", "debug([1, 2, 3]);"),
        ("warn", "Write a warning to the console.", "warn(\"careful\");"),
        ("error", "Write an error to the console.", "error(\"oops\");"),
    ]
    .into_iter()
    .map(|(name, description, example)| ApiFunction {
        name: name.to_string(),
        description: description.to_string(),
        example: example.to_string(),
    })
    .collect()
}

/// Everything a script can construct or call in `mode`.
pub fn script_api_metadata(mode: Mode) -> ScriptApiMetadata {
    let types = match mode.loop_kind() {
        LoopKind::Game => vec![snake_type(), ball_type()],
        LoopKind::Drawing => drawing_types(),
    };
    ScriptApiMetadata {
        version: SCRIPT_API_VERSION,
        mode,
        types,
        functions: functions(),
    }
}

pub fn script_api_metadata_json(mode: Mode) -> String {
    serde_json::to_string_pretty(&script_api_metadata(mode)).unwrap_or_else(|_| "{}".to_string())
}
