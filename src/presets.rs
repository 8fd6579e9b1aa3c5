//! Starter scripts shown when a mode is selected.

use crate::playground::Mode;

#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub source: &'static str,
}

pub const SNAKE_SCRIPT: &str = r#"// Snake mode
let snake = Snake(200, 200);
snake.setColor("green");
snake.move("right");
snake.setSpeed(3);

// Try changing the speed or direction!
print("Snake created successfully!");
"#;

pub const BALL_SCRIPT: &str = r#"// Bouncing ball mode
let ball = BouncingBall(200, 100, 15);
ball.setColor("red");
ball.setVelocity(5, 0);
ball.setGravity(0.3);
ball.setBounce(0.8);

let ball2 = BouncingBall(100, 150, 20);
ball2.setColor("blue");
ball2.setVelocity(-3, 2);
ball2.setGravity(0.4);
ball2.setBounce(0.9);

// Try changing the physics properties!
print("Multiple bouncing balls created successfully!");
"#;

pub const DRAWING_EXAMPLES: &[Preset] = &[
    Preset {
        name: "Bouncing shapes",
        source: r##"// Three shapes drifting around the canvas
let c = Circle(200, 150, 40, "#3366ff");
c.setVelocity(3, 2);

let r = Rectangle(600, 300, 80, 50, "orange");
r.setVelocity(-2, 1.5);
r.setRotationSpeed(0.02);

let t = Triangle(900, 200, 30);
t.setVelocity(1, -2.5);
t.setRotationSpeed(-0.05);

print("Shapes ready");
"##,
    },
    Preset {
        name: "Particle fountain",
        source: r#"// A burst of particles falling back under gravity
for i in 0..60 {
    let p = Particle(600, 500, "hsl(" + (i * 6) + ", 90%, 55%)");
    p.vx = (i % 12) - 5.5;
    p.vy = -6 - (i % 5);
    p.decay = 1.5;
}
print("60 particles launched");
"#,
    },
    Preset {
        name: "Rainbow ring",
        source: r#"// Circles placed on a ring, colored by angle
let count = 24;
for i in 0..count {
    let angle = i * 6.2832 / count;
    let x = 600 + 200 * cos(angle);
    let y = 300 + 200 * sin(angle);
    Circle(x, y, 18, "hsl(" + (i * 15) + ", 80%, 60%)");
}
"#,
    },
    Preset {
        name: "Spinning triangles",
        source: r#"// A row of triangles turning at different speeds
for i in 0..8 {
    let t = Triangle(150 + i * 130, 300, 25, "hsl(" + (i * 45) + ", 70%, 45%)");
    t.setRotationSpeed(0.01 * (i + 1));
}
"#,
    },
];

/// The script loaded when `mode` is selected.
pub fn default_script(mode: Mode) -> &'static str {
    match mode {
        Mode::Snake => SNAKE_SCRIPT,
        Mode::Ball => BALL_SCRIPT,
        Mode::Drawing => DRAWING_EXAMPLES[0].source,
    }
}

/// Position in [`DRAWING_EXAMPLES`]; stepping past either end wraps around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExampleCursor {
    index: usize,
}

impl ExampleCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &'static Preset {
        &DRAWING_EXAMPLES[self.index]
    }

    pub fn next(&mut self) -> &'static Preset {
        self.index = (self.index + 1) % DRAWING_EXAMPLES.len();
        self.current()
    }

    pub fn previous(&mut self) -> &'static Preset {
        self.index = (self.index + DRAWING_EXAMPLES.len() - 1) % DRAWING_EXAMPLES.len();
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaygroundConfig;
    use crate::scheduler::ManualScheduler;
    use crate::playground::Playground;
    use crate::script_host::ExecutionOutcome;
    use crate::surface::RecordingProvider;

    fn run(mode: Mode, source: &str) -> ExecutionOutcome {
        let mut pg = Playground::new(
            PlaygroundConfig::default(),
            ManualScheduler::new(),
            Box::new(RecordingProvider::new()),
        );
        pg.select_mode(mode).unwrap();
        let outcome = pg.execute_code(source).unwrap();
        pg.shutdown();
        outcome
    }

    #[test]
    fn test_default_scripts_run_cleanly() {
        for mode in Mode::ALL {
            let outcome = run(mode, default_script(mode));
            assert!(matches!(outcome, ExecutionOutcome::Completed), "{mode}: {outcome:?}");
        }
    }

    #[test]
    fn test_every_drawing_example_runs_cleanly() {
        for preset in DRAWING_EXAMPLES {
            let outcome = run(Mode::Drawing, preset.source);
            assert!(matches!(outcome, ExecutionOutcome::Completed), "{}: {outcome:?}", preset.name);
        }
    }

    #[test]
    fn test_cursor_wraps_both_ways() {
        let mut cursor = ExampleCursor::new();
        assert_eq!(cursor.previous().name, DRAWING_EXAMPLES[DRAWING_EXAMPLES.len() - 1].name);
        assert_eq!(cursor.next().name, DRAWING_EXAMPLES[0].name);
        for _ in 0..DRAWING_EXAMPLES.len() {
            cursor.next();
        }
        assert_eq!(cursor.index(), 0);
    }
}
