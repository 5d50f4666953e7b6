use super::{Paint, Surface};

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    SetPaint(Paint),
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
    },
    Path {
        points: Vec<(f32, f32)>,
        width: f32,
    },
}

/// A [`Surface`] that records drawing commands instead of rasterizing them.
///
/// Backs the command-line demo and the rendering tests; real hosts provide a
/// GPU or canvas-backed implementation instead.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    logical: (f32, f32),
    backing: (u32, u32),
    path: Vec<(f32, f32)>,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            logical: (width as f32, height as f32),
            backing: (width, height),
            path: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Simulates a host resize: updates both the logical and the backing
    /// dimensions.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.logical = (width as f32, height as f32);
        self.backing = (width, height);
    }

    /// Simulates a DPI change: the backing store scales while the logical
    /// dimensions stay put.
    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.backing = (
            (self.logical.0 * ratio) as u32,
            (self.logical.1 * ratio) as u32,
        );
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drains the recorded commands, typically called between ticks.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Surface for RecordingSurface {
    fn logical_size(&self) -> (f32, f32) {
        self.logical
    }

    fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn set_paint(&mut self, paint: Paint) {
        self.commands.push(DrawCommand::SetPaint(paint));
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
        });
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        self.commands.push(DrawCommand::Circle { cx, cy, radius });
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.path.push((x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path.push((x, y));
    }

    fn stroke(&mut self, width: f32) {
        self.commands.push(DrawCommand::Path {
            points: std::mem::take(&mut self.path),
            width,
        });
    }
}
