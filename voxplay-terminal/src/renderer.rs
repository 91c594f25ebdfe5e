/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Point3, Vector3};
use std::io::Write;
use voxplay_core::{FlyCamera, Uniforms, VertexBuffer};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Light not reaching a face still leaves this much brightness
const AMBIENT: f32 = 0.15;

/// ASCII renderer that converts vertex buffers to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    /// Light position in model space
    light: Point3<f32>,
    background: Color,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            light: Point3::new(30.0, 30.0, 60.0),
            background: Color::Reset,
        }
    }

    pub fn with_light(mut self, light: Point3<f32>) -> Self {
        self.light = light;
        self
    }

    /// Sky colour from a linear RGB triple
    pub fn with_background(mut self, [r, g, b]: [f32; 3]) -> Self {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.background = Color::Rgb {
            r: channel(r),
            g: channel(g),
            b: channel(b),
        };
        self
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        let size = width * height;
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.char_buffer = vec![' '; size];
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Character drawn at a cell, `None` outside the screen
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.char_buffer[y * self.width + x])
    }

    pub fn render(&mut self, buffer: &VertexBuffer, uniforms: &Uniforms) {
        let light = uniforms.mv.transform_point(&self.light);
        for (positions, normal) in buffer.triangles() {
            self.render_triangle(&positions, &normal, &light, uniforms);
        }
    }

    fn render_triangle(
        &mut self,
        positions: &[Point3<f32>; 3],
        normal: &Vector3<f32>,
        light: &Point3<f32>,
        uniforms: &Uniforms,
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (coords, position) in screen_coords.iter_mut().zip(positions) {
            match FlyCamera::project_to_screen(
                position,
                &uniforms.mvp,
                self.width as u32,
                self.height as u32,
            ) {
                Some(projected) => *coords = projected,
                None => return, // Triangle is clipped
            }
        }

        // Shade in view space: the light position is carried through MV like the geometry
        let view_normal = uniforms.mv.transform_vector(normal);
        let center = Point3::from(
            positions
                .iter()
                .map(|p| uniforms.mv.transform_point(p).coords)
                .sum::<Vector3<f32>>()
                / 3.0,
        );

        // Faces pointing away from the camera
        if view_normal.dot(&center.coords) >= 0.0 {
            return;
        }

        let to_light = (*light - center).normalize();
        let diffuse = view_normal.try_normalize(f32::EPSILON).map_or(0.0, |n| n.dot(&to_light));
        let brightness = AMBIENT + (1.0 - AMBIENT) * diffuse.max(0.0);

        self.rasterize_triangle(&screen_coords, shade(brightness));
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char) {
        let [v0, v1, v2] = *coords;

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    // Degenerate on screen
                    return;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.queue(SetBackgroundColor(self.background))?;
        for y in 0..self.height {
            let mut current = None;
            for x in 0..self.width {
                let c = self.char_buffer[y * self.width + x];
                let color = color_of(c);
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Ramp character for a brightness in `0..=1`
fn shade(brightness: f32) -> char {
    let index = (brightness.clamp(0.0, 1.0) * (LUMINOSITY_RAMP.len() - 1) as f32).round();
    LUMINOSITY_RAMP[index as usize]
}

fn color_of(c: char) -> Color {
    match c {
        ' ' => Color::Reset,
        '.' | ':' => Color::DarkGreen,
        '-' | '=' => Color::Green,
        '+' | '*' => Color::DarkYellow,
        '#' | '%' | '@' => Color::White,
        _ => Color::White,
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
