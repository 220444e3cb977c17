//! Built-in rasterizer for vector label art.
//!
//! Interprets the fill subset of the PDF content stream: graphics state
//! save/restore, `cm`, device fill colors, path construction, fill painting
//! and nested Form XObjects. A page that needs text, images, shadings or
//! strokes is refused with `LayoutError::Render` rather than drawn partially.

use super::{PageRasterizer, MAX_RENDER_PIXELS, WHITE};
use crate::document::{number, resolve, stream_data, SourceDocument};
use crate::error::LayoutError;
use crate::geometry::Transform;
use image::{imageops, Rgb, RgbImage};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};

const MAX_FORM_DEPTH: usize = 8;

/// Line segments per flattened Bézier curve
const CURVE_SEGMENTS: usize = 16;

#[derive(Debug, Default, Clone, Copy)]
pub struct BasicRasterizer;

impl BasicRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl PageRasterizer for BasicRasterizer {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn rasterize(&self, source: &SourceDocument<'_>, dpi: f32) -> Result<RgbImage, LayoutError> {
        let page_box = source.page_box()?;
        let scale = dpi as f64 / 72.0;

        let width = (page_box.width * scale).round().max(1.0) as u32;
        let height = (page_box.height * scale).round().max(1.0) as u32;
        if width as u64 * height as u64 > MAX_RENDER_PIXELS {
            return Err(LayoutError::Render(format!(
                "Page renders to {}x{} pixels at {} dpi, above the {} pixel limit",
                width, height, dpi, MAX_RENDER_PIXELS
            )));
        }

        // Page space to pixel space: scale, flip y, move the box origin to (0, 0)
        let base = Transform::new(
            scale,
            0.0,
            0.0,
            -scale,
            -page_box.x * scale,
            page_box.top() * scale,
        );

        let doc = source.document();
        let resources_obj = source.resources()?;
        let resources = resources_obj
            .as_ref()
            .and_then(|r| resolve(doc, r).as_dict().ok());

        let mut painter = Painter {
            doc,
            canvas: RgbImage::from_pixel(width, height, WHITE),
            skipped: 0,
        };
        painter.run(&source.content()?, resources, base, 0)?;

        // A label missing its text or artwork is wrong output, not a degraded one
        if painter.skipped > 0 {
            return Err(LayoutError::Render(format!(
                "Label uses {} text, image or stroke operation(s) the built-in rasterizer \
                 cannot draw; use the vector strategy or a pdfium-enabled build",
                painter.skipped
            )));
        }

        Ok(match source.rotation()? {
            90 => imageops::rotate90(&painter.canvas),
            180 => imageops::rotate180(&painter.canvas),
            270 => imageops::rotate270(&painter.canvas),
            _ => painter.canvas,
        })
    }
}

#[derive(Clone, Copy)]
struct GraphicsState {
    ctm: Transform,
    fill: Rgb<u8>,
}

#[derive(Clone, Copy, PartialEq)]
enum FillRule {
    NonZero,
    EvenOdd,
}

/// Path in pixel space, flattened to polygons
#[derive(Default)]
struct Path {
    subpaths: Vec<Vec<(f64, f64)>>,
    current: Option<(f64, f64)>,
}

impl Path {
    fn move_to(&mut self, p: (f64, f64)) {
        self.subpaths.push(vec![p]);
        self.current = Some(p);
    }

    fn line_to(&mut self, p: (f64, f64)) {
        match self.subpaths.last_mut() {
            Some(sub) => sub.push(p),
            None => self.subpaths.push(vec![p]),
        }
        self.current = Some(p);
    }

    fn curve_to(&mut self, c1: (f64, f64), c2: (f64, f64), end: (f64, f64)) {
        let start = match self.current {
            Some(p) => p,
            None => {
                self.move_to(end);
                return;
            }
        };
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f64 / CURVE_SEGMENTS as f64;
            let mt = 1.0 - t;
            let x = mt * mt * mt * start.0
                + 3.0 * mt * mt * t * c1.0
                + 3.0 * mt * t * t * c2.0
                + t * t * t * end.0;
            let y = mt * mt * mt * start.1
                + 3.0 * mt * mt * t * c1.1
                + 3.0 * mt * t * t * c2.1
                + t * t * t * end.1;
            self.line_to((x, y));
        }
    }

    fn close(&mut self) {
        // Filling closes every subpath implicitly; return to the start point
        if let Some(first) = self.subpaths.last().and_then(|s| s.first().copied()) {
            self.current = Some(first);
        }
    }

    fn clear(&mut self) {
        self.subpaths.clear();
        self.current = None;
    }
}

struct Painter<'d> {
    doc: &'d Document,
    canvas: RgbImage,
    skipped: usize,
}

impl<'d> Painter<'d> {
    fn run(
        &mut self,
        content: &[u8],
        resources: Option<&'d Dictionary>,
        ctm: Transform,
        depth: usize,
    ) -> Result<(), LayoutError> {
        let content = Content::decode(content)
            .map_err(|e| LayoutError::Render(format!("Unreadable content stream: {}", e)))?;

        let mut state = GraphicsState {
            ctm,
            fill: Rgb([0, 0, 0]),
        };
        let mut stack = Vec::new();
        let mut path = Path::default();

        for op in &content.operations {
            let args: Vec<f64> = op.operands.iter().filter_map(number).collect();
            let point = |i: usize, state: &GraphicsState| state.ctm.apply(args[i], args[i + 1]);

            match op.operator.as_str() {
                "q" => stack.push(state),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "cm" if args.len() == 6 => {
                    let m = Transform::new(args[0], args[1], args[2], args[3], args[4], args[5]);
                    state.ctm = m.then(&state.ctm);
                }
                "g" if args.len() == 1 => state.fill = gray(args[0]),
                "rg" if args.len() == 3 => state.fill = rgb(args[0], args[1], args[2]),
                "k" if args.len() == 4 => state.fill = cmyk(args[0], args[1], args[2], args[3]),
                "sc" | "scn" => match args.len() {
                    1 => state.fill = gray(args[0]),
                    3 => state.fill = rgb(args[0], args[1], args[2]),
                    4 => state.fill = cmyk(args[0], args[1], args[2], args[3]),
                    _ => self.skipped += 1,
                },
                "m" if args.len() == 2 => path.move_to(point(0, &state)),
                "l" if args.len() == 2 => path.line_to(point(0, &state)),
                "c" if args.len() == 6 => {
                    path.curve_to(point(0, &state), point(2, &state), point(4, &state))
                }
                "v" if args.len() == 4 => {
                    let c1 = path.current.unwrap_or_else(|| point(0, &state));
                    path.curve_to(c1, point(0, &state), point(2, &state));
                }
                "y" if args.len() == 4 => {
                    let end = point(2, &state);
                    path.curve_to(point(0, &state), end, end);
                }
                "re" if args.len() == 4 => {
                    let (x, y, w, h) = (args[0], args[1], args[2], args[3]);
                    path.move_to(state.ctm.apply(x, y));
                    path.line_to(state.ctm.apply(x + w, y));
                    path.line_to(state.ctm.apply(x + w, y + h));
                    path.line_to(state.ctm.apply(x, y + h));
                    path.close();
                }
                "h" => path.close(),
                "f" | "F" | "B" | "b" => {
                    if op.operator == "B" || op.operator == "b" {
                        self.skipped += 1;
                    }
                    self.fill(&path, state.fill, FillRule::NonZero);
                    path.clear();
                }
                "f*" | "B*" | "b*" => {
                    if op.operator != "f*" {
                        self.skipped += 1;
                    }
                    self.fill(&path, state.fill, FillRule::EvenOdd);
                    path.clear();
                }
                "S" | "s" => {
                    self.skipped += 1;
                    path.clear();
                }
                "n" => path.clear(),
                "Tj" | "TJ" | "'" | "\"" | "BI" | "sh" => self.skipped += 1,
                "Do" => {
                    if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
                        self.draw_xobject(name, resources, &state, depth)?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn draw_xobject(
        &mut self,
        name: &[u8],
        resources: Option<&'d Dictionary>,
        state: &GraphicsState,
        depth: usize,
    ) -> Result<(), LayoutError> {
        let doc = self.doc;
        let stream = match resources
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|x| resolve(doc, x).as_dict().ok())
            .and_then(|x| x.get(name).ok())
            .and_then(|s| resolve(doc, s).as_stream().ok())
        {
            Some(stream) => stream,
            None => {
                tracing::debug!(name = %String::from_utf8_lossy(name), "unknown xobject");
                return Ok(());
            }
        };

        let is_form = matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Form");
        if !is_form {
            self.skipped += 1;
            return Ok(());
        }

        if depth >= MAX_FORM_DEPTH {
            return Err(LayoutError::Render(format!(
                "Form XObjects nested deeper than {}",
                MAX_FORM_DEPTH
            )));
        }

        let form_matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|m| resolve(doc, m).as_array().ok())
            .map(|m| m.iter().filter_map(number).collect::<Vec<_>>())
            .filter(|m| m.len() == 6)
            .map(|m| Transform::new(m[0], m[1], m[2], m[3], m[4], m[5]))
            .unwrap_or(Transform::IDENTITY);

        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|r| resolve(doc, r).as_dict().ok())
            .or(resources);

        let content = stream_data(stream)?;

        self.run(
            &content,
            form_resources,
            form_matrix.then(&state.ctm),
            depth + 1,
        )
    }

    /// Scanline fill sampling pixel centers
    fn fill(&mut self, path: &Path, color: Rgb<u8>, rule: FillRule) {
        let mut edges = Vec::new();
        for sub in &path.subpaths {
            if sub.len() < 2 {
                continue;
            }
            for i in 0..sub.len() {
                let p = sub[i];
                let q = sub[(i + 1) % sub.len()];
                if p.1 != q.1 {
                    edges.push((p, q));
                }
            }
        }
        if edges.is_empty() {
            return;
        }

        let (width, height) = self.canvas.dimensions();
        let min_y = edges
            .iter()
            .map(|(p, q)| p.1.min(q.1))
            .fold(f64::INFINITY, f64::min);
        let max_y = edges
            .iter()
            .map(|(p, q)| p.1.max(q.1))
            .fold(f64::NEG_INFINITY, f64::max);

        let first_row = (min_y - 0.5).ceil().max(0.0) as u32;
        let last_row = ((max_y - 0.5).floor().min(height as f64 - 1.0)).max(-1.0);
        if last_row < 0.0 {
            return;
        }
        let last_row = last_row as u32;

        let mut crossings: Vec<(f64, i32)> = Vec::new();
        for row in first_row..=last_row {
            let y = row as f64 + 0.5;
            crossings.clear();
            for (p, q) in &edges {
                let (lo, hi) = if p.1 < q.1 { (p.1, q.1) } else { (q.1, p.1) };
                if y >= lo && y < hi {
                    let x = p.0 + (y - p.1) * (q.0 - p.0) / (q.1 - p.1);
                    let dir = if q.1 > p.1 { 1 } else { -1 };
                    crossings.push((x, dir));
                }
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            for pair in crossings.windows(2) {
                let (x0, dir) = pair[0];
                let x1 = pair[1].0;
                winding += dir;
                let inside = match rule {
                    FillRule::NonZero => winding != 0,
                    FillRule::EvenOdd => winding % 2 != 0,
                };
                if !inside {
                    continue;
                }
                let start = (x0 - 0.5).ceil().max(0.0) as u32;
                let end = (x1 - 0.5).ceil().min(width as f64).max(0.0) as u32;
                for col in start..end {
                    self.canvas.put_pixel(col, row, color);
                }
            }
        }
    }
}

fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn gray(g: f64) -> Rgb<u8> {
    let v = channel(g);
    Rgb([v, v, v])
}

fn rgb(r: f64, g: f64, b: f64) -> Rgb<u8> {
    Rgb([channel(r), channel(g), channel(b)])
}

fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Rgb<u8> {
    let k = k.clamp(0.0, 1.0);
    rgb(
        (1.0 - c.clamp(0.0, 1.0)) * (1.0 - k),
        (1.0 - m.clamp(0.0, 1.0)) * (1.0 - k),
        (1.0 - y.clamp(0.0, 1.0)) * (1.0 - k),
    )
}
