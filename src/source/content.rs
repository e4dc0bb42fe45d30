//! Content-stream interpretation for the lopdf backend.
//!
//! This is a deliberately small interpreter: it tracks exactly the state
//! needed to report filled shapes, image placements, and character boxes,
//! meaning the CTM stack, the fill colour, the path bounding box, and the
//! text matrices. It is not a renderer. Single-byte encodings only; multi-byte
//! CID text degrades to per-byte glyphs with fallback widths.
//!
//! Everything emitted here is converted to top-down page coordinates
//! before it leaves this module.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use once_cell::sync::Lazy;

use crate::error::{UnredactError, UnredactResult};
use crate::geometry::Color;
use crate::source::{CharSpan, FillShape, ImageBlock};

/// Everything the walker recovers from one page.
#[derive(Debug, Clone, Default)]
pub struct PagePrimitives {
    pub fills: Vec<FillShape>,
    pub images: Vec<ImageBlock>,
    pub chars: Vec<CharSpan>,
}

/// Nested form XObjects are followed at most this deep.
const MAX_FORM_DEPTH: usize = 4;

/// Glyph-space width (1/1000 em) assumed when a font has no usable
/// `/Widths` entry for a code.
const FALLBACK_GLYPH_WIDTH: f64 = 500.0;

static EMPTY_RESOURCES: Lazy<Dictionary> = Lazy::new(Dictionary::new);

/// A PDF transformation matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f64, ty: f64) -> Matrix {
        Matrix {
            e: tx,
            f: ty,
            ..Matrix::IDENTITY
        }
    }

    /// `self` applied first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Length scale of the vertical unit vector, used as the effective
    /// font-size multiplier.
    fn vertical_scale(&self) -> f64 {
        self.c.hypot(self.d)
    }
}

/// Character widths of the font currently selected by `Tf`.
#[derive(Debug, Clone, Default)]
struct FontMetrics {
    first_char: i64,
    widths: Vec<f64>,
}

impl FontMetrics {
    fn width_for(&self, code: u8) -> f64 {
        let idx = code as i64 - self.first_char;
        if idx >= 0 {
            if let Some(w) = self.widths.get(idx as usize) {
                return *w;
            }
        }
        FALLBACK_GLYPH_WIDTH
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: Option<Color>,
    font: FontMetrics,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    hscale: f64,
    leading: f64,
}

impl GraphicsState {
    fn new() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            fill: Some((0.0, 0.0, 0.0)),
            font: FontMetrics::default(),
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            hscale: 1.0,
            leading: 0.0,
        }
    }
}

/// Bounding box accumulated in device space for the current path.
#[derive(Debug, Clone, Copy)]
struct BoundsAcc {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl BoundsAcc {
    fn add(acc: &mut Option<BoundsAcc>, (x, y): (f64, f64)) {
        match acc {
            Some(b) => {
                b.min_x = b.min_x.min(x);
                b.min_y = b.min_y.min(y);
                b.max_x = b.max_x.max(x);
                b.max_y = b.max_y.max(y);
            }
            None => {
                *acc = Some(BoundsAcc {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                })
            }
        }
    }
}

struct Walker<'a> {
    doc: &'a Document,
    page_height: f64,
    out: PagePrimitives,
    gs: GraphicsState,
    gs_stack: Vec<GraphicsState>,
    // Active between BT/ET.
    tm: Matrix,
    tlm: Matrix,
    path: Option<BoundsAcc>,
}

/// Interprets one page's content and returns its drawing/text primitives.
pub fn walk_page(
    doc: &Document,
    page_id: ObjectId,
    page_index: usize,
    page_height: f64,
) -> UnredactResult<PagePrimitives> {
    let content = doc
        .get_and_decode_page_content(page_id)
        .map_err(|e| UnredactError::page(page_index, e))?;
    let resources = page_resources(doc, page_id);

    let mut walker = Walker {
        doc,
        page_height,
        out: PagePrimitives::default(),
        gs: GraphicsState::new(),
        gs_stack: Vec::new(),
        tm: Matrix::IDENTITY,
        tlm: Matrix::IDENTITY,
        path: None,
    };
    walker.interpret(&content, resources, 0);
    Ok(walker.out)
}

/// Resolves a page's `/Resources`, falling back to an empty dictionary.
fn page_resources(doc: &Document, page_id: ObjectId) -> &Dictionary {
    let (dict, ids) = doc.get_page_resources(page_id);
    if let Some(dict) = dict {
        return dict;
    }
    for id in ids {
        if let Ok(obj) = doc.get_object(id) {
            if let Ok(dict) = obj.as_dict() {
                return dict;
            }
        }
    }
    &EMPTY_RESOURCES
}

/// Follows an indirect reference to its target, or returns the object
/// itself when it is direct.
fn resolved<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn as_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

/// Interprets the numeric operands of a colour operator as RGB.
fn color_from_components(components: &[f64]) -> Option<Color> {
    match components {
        [g] => Some((*g, *g, *g)),
        [r, g, b] => Some((*r, *g, *b)),
        [c, m, y, k] => {
            // Naive CMYK conversion; precise profiles are irrelevant for a
            // darkness test.
            let r = (1.0 - c) * (1.0 - k);
            let g = (1.0 - m) * (1.0 - k);
            let b = (1.0 - y) * (1.0 - k);
            Some((r, g, b))
        }
        _ => None,
    }
}

impl Walker<'_> {
    fn interpret(&mut self, content: &Content, resources: &Dictionary, depth: usize) {
        for op in &content.operations {
            self.apply_op(op, resources, depth);
        }
    }

    /// Dispatches one operator. Malformed operand lists are skipped rather
    /// than failing the page.
    fn apply_op(&mut self, op: &Operation, resources: &Dictionary, depth: usize) {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => self.gs_stack.push(self.gs.clone()),
            "Q" => {
                if let Some(prev) = self.gs_stack.pop() {
                    self.gs = prev;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.gs.ctm = m.then(&self.gs.ctm);
                }
            }

            // Fill colour. Stroke colours are irrelevant here.
            "g" | "rg" | "k" | "sc" | "scn" => {
                let nums: Vec<f64> = operands.iter().filter_map(as_f64).collect();
                if nums.len() == operands.len() {
                    self.gs.fill = color_from_components(&nums);
                } else {
                    // Pattern or named colour: unknowable, never dark.
                    self.gs.fill = None;
                }
            }
            "cs" => self.gs.fill = None,

            // Path construction.
            "re" => {
                if let [x, y, w, h] = operands
                    .iter()
                    .filter_map(as_f64)
                    .collect::<Vec<_>>()
                    .as_slice()
                {
                    for (px, py) in [(*x, *y), (x + w, *y), (*x, y + h), (x + w, y + h)] {
                        let p = self.gs.ctm.apply(px, py);
                        BoundsAcc::add(&mut self.path, p);
                    }
                }
            }
            "m" | "l" => self.add_path_points(operands, 1),
            "v" | "y" => self.add_path_points(operands, 2),
            "c" => self.add_path_points(operands, 3),

            // Path painting: fills emit a shape, everything else discards.
            "f" | "F" | "f*" | "b" | "b*" | "B" | "B*" => self.flush_fill(),
            "n" | "S" | "s" => self.path = None,

            // Text objects.
            "BT" => {
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "ET" => {}
            "Tf" => {
                if operands.len() == 2 {
                    if let (Ok(name), Some(size)) = (operands[0].as_name(), as_f64(&operands[1])) {
                        self.gs.font = self.load_font(resources, name);
                        self.gs.font_size = size;
                    }
                }
            }
            "Td" => {
                if let [tx, ty] = operands
                    .iter()
                    .filter_map(as_f64)
                    .collect::<Vec<_>>()
                    .as_slice()
                {
                    self.text_move(*tx, *ty);
                }
            }
            "TD" => {
                if let [tx, ty] = operands
                    .iter()
                    .filter_map(as_f64)
                    .collect::<Vec<_>>()
                    .as_slice()
                {
                    self.gs.leading = -ty;
                    self.text_move(*tx, *ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "T*" => self.text_move(0.0, -self.gs.leading),
            "TL" => {
                if let Some(l) = operands.first().and_then(as_f64) {
                    self.gs.leading = l;
                }
            }
            "Tc" => {
                if let Some(v) = operands.first().and_then(as_f64) {
                    self.gs.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = operands.first().and_then(as_f64) {
                    self.gs.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = operands.first().and_then(as_f64) {
                    self.gs.hscale = v / 100.0;
                }
            }

            // Text showing.
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let bytes = bytes.clone();
                    self.show_text(&bytes);
                }
            }
            "'" => {
                self.text_move(0.0, -self.gs.leading);
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let bytes = bytes.clone();
                    self.show_text(&bytes);
                }
            }
            "\"" => {
                if operands.len() == 3 {
                    if let (Some(aw), Some(ac)) = (as_f64(&operands[0]), as_f64(&operands[1])) {
                        self.gs.word_spacing = aw;
                        self.gs.char_spacing = ac;
                    }
                    self.text_move(0.0, -self.gs.leading);
                    if let Object::String(bytes, _) = &operands[2] {
                        let bytes = bytes.clone();
                        self.show_text(&bytes);
                    }
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let items = items.clone();
                    for item in &items {
                        match item {
                            Object::String(bytes, _) => self.show_text(bytes),
                            other => {
                                if let Some(adj) = as_f64(other) {
                                    let tx =
                                        -adj / 1000.0 * self.gs.font_size * self.gs.hscale;
                                    self.tm = Matrix::translation(tx, 0.0).then(&self.tm);
                                }
                            }
                        }
                    }
                }
            }

            // XObjects: images become candidate blocks, forms are followed.
            "Do" => {
                if let Some(Ok(name)) = operands.first().map(|o| o.as_name()) {
                    self.invoke_xobject(resources, name, depth);
                }
            }
            // Inline image: placement is the CTM unit square, like any
            // other image block.
            "BI" => self.emit_image(),

            _ => {}
        }
    }

    fn add_path_points(&mut self, operands: &[Object], point_count: usize) {
        let nums: Vec<f64> = operands.iter().filter_map(as_f64).collect();
        if nums.len() != point_count * 2 {
            return;
        }
        for pair in nums.chunks(2) {
            let p = self.gs.ctm.apply(pair[0], pair[1]);
            BoundsAcc::add(&mut self.path, p);
        }
    }

    fn flush_fill(&mut self) {
        let bounds = match self.path.take() {
            Some(b) => b,
            None => return,
        };
        let color = match self.gs.fill {
            Some(c) => c,
            // Unknown colour space: cannot be classified, never emitted.
            None => return,
        };
        self.out.fills.push(FillShape {
            x0: bounds.min_x,
            top: self.page_height - bounds.max_y,
            x1: bounds.max_x,
            bottom: self.page_height - bounds.min_y,
            color,
        });
    }

    fn emit_image(&mut self) {
        let mut bounds = None;
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
            BoundsAcc::add(&mut bounds, self.gs.ctm.apply(x, y));
        }
        if let Some(b) = bounds {
            self.out.images.push(ImageBlock {
                x0: b.min_x,
                top: self.page_height - b.max_y,
                x1: b.max_x,
                bottom: self.page_height - b.min_y,
            });
        }
    }

    fn invoke_xobject(&mut self, resources: &Dictionary, name: &[u8], depth: usize) {
        let xobject = match resources
            .get(b"XObject")
            .map(|o| resolved(self.doc, o))
            .ok()
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(name).ok())
        {
            Some(obj) => resolved(self.doc, obj),
            None => return,
        };
        let stream = match xobject.as_stream() {
            Ok(s) => s,
            Err(_) => return,
        };
        let subtype = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok());

        match subtype {
            Some(b"Image") => self.emit_image(),
            Some(b"Form") if depth < MAX_FORM_DEPTH => {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                let content = match Content::decode(&data) {
                    Ok(c) => c,
                    Err(_) => return,
                };
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .map(|o| resolved(self.doc, o))
                    .ok()
                    .and_then(|o| o.as_dict().ok())
                    .unwrap_or(resources);

                let saved = self.gs.clone();
                if let Some(m) = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|o| o.as_array().ok())
                    .and_then(|a| matrix_operands(a))
                {
                    self.gs.ctm = m.then(&self.gs.ctm);
                }
                self.interpret(&content, form_resources, depth + 1);
                self.gs = saved;
            }
            _ => {}
        }
    }

    fn text_move(&mut self, tx: f64, ty: f64) {
        self.tlm = Matrix::translation(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }

    /// Emits one `CharSpan` per byte of a shown string and advances the
    /// text matrix. Bytes map to chars as latin-1.
    fn show_text(&mut self, bytes: &[u8]) {
        for &code in bytes {
            let trm = self.tm.then(&self.gs.ctm);
            let (ox, oy) = trm.apply(0.0, 0.0);

            let w0 = self.gs.font.width_for(code) / 1000.0;
            let mut tx = (w0 * self.gs.font_size + self.gs.char_spacing) * self.gs.hscale;
            if code == b' ' {
                tx += self.gs.word_spacing * self.gs.hscale;
            }

            self.tm = Matrix::translation(tx, 0.0).then(&self.tm);
            let (nx, _) = self.tm.then(&self.gs.ctm).apply(0.0, 0.0);

            let size = self.gs.font_size * trm.vertical_scale();
            // Nominal 80/20 ascent/descent split around the baseline.
            let y_high = oy + size * 0.8;
            let y_low = oy - size * 0.2;

            self.out.chars.push(CharSpan {
                text: code as char,
                x0: ox.min(nx),
                top: self.page_height - y_high,
                x1: ox.max(nx),
                bottom: self.page_height - y_low,
                size,
            });
        }
    }

    /// Resolves a `Tf` font name to its width table.
    fn load_font(&self, resources: &Dictionary, name: &[u8]) -> FontMetrics {
        let font_dict = match resources
            .get(b"Font")
            .map(|o| resolved(self.doc, o))
            .ok()
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(name).ok())
            .map(|o| resolved(self.doc, o))
            .and_then(|o| o.as_dict().ok())
        {
            Some(d) => d,
            None => return FontMetrics::default(),
        };

        let first_char = font_dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| resolved(self.doc, o).as_i64().ok())
            .unwrap_or(0);
        let widths = font_dict
            .get(b"Widths")
            .map(|o| resolved(self.doc, o))
            .ok()
            .and_then(|o| o.as_array().ok())
            .map(|a| a.iter().filter_map(as_f64).collect())
            .unwrap_or_default();

        FontMetrics { first_char, widths }
    }
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    let nums: Vec<f64> = operands.iter().filter_map(as_f64).collect();
    if nums.len() != 6 {
        return None;
    }
    Some(Matrix {
        a: nums[0],
        b: nums[1],
        c: nums[2],
        d: nums[3],
        e: nums[4],
        f: nums[5],
    })
}
