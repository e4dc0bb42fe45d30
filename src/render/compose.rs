//! Low-level lopdf composition helpers.
//!
//! Everything here speaks raw PDF objects: cross-document imports, form
//! XObject wrapping, annotation and font dictionaries, content-stream
//! splicing. The renderer in the parent module decides what to draw;
//! this module only knows how.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::geometry::{Color, Rect};
use crate::layout::Line;

/// Fraction of the font size separating a top-anchored box from its
/// approximate glyph baseline.
pub const BASELINE_RATIO: f64 = 0.85;

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

/// Deep-copies an object graph from `src` into `dst`, remapping every
/// reference. The map doubles as the cycle guard: a reference already
/// mapped is returned as-is, so self-referential page trees terminate.
pub fn import_object(
    dst: &mut Document,
    src: &Document,
    obj: &Object,
    map: &mut HashMap<ObjectId, ObjectId>,
) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference(import_ref(dst, src, *id, map)),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| import_object(dst, src, item, map))
                .collect(),
        ),
        Object::Dictionary(dict) => Object::Dictionary(import_dictionary(dst, src, dict, map)),
        Object::Stream(stream) => {
            // The imported dictionary keeps /Filter; the bytes are copied
            // verbatim so the declared encoding still holds.
            let dict = import_dictionary(dst, src, &stream.dict, map);
            Object::Stream(Stream::new(dict, stream.content.clone()))
        }
        other => other.clone(),
    }
}

pub fn import_ref(
    dst: &mut Document,
    src: &Document,
    id: ObjectId,
    map: &mut HashMap<ObjectId, ObjectId>,
) -> ObjectId {
    if let Some(mapped) = map.get(&id) {
        return *mapped;
    }
    let new_id = dst.new_object_id();
    map.insert(id, new_id);
    let imported = match src.get_object(id) {
        Ok(obj) => import_object(dst, src, obj, map),
        // A dangling reference in the source stays dangling as Null.
        Err(_) => Object::Null,
    };
    dst.objects.insert(new_id, imported);
    new_id
}

fn import_dictionary(
    dst: &mut Document,
    src: &Document,
    dict: &Dictionary,
    map: &mut HashMap<ObjectId, ObjectId>,
) -> Dictionary {
    let mut out = Dictionary::new();
    for (key, value) in dict.iter() {
        // Parent pointers would drag the entire page tree across.
        if key == b"Parent" {
            continue;
        }
        out.set(key.clone(), import_object(dst, src, value, map));
    }
    out
}

/// Wraps one source page as a form XObject in `dst`, so the page can be
/// placed as a unit on another page without rasterizing it.
pub fn page_as_form_xobject(
    dst: &mut Document,
    src: &Document,
    page_id: ObjectId,
    width: f64,
    height: f64,
) -> lopdf::Result<ObjectId> {
    let content = src.get_page_content(page_id)?;

    let (direct, resource_ids) = src.get_page_resources(page_id);
    let mut resources = Dictionary::new();
    if let Some(dict) = direct {
        for (key, value) in dict.iter() {
            resources.set(key.clone(), value.clone());
        }
    }
    for id in resource_ids {
        if let Ok(dict) = src.get_dictionary(id) {
            for (key, value) in dict.iter() {
                resources.set(key.clone(), value.clone());
            }
        }
    }

    let mut map = HashMap::new();
    let resources = import_dictionary(dst, src, &resources, &mut map);

    let form = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => 1,
            "BBox" => vec![real(0.0), real(0.0), real(width), real(height)],
            "Resources" => Object::Dictionary(resources),
        },
        content,
    );
    Ok(dst.add_object(form))
}

/// Built-in Helvetica, WinAnsi-encoded. No embedding needed for the 14
/// standard faces.
pub fn helvetica_font() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Degrades text to the single-byte range the standard fonts cover.
/// Characters outside latin-1 become `?`.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c as u8 } else { b'?' })
        .collect()
}

/// Text-drawing operations for one reconstructed line.
///
/// `top` is measured from the page's top edge; the emitted coordinates are
/// PDF-native (origin bottom-left) with the baseline nudged down from the
/// box top by [`BASELINE_RATIO`] of the font size.
pub fn line_text_ops(
    line: &Line,
    x_offset: f64,
    page_height: f64,
    color: Color,
    font_name: &str,
) -> Vec<Operation> {
    let baseline = page_height - (line.top + BASELINE_RATIO * line.font_size);
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(font_name.into()), real(line.font_size)],
        ),
        Operation::new("rg", vec![real(color.0), real(color.1), real(color.2)]),
        Operation::new("Td", vec![real(line.x0 + x_offset), real(baseline)]),
        Operation::new("Tj", vec![Object::string_literal(encode_latin1(&line.text))]),
        Operation::new("ET", vec![]),
    ]
}

/// Splices drawing operations after a page's existing content.
///
/// The original content is bracketed by a lone `q` stream before and a
/// balancing `Q` in the overlay stream, so graphics state left dirty by
/// the page (a common real-world artifact) cannot skew the overlay.
pub fn append_page_overlay(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> lopdf::Result<()> {
    let mut wrapped = vec![Operation::new("Q", vec![]), Operation::new("q", vec![])];
    wrapped.extend(operations);
    wrapped.push(Operation::new("Q", vec![]));

    let prefix = Stream::new(Dictionary::new(), b"q\n".to_vec());
    let suffix = Stream::new(
        Dictionary::new(),
        Content {
            operations: wrapped,
        }
        .encode()?,
    );
    let prefix_id = doc.add_object(prefix);
    let suffix_id = doc.add_object(suffix);

    let existing = doc.get_dictionary(page_id)?.get(b"Contents").cloned();
    let mut contents: Vec<Object> = vec![prefix_id.into()];
    match existing {
        Ok(Object::Array(items)) => contents.extend(items),
        Ok(other @ Object::Reference(_)) => contents.push(other),
        Ok(stream @ Object::Stream(_)) => {
            // A directly embedded stream must become indirect to live in
            // the Contents array.
            let id = doc.add_object(stream);
            contents.push(id.into());
        }
        _ => {}
    }
    contents.push(suffix_id.into());

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", contents);
    Ok(())
}

/// Registers a font under `name` in a page's `/Resources /Font` table,
/// following indirection and creating missing tables as needed.
pub fn add_page_font(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    font: Dictionary,
) -> lopdf::Result<()> {
    let font_id = doc.add_object(font);

    let resources_entry = doc.get_dictionary(page_id)?.get(b"Resources").cloned();
    match resources_entry {
        Ok(Object::Reference(res_id)) => {
            set_font_entry(doc.get_object_mut(res_id)?.as_dict_mut()?, name, font_id);
        }
        Ok(Object::Dictionary(mut res)) => {
            set_font_entry(&mut res, name, font_id);
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Resources", res);
        }
        _ => {
            let mut res = Dictionary::new();
            set_font_entry(&mut res, name, font_id);
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Resources", res);
        }
    }
    Ok(())
}

fn set_font_entry(resources: &mut Dictionary, name: &str, font_id: ObjectId) {
    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(existing)) => existing.clone(),
        _ => Dictionary::new(),
    };
    fonts.set(name, font_id);
    resources.set("Font", fonts);
}

/// A translucent highlight annotation over `rect` (top-down coordinates).
pub fn highlight_annotation(rect: &Rect, page_height: f64, color: Color, opacity: f64) -> Dictionary {
    let y_low = page_height - rect.y1;
    let y_high = page_height - rect.y0;
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Highlight",
        "Rect" => vec![real(rect.x0), real(y_low), real(rect.x1), real(y_high)],
        // Quad order is the two top corners then the two bottom corners.
        "QuadPoints" => vec![
            real(rect.x0), real(y_high),
            real(rect.x1), real(y_high),
            real(rect.x0), real(y_low),
            real(rect.x1), real(y_low),
        ],
        "C" => vec![real(color.0), real(color.1), real(color.2)],
        "CA" => real(opacity),
        "F" => 4,
    }
}

/// Adds an annotation object to a page's `/Annots`, whether the array is
/// inline, indirect, or absent.
pub fn append_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    annotation: Dictionary,
) -> lopdf::Result<()> {
    let annot_id = doc.add_object(annotation);

    let existing = doc.get_dictionary(page_id)?.get(b"Annots").cloned();
    match existing {
        Ok(Object::Array(mut items)) => {
            items.push(annot_id.into());
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Annots", items);
        }
        Ok(Object::Reference(array_id)) => {
            if let Object::Array(items) = doc.get_object_mut(array_id)? {
                items.push(annot_id.into());
            }
        }
        _ => {
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Annots", vec![Object::from(annot_id)]);
        }
    }
    Ok(())
}
