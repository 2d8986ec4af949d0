//! Content stream walk: the colors in effect at each painting operator

use std::collections::BTreeSet;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};

use super::objects::{lookup, lookup_dict, name_of, number_of, resolve, stream_bytes};
use super::resources::{describe_color_space, page_resources, SpaceInfo, MAX_FORM_DEPTH};
use crate::color::RawColor;
use crate::source::{DrawOp, PageMarks, PaintKind, TextRun};

/// Kerning adjustment in a `TJ` array wide enough to read as a word gap
const TJ_SPACE_THRESHOLD: f64 = -200.0;

/// Color state of one side (fill or stroke)
#[derive(Debug, Clone)]
struct Paint {
    /// Operands of `sc`/`scn` are component values
    numeric: bool,
    /// `None` until a color operator runs
    color: Option<RawColor>,
    spot: Option<String>,
}

impl Default for Paint {
    fn default() -> Self {
        // The initial space is DeviceGray
        Self {
            numeric: true,
            color: None,
            spot: None,
        }
    }
}

impl Paint {
    fn set_device(&mut self, values: Vec<f32>) {
        self.numeric = true;
        self.spot = None;
        self.color = Some(RawColor::Components(values));
    }

    fn set_space(&mut self, info: SpaceInfo) {
        match info.components {
            Some(n) if info.is_numeric() => self.set_device(vec![0.0; n]),
            _ => {
                // A numeric space of unknown arity keeps its name until sc sets operands
                self.numeric = info.is_numeric();
                self.spot = match info.family.as_str() {
                    "Separation" => info.colorants.first().cloned(),
                    _ => None,
                };
                self.color = Some(info.raw);
            }
        }
    }

    fn set_components(&mut self, values: Vec<f32>) {
        if self.numeric && !values.is_empty() {
            self.color = Some(RawColor::Components(values));
        }
    }
}

#[derive(Debug, Clone, Default)]
struct GraphicsState {
    fill: Paint,
    stroke: Paint,
}

struct Walker<'a> {
    doc: &'a Document,
    marks: PageMarks,
    visited_forms: BTreeSet<ObjectId>,
}

/// Drawings and text runs of one page, forms included
pub(crate) fn page_marks(doc: &Document, page_id: ObjectId) -> Result<PageMarks, lopdf::Error> {
    let bytes = doc.get_page_content(page_id)?;
    let mut walker = Walker {
        doc,
        marks: PageMarks::default(),
        visited_forms: BTreeSet::new(),
    };
    walker.run(&bytes, page_resources(doc, page_id), GraphicsState::default(), 0)?;
    Ok(walker.marks)
}

fn numbers(operands: &[Object]) -> Vec<f32> {
    operands
        .iter()
        .filter_map(number_of)
        .map(|n| n as f32)
        .collect()
}

fn shown_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| **b >= 0x20 && **b != 0x7F)
        .map(|&b| b as char)
        .collect()
}

fn tj_text(items: &[Object]) -> String {
    let mut text = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => text.push_str(&shown_text(bytes)),
            other => {
                if number_of(other).is_some_and(|n| n <= TJ_SPACE_THRESHOLD) {
                    text.push(' ');
                }
            }
        }
    }
    text
}

impl<'a> Walker<'a> {
    fn run(
        &mut self,
        bytes: &[u8],
        resources: Option<&'a Dictionary>,
        mut state: GraphicsState,
        depth: usize,
    ) -> Result<(), lopdf::Error> {
        let content = Content::decode(bytes)?;
        let mut stack: Vec<GraphicsState> = Vec::new();

        for Operation { operator, operands } in &content.operations {
            match operator.as_str() {
                "q" => stack.push(state.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "g" | "rg" | "k" => state.fill.set_device(numbers(operands)),
                "G" | "RG" | "K" => state.stroke.set_device(numbers(operands)),
                "cs" => {
                    if let Some(info) = self.color_space(resources, operands) {
                        state.fill.set_space(info);
                    }
                }
                "CS" => {
                    if let Some(info) = self.color_space(resources, operands) {
                        state.stroke.set_space(info);
                    }
                }
                "sc" | "scn" => state.fill.set_components(numbers(operands)),
                "SC" | "SCN" => state.stroke.set_components(numbers(operands)),
                "f" | "F" | "f*" => self.paint(PaintKind::Fill, &state),
                "S" | "s" => self.paint(PaintKind::Stroke, &state),
                "B" | "B*" | "b" | "b*" => self.paint(PaintKind::FillStroke, &state),
                "Tj" | "'" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.text(shown_text(bytes), &state);
                    }
                }
                "\"" => {
                    if let Some(Object::String(bytes, _)) = operands.get(2) {
                        self.text(shown_text(bytes), &state);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.text(tj_text(items), &state);
                    }
                }
                "Do" if depth < MAX_FORM_DEPTH => self.form(resources, operands, &state, depth),
                _ => {}
            }
        }
        Ok(())
    }

    fn color_space(&self, resources: Option<&'a Dictionary>, operands: &[Object]) -> Option<SpaceInfo> {
        let name = operands.first()?;
        let key = name.as_name().ok()?;
        let from_resources = resources
            .and_then(|r| lookup_dict(self.doc, r, b"ColorSpace"))
            .and_then(|spaces| spaces.get(key).ok());
        match from_resources {
            Some(space) => describe_color_space(self.doc, space),
            // Device families and Pattern are used by name
            None => describe_color_space(self.doc, name),
        }
    }

    fn paint(&mut self, kind: PaintKind, state: &GraphicsState) {
        let fills = matches!(kind, PaintKind::Fill | PaintKind::FillStroke);
        let strokes = matches!(kind, PaintKind::Stroke | PaintKind::FillStroke);
        self.marks.drawings.push(DrawOp {
            kind,
            fill: state.fill.color.clone().filter(|_| fills),
            stroke: state.stroke.color.clone().filter(|_| strokes),
            fill_spot: state.fill.spot.clone().filter(|_| fills),
            stroke_spot: state.stroke.spot.clone().filter(|_| strokes),
        });
    }

    fn text(&mut self, text: String, state: &GraphicsState) {
        if text.trim().is_empty() {
            return;
        }
        self.marks.text_runs.push(TextRun {
            text,
            color: state.fill.color.clone(),
        });
    }

    fn form(
        &mut self,
        resources: Option<&'a Dictionary>,
        operands: &[Object],
        state: &GraphicsState,
        depth: usize,
    ) {
        let doc = self.doc;
        let Some(key) = operands.first().and_then(|o| o.as_name().ok()) else {
            return;
        };
        let Some(entry) = resources
            .and_then(|r| lookup_dict(doc, r, b"XObject"))
            .and_then(|xobjects| xobjects.get(key).ok())
        else {
            return;
        };
        if let Object::Reference(id) = entry {
            if !self.visited_forms.insert(*id) {
                return;
            }
        }
        let Some(Object::Stream(form)) = resolve(doc, entry) else {
            return;
        };
        if lookup(doc, &form.dict, b"Subtype").and_then(name_of).as_deref() != Some("Form") {
            return;
        }
        let inner = lookup_dict(doc, &form.dict, b"Resources").or(resources);
        let walked = stream_bytes(form)
            .and_then(|bytes| self.run(&bytes, inner, state.clone(), depth + 1));
        if let Err(e) = walked {
            log::debug!("skipping unreadable form XObject: {e}");
        }
    }
}
