//! Interactive form injection built on top of `lopdf`.
//!
//! `genpdf` has no notion of form widgets, so blocks report where their fields go while the
//! document is rendered and this module adds the matching AcroForm annotations to the finished
//! PDF bytes.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::blocks::FormWidget;

const FIELD_FONT: &str = "Helv";

// Field flags (`Ff`).
const FLAG_REQUIRED: i64 = 1 << 1;
const FLAG_MULTILINE: i64 = 1 << 12;
const FLAG_NO_TOGGLE_TO_OFF: i64 = 1 << 14;
const FLAG_RADIO: i64 = 1 << 15;

// Annotation flag: print.
const ANNOTATION_PRINT: i64 = 4;

/// Errors that can occur while embedding form fields into a rendered PDF document.
#[derive(Debug)]
pub enum FormError {
    /// The PDF bytes could not be parsed by `lopdf`.
    Parse(lopdf::Error),
    /// A required catalog entry was missing from the document trailer.
    MissingCatalog,
    /// The catalog object was not a dictionary.
    InvalidCatalog,
    /// A field was placed on a page that does not exist in the rendered document.
    MissingPage {
        /// Name of the field.
        field: String,
        /// The requested (1-indexed) page number.
        page_number: usize,
    },
}

impl From<lopdf::Error> for FormError {
    fn from(err: lopdf::Error) -> Self {
        Self::Parse(err)
    }
}

impl From<std::io::Error> for FormError {
    fn from(err: std::io::Error) -> Self {
        Self::Parse(err.into())
    }
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "Failed to parse PDF bytes: {err}"),
            Self::MissingCatalog => write!(f, "PDF catalog entry is missing"),
            Self::InvalidCatalog => write!(f, "PDF catalog entry is not a dictionary"),
            Self::MissingPage { field, page_number } => write!(
                f,
                "Field '{}' was placed on missing page {}",
                field, page_number
            ),
        }
    }
}

impl std::error::Error for FormError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::MissingCatalog | Self::InvalidCatalog | Self::MissingPage { .. } => None,
        }
    }
}

/// Rectangle in PDF user space (points, origin at the bottom-left of the page).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PdfRect {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl PdfRect {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    fn to_object(self) -> Object {
        Object::Array(
            [self.left, self.bottom, self.right, self.top]
                .iter()
                .map(|value| Object::Real(*value as f32))
                .collect(),
        )
    }
}

/// A form widget at an absolute position in the rendered document.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldPlacement {
    /// One-based page number.
    pub page: usize,
    /// Widget rectangle.
    pub rect: PdfRect,
    /// Widget definition.
    pub widget: FormWidget,
}

/// Adds the given widgets as AcroForm fields and returns the updated PDF.
///
/// Radio buttons sharing a group name become kids of one radio field. Without placements the
/// bytes are returned unchanged.
pub fn apply_form_fields(
    pdf_bytes: &[u8],
    placements: &[FieldPlacement],
) -> Result<Vec<u8>, FormError> {
    if placements.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();

    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut fields: Vec<ObjectId> = Vec::new();
    let mut page_annotations: BTreeMap<ObjectId, Vec<ObjectId>> = BTreeMap::new();
    let mut radio_groups: BTreeMap<String, RadioGroup> = BTreeMap::new();
    let mut group_order: Vec<String> = Vec::new();

    for placement in placements {
        let name = placement.widget.field_name();
        let page_id = pages
            .get(&(placement.page as u32))
            .copied()
            .ok_or_else(|| FormError::MissingPage {
                field: name.to_owned(),
                page_number: placement.page,
            })?;

        match &placement.widget {
            FormWidget::Text {
                name,
                value,
                multiline,
                required,
                max_len,
                font_size,
            } => {
                let mut flags = 0;
                if *multiline {
                    flags |= FLAG_MULTILINE;
                }
                if *required {
                    flags |= FLAG_REQUIRED;
                }

                let appearance = add_appearance(
                    &mut document,
                    placement.rect,
                    font_id,
                    text_field_appearance(placement.rect),
                )?;
                let mut field = widget_dictionary(page_id, placement.rect);
                field.set("FT", Object::Name(b"Tx".to_vec()));
                field.set("T", Object::string_literal(name.as_str()));
                field.set("V", Object::string_literal(value.as_str()));
                field.set("Ff", Object::Integer(flags));
                field.set(
                    "DA",
                    Object::string_literal(format!("/{FIELD_FONT} {font_size} Tf 0 g")),
                );
                if let Some(max_len) = max_len {
                    field.set("MaxLen", Object::Integer(i64::from(*max_len)));
                }
                field.set("AP", dictionary! { "N" => Object::Reference(appearance) });

                let field_id = document.add_object(field);
                fields.push(field_id);
                page_annotations.entry(page_id).or_default().push(field_id);
            }
            FormWidget::Radio { group, export } => {
                let entry = radio_groups.entry(group.clone()).or_insert_with(|| {
                    group_order.push(group.clone());
                    RadioGroup {
                        parent: document.new_object_id(),
                        kids: Vec::new(),
                    }
                });
                let parent = entry.parent;

                let on = add_appearance(
                    &mut document,
                    placement.rect,
                    font_id,
                    radio_appearance(placement.rect, true),
                )?;
                let off = add_appearance(
                    &mut document,
                    placement.rect,
                    font_id,
                    radio_appearance(placement.rect, false),
                )?;

                let mut states = Dictionary::new();
                states.set(export.as_bytes().to_vec(), Object::Reference(on));
                states.set("Off", Object::Reference(off));

                let mut widget = widget_dictionary(page_id, placement.rect);
                widget.set("Parent", Object::Reference(parent));
                widget.set("AS", Object::Name(b"Off".to_vec()));
                widget.set("AP", dictionary! { "N" => Object::Dictionary(states) });

                let widget_id = document.add_object(widget);
                page_annotations.entry(page_id).or_default().push(widget_id);
                if let Some(group) = radio_groups.get_mut(group) {
                    group.kids.push(widget_id);
                }
            }
        }
    }

    for name in group_order {
        let Some(group) = radio_groups.remove(&name) else {
            continue;
        };
        let parent = dictionary! {
            "FT" => "Btn",
            "T" => Object::string_literal(name.as_str()),
            "Ff" => Object::Integer(FLAG_RADIO | FLAG_NO_TOGGLE_TO_OFF),
            "V" => "Off",
            "Kids" => group.kids.iter().copied().map(Object::Reference).collect::<Vec<_>>(),
        };
        document
            .objects
            .insert(group.parent, Object::Dictionary(parent));
        fields.push(group.parent);
    }

    attach_annotations(&mut document, &page_annotations)?;
    insert_acroform(&mut document, &fields, font_id)?;

    let mut buffer = Vec::new();
    document.save_to(&mut buffer).map_err(FormError::from)?;
    Ok(buffer)
}

struct RadioGroup {
    parent: ObjectId,
    kids: Vec<ObjectId>,
}

fn widget_dictionary(page_id: ObjectId, rect: PdfRect) -> Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "Rect" => rect.to_object(),
        "P" => Object::Reference(page_id),
        "F" => Object::Integer(ANNOTATION_PRINT),
        "MK" => dictionary! {
            "BC" => vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)],
        },
    }
}

fn text_field_appearance(rect: PdfRect) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("G", vec![Object::Real(0.0)]),
        Operation::new("w", vec![Object::Real(0.5)]),
        Operation::new(
            "re",
            vec![
                Object::Real(0.25),
                Object::Real(0.25),
                Object::Real((rect.width() - 0.5) as f32),
                Object::Real((rect.height() - 0.5) as f32),
            ],
        ),
        Operation::new("S", vec![]),
        Operation::new("Q", vec![]),
    ]
}

// Circle approximated by four Bézier segments.
const KAPPA: f64 = 0.552_284_75;

fn circle(cx: f64, cy: f64, r: f64) -> Vec<Operation> {
    let k = r * KAPPA;
    let point = |x: f64, y: f64| vec![Object::Real(x as f32), Object::Real(y as f32)];
    let curve = |points: [f64; 6]| {
        Operation::new(
            "c",
            points.iter().map(|value| Object::Real(*value as f32)).collect(),
        )
    };
    vec![
        Operation::new("m", point(cx + r, cy)),
        curve([cx + r, cy + k, cx + k, cy + r, cx, cy + r]),
        curve([cx - k, cy + r, cx - r, cy + k, cx - r, cy]),
        curve([cx - r, cy - k, cx - k, cy - r, cx, cy - r]),
        curve([cx + k, cy - r, cx + r, cy - k, cx + r, cy]),
    ]
}

fn radio_appearance(rect: PdfRect, selected: bool) -> Vec<Operation> {
    let (cx, cy) = (rect.width() / 2.0, rect.height() / 2.0);
    let radius = cx.min(cy);

    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new("G", vec![Object::Real(0.0)]),
        Operation::new("w", vec![Object::Real(0.75)]),
    ];
    operations.extend(circle(cx, cy, (radius - 0.5).max(0.5)));
    operations.push(Operation::new("S", vec![]));
    if selected {
        operations.push(Operation::new("g", vec![Object::Real(0.0)]));
        operations.extend(circle(cx, cy, radius / 2.0));
        operations.push(Operation::new("f", vec![]));
    }
    operations.push(Operation::new("Q", vec![]));
    operations
}

fn add_appearance(
    document: &mut Document,
    rect: PdfRect,
    font_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<ObjectId, FormError> {
    let content = Content { operations }.encode()?;
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(rect.width() as f32),
                Object::Real(rect.height() as f32),
            ],
            "Resources" => dictionary! {
                "Font" => dictionary! { FIELD_FONT => Object::Reference(font_id) },
            },
        },
        content,
    );
    Ok(document.add_object(stream))
}

fn attach_annotations(
    document: &mut Document,
    page_annotations: &BTreeMap<ObjectId, Vec<ObjectId>>,
) -> Result<(), FormError> {
    for (page_id, annotations) in page_annotations {
        let page = document
            .objects
            .get_mut(page_id)
            .and_then(|object| object.as_dict_mut().ok())
            .ok_or(FormError::InvalidCatalog)?;

        let mut existing = match page.get(b"Annots") {
            Ok(Object::Array(array)) => array.clone(),
            _ => Vec::new(),
        };
        existing.extend(annotations.iter().copied().map(Object::Reference));
        page.set("Annots", Object::Array(existing));
    }
    Ok(())
}

fn insert_acroform(
    document: &mut Document,
    fields: &[ObjectId],
    font_id: ObjectId,
) -> Result<(), FormError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| FormError::MissingCatalog)?;

    let acroform = dictionary! {
        "Fields" => fields.iter().copied().map(Object::Reference).collect::<Vec<_>>(),
        "NeedAppearances" => Object::Boolean(true),
        "DA" => Object::string_literal(format!("/{FIELD_FONT} 0 Tf 0 g")),
        "DR" => dictionary! {
            "Font" => dictionary! { FIELD_FONT => Object::Reference(font_id) },
        },
    };
    let acroform_id = document.add_object(acroform);

    let catalog = document
        .objects
        .get_mut(&catalog_id)
        .ok_or(FormError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| FormError::InvalidCatalog)?;
    catalog.set("AcroForm", Object::Reference(acroform_id));

    Ok(())
}
