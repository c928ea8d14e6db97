//! Assembles the blank form and the answer key.
//!
//! Generation runs in three stages:
//!
//! 1. [`plan_documents`] measures every block of both documents.  For each question the shuffle
//!    state is captured before the blank block is built and restored before the solution block is
//!    built, so both documents agree on the option order.
//! 2. [`render_documents`] paginates both plans with `genpdf` and injects the form fields.
//! 3. [`generate_documents`] writes the two files once both documents rendered successfully.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use genpdf::fonts::{FontCache, FontData, FontFamily};
use log::{debug, info, warn};

use crate::blocks::{Flowable, Icon, RenderedBlock, TitleBlock};
use crate::builder::DocumentBuilder;
use crate::elements::{load_icon, FieldSink, FlowableElement, VerticalSpace};
use crate::error::{GenerateError, LayoutError};
use crate::fonts;
use crate::forms::apply_form_fields;
use crate::metrics::{FontCacheMeasure, TextMeasure};
use crate::model::{total_points, QuizDocument, RenderMode};
use crate::settings::FormSettings;
use crate::shuffle::AnswerShuffler;

/// The measured blocks of one document.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentPlan {
    /// Which of the twin documents this is.
    pub mode: RenderMode,
    /// Header block.
    pub title: TitleBlock,
    /// Question blocks in display order.
    pub questions: Vec<RenderedBlock>,
}

/// Measured blocks of both documents.
#[derive(Clone, Debug, PartialEq)]
pub struct TwinPlan {
    pub blank: DocumentPlan,
    pub solution: DocumentPlan,
}

/// A rendered PDF held in memory.
#[derive(Clone, Debug)]
pub struct GeneratedDocument {
    /// The PDF bytes, including form fields.
    pub bytes: Vec<u8>,
    /// Number of pages.
    pub page_count: usize,
    /// Number of interactive fields; radio groups count once.
    pub field_count: usize,
}

/// Both rendered documents.
#[derive(Clone, Debug)]
pub struct TwinDocuments {
    pub blank: GeneratedDocument,
    pub solution: GeneratedDocument,
}

/// Measures the header and every question block of both documents.
///
/// `icon` is the decoded header icon; decoding happens outside so a bad image never fails the
/// plan.
pub fn plan_documents(
    document: &QuizDocument,
    settings: &FormSettings,
    measure: &dyn TextMeasure,
    shuffler: &mut AnswerShuffler,
    icon: Option<Icon>,
) -> Result<TwinPlan, LayoutError> {
    let style = settings.block_style();
    let total = total_points(document.items(), settings.max_points());

    let title = |mode, icon| {
        TitleBlock::build(
            document.title(),
            icon,
            mode,
            settings.solution_name(),
            total,
            style.width,
            measure,
        )
    };
    let mut blank = DocumentPlan {
        mode: RenderMode::Blank,
        title: title(RenderMode::Blank, icon.clone())?,
        questions: Vec::with_capacity(document.items().len()),
    };
    let mut solution = DocumentPlan {
        mode: RenderMode::Solution,
        title: title(RenderMode::Solution, icon)?,
        questions: Vec::with_capacity(document.items().len()),
    };

    for (index, item) in document.items().iter().enumerate() {
        let number = index + 1;

        let state = shuffler.capture();
        let blank_block = RenderedBlock::build(
            item,
            number,
            RenderMode::Blank,
            &style,
            measure,
            settings.shuffle().then_some(&mut *shuffler),
        )?;

        shuffler.restore(&state);
        let solution_block = RenderedBlock::build(
            item,
            number,
            RenderMode::Solution,
            &style,
            measure,
            settings.shuffle().then_some(&mut *shuffler),
        )?;

        debug!(
            "Planned question {} ({}): {:.1}pt",
            number,
            item.question().signature(),
            blank_block.height()
        );
        blank.questions.push(blank_block);
        solution.questions.push(solution_block);
    }

    Ok(TwinPlan { blank, solution })
}

fn render_plan(
    plan: &DocumentPlan,
    settings: &FormSettings,
    title: &str,
    font_family: FontFamily<FontData>,
) -> Result<GeneratedDocument, GenerateError> {
    let (mut document, frame) = DocumentBuilder::new(settings.page())
        .with_font_size(settings.font_size())
        .with_title(title)
        .build(font_family);
    let fields = FieldSink::new();
    let spacing = settings.question_spacing_pt();

    document.push(FlowableElement::new(
        plan.title.clone(),
        frame.clone(),
        fields.clone(),
    ));
    document.push(VerticalSpace::from_points(spacing));
    for block in &plan.questions {
        document.push(FlowableElement::new(
            block.clone(),
            frame.clone(),
            fields.clone(),
        ));
        document.push(VerticalSpace::from_points(spacing));
    }

    let mut rendered = Vec::new();
    document
        .render(&mut rendered)
        .map_err(GenerateError::Render)?;

    let placements = fields.take();
    let field_count = placements
        .iter()
        .map(|placement| placement.widget.field_name())
        .collect::<BTreeSet<_>>()
        .len();
    let bytes = apply_form_fields(&rendered, &placements)?;

    Ok(GeneratedDocument {
        bytes,
        page_count: frame.get().page,
        field_count,
    })
}

/// Renders both planned documents to PDF bytes.
pub fn render_documents(
    plan: &TwinPlan,
    settings: &FormSettings,
    title: &str,
    font_family: FontFamily<FontData>,
) -> Result<TwinDocuments, GenerateError> {
    let blank = render_plan(&plan.blank, settings, title, font_family.clone())?;
    let solution = render_plan(&plan.solution, settings, title, font_family)?;
    Ok(TwinDocuments { blank, solution })
}

/// Path of the answer key: `suffix` inserted between the file stem and extension of `path`.
pub fn solution_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(extension) => format!("{stem}{suffix}.{}", extension.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    path.with_file_name(file_name)
}

fn load_fonts(name: &str) -> Result<FontFamily<FontData>, GenerateError> {
    fonts::load_font_family(name).map_err(|err| {
        if fonts::fonts_missing(&err) {
            warn!("{}", err);
            GenerateError::Layout(LayoutError::UnknownFont(name.to_owned()))
        } else {
            GenerateError::FontLoad(err)
        }
    })
}

fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), GenerateError> {
    fs::write(path, bytes).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Generates the blank form at the document's output path and the answer key next to it.
///
/// Nothing is written unless both documents render. Returns the blank and solution paths.
pub fn generate_documents(
    document: &QuizDocument,
    settings: &FormSettings,
) -> Result<(PathBuf, PathBuf), GenerateError> {
    let font_family = load_fonts(settings.font_family())?;
    let font_cache = FontCache::new(font_family.clone());
    let measure = FontCacheMeasure::new(&font_cache);

    let icon = document.icon().and_then(load_icon);
    let mut shuffler = settings.shuffler();
    let plan = plan_documents(document, settings, &measure, &mut shuffler, icon)?;
    let rendered = render_documents(&plan, settings, document.title(), font_family)?;

    let blank_path = document.output().clone();
    let solution_path = solution_path(&blank_path, settings.solution_suffix());

    write_artifact(&blank_path, &rendered.blank.bytes)?;
    if let Err(err) = write_artifact(&solution_path, &rendered.solution.bytes) {
        if let Err(cleanup) = fs::remove_file(&blank_path) {
            warn!(
                "Could not remove {} after a failed write: {}",
                blank_path.display(),
                cleanup
            );
        }
        return Err(err);
    }

    info!(
        "Wrote {} ({} pages, {} fields)",
        blank_path.display(),
        rendered.blank.page_count,
        rendered.blank.field_count
    );
    info!(
        "Wrote {} ({} pages)",
        solution_path.display(),
        rendered.solution.page_count
    );

    Ok((blank_path, solution_path))
}
