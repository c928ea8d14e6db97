use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::info;

use quiz_forms::model::selection_summary;
use quiz_forms::{
    entropy_seed, generate_documents, FormSettings, ImageSource, MemoryStore, QuestionFilter,
    QuizDocument, QuizItem,
};

/// Generates a fillable quiz form and its answer key.
///
/// Fonts are looked up in `$QUIZ_FORMS_FONTS_DIR`, then `assets/fonts` next to the binary, then
/// `assets/fonts` in the `quiz_forms` crate.  Set `RUST_LOG=info` to see what was written.
#[derive(Parser)]
#[command(author, version, about = "Twin quiz form and answer key generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render questions from a JSON question set.
    Generate(GenerateArgs),

    /// Render the built-in two-question sample.
    Sample {
        /// Path of the blank form; the answer key is written next to it.
        #[arg(long, short, default_value = "sample.pdf")]
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// JSON question set to read.
    #[arg(long, short)]
    questions: PathBuf,

    /// Path of the blank form; the answer key is written next to it.
    #[arg(long, short)]
    output: PathBuf,

    /// Title shown in the header.
    #[arg(long, short)]
    title: String,

    /// Image shown left of the title.
    #[arg(long)]
    icon: Option<PathBuf>,

    /// Only questions of this group.
    #[arg(long)]
    group: Option<u32>,

    /// Ask questions that have options as multiple choice.
    #[arg(long)]
    multiple_choice: bool,

    /// Pick questions in random order (seeded with --seed when given).
    #[arg(long)]
    randomize: bool,

    /// Use at most this many questions.
    #[arg(long)]
    limit: Option<usize>,

    #[command(flatten)]
    layout: LayoutArgs,
}

#[derive(Args)]
struct LayoutArgs {
    /// Font family name; expects <NAME>-Regular.ttf and friends.
    #[arg(long)]
    font: Option<String>,

    /// Font size of question text.
    #[arg(long)]
    font_size: Option<u8>,

    /// Keep multiple-choice options in their stored order.
    #[arg(long)]
    no_shuffle: bool,

    /// Seed for option shuffling, for reproducible documents.
    #[arg(long)]
    seed: Option<u64>,

    /// Points per question.
    #[arg(long)]
    max_points: Option<u32>,

    /// Suffix of the answer key file name.
    #[arg(long)]
    solution_suffix: Option<String>,
}

impl LayoutArgs {
    fn settings(&self) -> FormSettings {
        let mut settings = FormSettings::new()
            .with_shuffle(!self.no_shuffle)
            .with_seed(self.seed);
        if let Some(font) = &self.font {
            settings = settings.with_font_family(font.as_str());
        }
        if let Some(size) = self.font_size {
            settings = settings.with_font_size(size);
        }
        if let Some(points) = self.max_points {
            settings = settings.with_max_points(points);
        }
        if let Some(suffix) = &self.solution_suffix {
            settings = settings.with_solution_suffix(suffix.as_str());
        }
        settings
    }
}

fn generate(args: GenerateArgs) -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::load(&args.questions)?;
    let settings = args.layout.settings();

    let mut filter = QuestionFilter::new();
    if let Some(group) = args.group {
        filter = filter.in_group(group);
    }
    if args.randomize {
        filter = filter.randomized(settings.seed().unwrap_or_else(entropy_seed));
    }

    let mut items = QuizItem::collect(&store, &filter, args.multiple_choice);
    if let Some(limit) = args.limit {
        items.truncate(limit);
    }
    info!("{}", selection_summary(&items, settings.max_points()));

    let document = QuizDocument::new(args.title, args.output)
        .with_icon(args.icon.map(ImageSource::from_path))
        .with_items(items);
    let (blank, solution) = generate_documents(&document, &settings)?;
    println!("Generated {} and {}", blank.display(), solution.display());
    Ok(())
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let result: Result<(), Box<dyn Error>> = match cli.command {
        Commands::Generate(args) => generate(args),
        Commands::Sample { output, layout } => {
            quiz_forms::demo::run(&output, &layout.settings())
                .map(|(blank, solution)| {
                    println!("Generated {} and {}", blank.display(), solution.display());
                })
                .map_err(Into::into)
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
