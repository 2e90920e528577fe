pub mod assist;
pub mod cli;
pub mod codec;
pub mod data;
pub mod error;
pub mod history;
pub mod io_utils;
pub mod join;
pub mod profile;
pub mod recipe;
pub mod replace;
pub mod table;
pub mod transform;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, debug, info, warn};
use serde_json::json;

use crate::{
    cli::{Cli, Commands, OutputArgs},
    codec::Format,
    data::Dataset,
    history::Workspace,
    join::{JoinOptions, JoinStrategy},
    recipe::{Recipe, Step},
    replace::FindReplace,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("rowsmith", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => handle_profile(&args),
        Commands::Preview(args) => handle_preview(&args),
        Commands::Count(args) => handle_count(&args),
        Commands::Clean(args) => handle_clean(&args),
        Commands::Join(args) => handle_join(&args),
    }
}

fn load(input: &cli::InputArgs) -> Result<Dataset> {
    let encoding = io_utils::resolve_encoding(input.input_encoding.as_deref())?;
    let import = io_utils::load_dataset(&input.input, input.format, input.delimiter, encoding)?;
    if !import.dropped.is_empty() {
        warn!(
            "Dropped {} row(s) from {:?} whose field count did not match the header",
            import.dropped.len(),
            input.input
        );
    }
    info!(
        "Loaded {} row(s) x {} column(s) from {:?}",
        import.dataset.len(),
        import.dataset.columns.len(),
        input.input
    );
    Ok(import.dataset)
}

fn handle_profile(args: &cli::ProfileArgs) -> Result<()> {
    let dataset = load(&args.input)?;
    let profile = profile::profile(&dataset.rows);
    if args.json {
        let rendered =
            serde_json::to_string_pretty(&profile).context("Serializing profile as JSON")?;
        println!("{rendered}");
    } else {
        print!("{}", table::render_profile(&profile));
    }
    info!(
        "Profiled {} column(s); completeness {}%",
        profile.total_columns, profile.completeness_score
    );
    Ok(())
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let dataset = load(&args.input)?;
    print!("{}", table::render_dataset(&dataset, args.rows));
    let extra = dataset.undeclared_keys();
    if !extra.is_empty() {
        info!("Keys outside the header were not shown: {}", extra.iter().join(", "));
    }
    Ok(())
}

fn handle_count(args: &cli::CountArgs) -> Result<()> {
    let dataset = load(&args.input)?;
    let search = &args.search;
    let count = replace::count_matches(
        &dataset.rows,
        &search.column,
        &search.find,
        search.match_case,
        search.use_regex,
    );
    println!("{count}");
    info!("'{}' matched {} cell(s) in {}", search.find, count, search.column);
    Ok(())
}

fn handle_clean(args: &cli::CleanArgs) -> Result<()> {
    let dataset = load(&args.input)?;
    let input_format = io_utils::resolve_format(
        Some(&args.input.input),
        args.input.format,
        Format::Delimited,
    );
    let mut workspace = Workspace::new(dataset);

    if let Some(path) = &args.recipe {
        Recipe::load(path)?.run(&mut workspace);
    }
    for action in &args.steps {
        Step::from(*action).run(&mut workspace);
    }
    if let (Some(find), Some(replacement)) = (&args.find, &args.replace) {
        let spec = FindReplace {
            column: args.column.clone(),
            find: find.clone(),
            replace: replacement.clone(),
            match_case: args.match_case,
            use_regex: args.use_regex,
        };
        info!(
            "Replacing in {} cell(s)",
            spec.count(&workspace.current().rows)
        );
        Step::Replace(spec).run(&mut workspace);
    }
    for _ in 0..args.undo {
        workspace
            .undo()
            .context("--undo exceeds the number of applied steps")?;
    }

    for (idx, snapshot) in workspace.entries().iter().enumerate() {
        debug!(
            "#{} {} [{}] {} row(s)",
            idx,
            snapshot.description,
            snapshot.created_at.format("%H:%M:%S%.3f"),
            snapshot.dataset.len()
        );
    }
    info!(
        "History: {}",
        workspace
            .entries()
            .iter()
            .map(|s| s.description.as_str())
            .join(" -> ")
    );
    export(&workspace, &args.output, input_format, args.input.delimiter)
}

fn handle_join(args: &cli::JoinArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let primary = io_utils::load_dataset(&args.primary, None, args.delimiter, encoding)?.dataset;
    let secondary =
        io_utils::load_dataset(&args.secondary, None, args.delimiter, encoding)?.dataset;

    let fallback = JoinStrategy::fallback(&primary.columns, &secondary.columns);
    let strategy = JoinStrategy {
        join_type: args.kind,
        primary_key_column: args
            .primary_key
            .clone()
            .unwrap_or(fallback.primary_key_column),
        secondary_key_column: args
            .secondary_key
            .clone()
            .unwrap_or(fallback.secondary_key_column),
        confidence: 1.0,
        reasoning: "Selected on the command line".to_string(),
    };
    for (dataset, column) in [
        (&primary, &strategy.primary_key_column),
        (&secondary, &strategy.secondary_key_column),
    ] {
        if dataset.column_index(column).is_none() {
            warn!(
                "Key column '{}' is not declared in {}; rows without it will not match",
                column, dataset.name
            );
        }
    }
    let options = JoinOptions {
        collision: args.collision,
        suffix: args.suffix.clone(),
        skip_missing_keys: args.skip_missing_keys,
    };

    let input_format = Format::from_path(&args.primary);
    let description = strategy.describe(&secondary.name);
    let mut workspace = Workspace::new(primary);
    let merged = join::join_with(
        &workspace.current().rows,
        &secondary.rows,
        &strategy,
        &options,
    );
    workspace.apply(merged, description);
    export(&workspace, &args.output, input_format, args.delimiter)
}

fn export(
    workspace: &Workspace,
    output: &OutputArgs,
    input_format: Format,
    input_delimiter: Option<u8>,
) -> Result<()> {
    let dataset = workspace.current();
    let path = output.output.as_deref();
    let format = io_utils::resolve_format(path, output.output_format, input_format);
    let delimiter = output
        .output_delimiter
        .or(input_delimiter)
        .unwrap_or_else(|| io_utils::resolve_delimiter(path, None));
    let encoding = io_utils::resolve_encoding(output.output_encoding.as_deref())?;

    let text = match format {
        Format::Structured if output.envelope => {
            let metadata = json!({
                "source": dataset.name,
                "exportedAt": Utc::now().to_rfc3339(),
                "rows": dataset.len(),
                "columns": dataset.columns,
                "history": workspace
                    .entries()
                    .iter()
                    .map(|s| s.description.clone())
                    .collect::<Vec<_>>(),
            });
            codec::serialize_structured_with_metadata(dataset, &metadata)?
        }
        _ => codec::serialize(dataset, format, delimiter)?,
    };
    io_utils::write_text(path, &text, encoding)?;
    info!(
        "Exported {} row(s) as {:?} -> {}",
        dataset.len(),
        format,
        describe_destination(path, dataset, format)
    );
    Ok(())
}

fn describe_destination(path: Option<&Path>, dataset: &Dataset, format: Format) -> String {
    match path {
        Some(p) if !io_utils::is_dash(p) => p.display().to_string(),
        _ => format!(
            "stdout (suggested file name {})",
            codec::export_file_name(&dataset.name, format)
        ),
    }
}
