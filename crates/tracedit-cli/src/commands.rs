use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use tracedit_sdk::{
    Editor, EditorConfig, MemoryTrace, NodeId, SessionFile, TraceReader, UnavailableReplayer,
};
use tracedit_session::SnapshotRecord;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    match cli.command {
        Command::Inspect(args) => cmd_inspect(args, &config, cli.format),
        Command::Calls(args) => cmd_calls(args, &config),
        Command::Search(args) => cmd_search(args, config),
        Command::Session(args) => match args.action {
            SessionAction::Show { session } => cmd_session_show(&session, cli.format),
            SessionAction::Check { session } => cmd_session_check(&session, config),
        },
    }
}

fn open_trace(path: &Path, config: EditorConfig) -> anyhow::Result<Editor<UnavailableReplayer>> {
    let mut reader = MemoryTrace::open_json(path)
        .with_context(|| format!("cannot open trace {}", path.display()))?;
    let mut editor = Editor::with_config(UnavailableReplayer, config);
    editor.open_trace(path, &mut reader)?;
    Ok(editor)
}

fn describe(editor: &Editor<UnavailableReplayer>, node: NodeId) -> anyhow::Result<String> {
    let n = editor.tree()?.node(node)?;
    Ok(format!("{}  {}", n.summary().yellow(), n.text()))
}

fn cmd_inspect(args: InspectArgs, config: &EditorConfig, format: OutputFormat) -> anyhow::Result<()> {
    let editor = open_trace(&args.trace, config.clone())?;
    let Some(trace) = editor.trace() else {
        bail!("no trace is open");
    };
    let meta = trace.metadata();
    let tree = trace.tree();
    let draws = tree.calls().filter(|(_, call)| call.is_draw()).count();

    match format {
        OutputFormat::Json => {
            let out = json!({
                "path": meta.path,
                "uuid": meta.uuid.to_string(),
                "pointer_size": meta.pointer_size,
                "frames": tree.frame_count(),
                "calls": tree.call_count(),
                "draw_calls": draws,
                "keyframe": trace.has_keyframe(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("Trace {}", meta.file_name().bold());
            println!("  UUID: {}", meta.uuid.to_string().cyan());
            println!("  Pointer size: {}", meta.pointer_size);
            println!("  Frames: {}", tree.frame_count());
            println!("  Calls: {} ({} draw calls)", tree.call_count(), draws);
            let keyframe = if trace.has_keyframe() { "yes".green() } else { "no".dimmed() };
            println!("  Keyframe snapshot: {keyframe}");
        }
    }
    Ok(())
}

fn cmd_calls(args: CallsArgs, config: &EditorConfig) -> anyhow::Result<()> {
    let editor = open_trace(&args.trace, config.clone())?;
    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            let lines = editor.export_api_calls(&mut BufWriter::new(file))?;
            println!("{} Wrote {} lines to {}", "✓".green(), lines, path.display());
        }
        None => {
            editor.export_api_calls(&mut io::stdout().lock())?;
        }
    }
    Ok(())
}

fn cmd_search(args: SearchArgs, mut config: EditorConfig) -> anyhow::Result<()> {
    config.search.case_sensitive |= args.case_sensitive;
    config.search.wrap |= args.wrap;
    let mut editor = open_trace(&args.trace, config)?;

    if let Some(from) = args.from {
        let node = editor
            .tree()?
            .find_by_call_index(from)
            .with_context(|| format!("call {from} is not in the trace"))?;
        editor.select(node)?;
    }

    let mut matches = 0usize;
    loop {
        let found = if args.prev {
            editor.search_prev(&args.text)?
        } else {
            editor.search_next(&args.text)?
        };
        let Some(node) = found else { break };
        println!("{}", describe(&editor, node)?);
        matches += 1;
        if !args.all {
            break;
        }
    }
    if matches == 0 {
        println!("{}", "No match.".red());
    }
    Ok(())
}

fn cmd_session_show(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let file = SessionFile::read(path)?;
    let records: Vec<Result<SnapshotRecord, String>> = file
        .records
        .iter()
        .map(|raw| serde_json::from_value(raw.clone()).map_err(|e| e.to_string()))
        .collect();

    if let OutputFormat::Json = format {
        let out = json!({
            "version": file.version,
            "base_trace": file.base_trace_path(),
            "trace_uuid": file.base_trace.trace_uuid().map(|u| u.to_string()),
            "data_dir": file.data_dir(),
            "records": file.records,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Session {} (format {})", path.display().to_string().bold(), file.version);
    println!("  Base trace: {}", file.base_trace_path().display());
    if let Some(uuid) = file.base_trace.trace_uuid() {
        println!("  Trace UUID: {}", uuid.to_string().cyan());
    }
    println!("  Data: {}", file.data_dir().display());
    println!("  Snapshots: {}", records.len());
    for (position, record) in records.iter().enumerate() {
        match record {
            Ok(record) => {
                let target = match record.target() {
                    Ok(target) => target.to_string(),
                    Err(e) => e.to_string(),
                };
                let mut flags = Vec::new();
                if !record.is_valid {
                    flags.push("invalid".red().to_string());
                }
                if record.is_edited {
                    flags.push("edited".green().to_string());
                }
                if record.is_outdated {
                    flags.push("outdated".yellow().to_string());
                }
                let payload = record.rel_path.as_deref().unwrap_or("-");
                println!("  {:>4}  {:<12} {:<40} {}", position, target, payload, flags.join(" "));
            }
            Err(e) => println!("  {:>4}  {}", position, e.red()),
        }
    }
    Ok(())
}

fn cmd_session_check(path: &Path, config: EditorConfig) -> anyhow::Result<()> {
    let mut editor = Editor::with_config(UnavailableReplayer, config);
    let report = editor.load_session(path, |trace| {
        Ok(Box::new(MemoryTrace::open_json(trace)?) as Box<dyn TraceReader>)
    })?;

    for skipped in &report.skipped {
        println!("  {} record {}: {}", "✗".red(), skipped.position, skipped.error);
    }
    if !report.is_clean() {
        bail!(
            "{} of {} records could not be loaded",
            report.skipped.len(),
            report.loaded + report.skipped.len()
        );
    }
    println!("{} Session loaded: {} records", "✓".green().bold(), report.loaded);
    Ok(())
}
