use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use vnpdf_to_txt::{
    check_deps, emit_files, enumerate_inputs, install_help_for, load_config, slugify, source_for,
    unique_slug, verify_output, AppConfig, EnumerateError, ExtractError, Pipeline, PipelineError,
};

#[derive(Parser)]
#[command(name = "vnpdf2txt", version, about = "Rebuild structured plain text from Vietnamese PDF books")]
struct Cli {
    /// YAML config (defaults to ./vnpdf.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert PDFs or JSON word dumps; with no inputs, the configured glob is used
    Convert {
        inputs: Vec<PathBuf>,
        /// Output directory (overrides the config)
        #[arg(short, long)]
        output_dir: Option<String>,
    },
    /// Check an emitted text file against the digest in its meta JSON
    Verify {
        txt: PathBuf,
        /// Meta JSON (defaults to <stem>.meta.json next to the text file)
        #[arg(long)]
        meta: Option<PathBuf>,
    },
    /// Report missing external tools
    CheckDeps,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => load_config(path, true),
        None => load_config(Path::new(vnpdf_to_txt::config::DEFAULT_CONFIG_PATH), false),
    };
    let cfg = match cfg {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "tool": "load_config", "error": e.to_string(), "error_code": 3 }));
            std::process::exit(3);
        }
    };

    match cli.command {
        Command::CheckDeps => {
            let deps = report_deps();
            if !deps {
                std::process::exit(2);
            }
        }
        Command::Verify { txt, meta } => run_verify(&txt, meta),
        Command::Convert { inputs, output_dir } => run_convert(cfg, inputs, output_dir),
    }
}

fn report_deps() -> bool {
    let deps = check_deps();
    if deps.ok {
        eprintln!("{}", serde_json::json!({ "tool": "check_deps", "status": "ok", "missing": deps.missing }));
    } else {
        eprintln!("{}", serde_json::json!({ "tool": "check_deps", "missing": deps.missing, "error_code": 2 }));
        let help = install_help_for(&deps.missing);
        if !help.is_empty() {
            eprintln!("{}", help);
        }
    }
    deps.ok
}

fn run_verify(txt: &Path, meta: Option<PathBuf>) {
    let meta = meta.unwrap_or_else(|| txt.with_extension("meta.json"));
    match verify_output(txt, &meta) {
        Ok(report) if report.ok => {
            eprintln!("{}", serde_json::json!({ "tool": "verify_output", "file": txt, "status": "ok", "sha256": report.actual }));
        }
        Ok(report) => {
            eprintln!(
                "{}",
                serde_json::json!({
                    "tool": "verify_output",
                    "file": txt,
                    "error": "ChecksumMismatch",
                    "expected": report.expected,
                    "actual": report.actual,
                    "error_code": 7
                })
            );
            std::process::exit(7);
        }
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "tool": "verify_output", "file": txt, "error": e.to_string(), "error_code": 1 }));
            std::process::exit(1);
        }
    }
}

fn run_convert(cfg: AppConfig, inputs: Vec<PathBuf>, output_dir: Option<String>) {
    let output_dir = output_dir.unwrap_or_else(|| cfg.output_dir.clone());
    let pipeline = match Pipeline::new(cfg.pipeline.clone()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "tool": "load_config", "error": e.to_string(), "error_code": 3 }));
            std::process::exit(3);
        }
    };

    let files = if inputs.is_empty() {
        match enumerate_inputs(&cfg.input_glob) {
            Ok(files) => files,
            Err(EnumerateError::NoFilesFound { guidance }) => {
                eprintln!(
                    "{}",
                    serde_json::json!({ "tool": "enumerate_inputs", "glob": cfg.input_glob, "error": "NoFilesFound", "error_code": 1 })
                );
                eprintln!("{}", guidance);
                std::process::exit(1);
            }
        }
    } else {
        inputs
    };
    eprintln!("{}", serde_json::json!({ "tool": "enumerate_inputs", "count": files.len() }));

    let needs_poppler = files.iter().any(|f| source_for(f).engine() != "json");
    if needs_poppler && !report_deps() {
        std::process::exit(2);
    }

    let mut used_doc_ids: HashSet<String> = HashSet::new();
    for file in files {
        let started_ms = now_ms();
        let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("doc");
        let doc_id = unique_slug(slugify(stem), &mut used_doc_ids);
        let source = source_for(&file);

        let doc = match pipeline.process_file(source.as_ref(), &file) {
            Ok(doc) => doc,
            Err(PipelineError::Extract(err)) => {
                let label = match err {
                    ExtractError::FileNotFound(_) => "FileNotFound",
                    ExtractError::EncryptedPdf(_) => "EncryptedPDF",
                    ExtractError::Malformed(_) => "MalformedWordDump",
                    ExtractError::Other(_) => "ExtractError",
                };
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool": "extract_words",
                        "file": file,
                        "error": label,
                        "message": err.to_string(),
                        "error_code": 1
                    })
                );
                std::process::exit(1);
            }
            Err(PipelineError::Structure(err)) => {
                eprintln!(
                    "{}",
                    serde_json::json!({ "tool": "restructure", "file": file, "error": err.to_string(), "error_code": 5 })
                );
                std::process::exit(5);
            }
        };
        eprintln!(
            "{}",
            serde_json::json!({
                "tool": "restructure",
                "file": file,
                "engine": source.engine(),
                "pages": doc.page_count,
                "body_size": doc.body_size,
                "lines": doc.lines.len(),
                "stats": doc.stats
            })
        );

        let text = doc.text();
        let meta = serde_json::json!({
            "doc_id": doc_id,
            "source": file,
            "engine": source.engine(),
            "page_count": doc.page_count,
            "body_size": doc.body_size,
            "stats": doc.stats,
            "timestamps": { "started_ms": started_ms, "finished_ms": now_ms() },
        });

        match emit_files(&text, &meta, Path::new(&output_dir), &doc_id) {
            Ok(paths) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool": "emit_files",
                        "file": file,
                        "txt_path": paths.txt_path,
                        "meta_path": paths.meta_path,
                        "sha256": paths.text_sha256
                    })
                );
            }
            Err(e) => {
                eprintln!(
                    "{}",
                    serde_json::json!({ "tool": "emit_files", "file": file, "error": e.to_string(), "error_code": 6 })
                );
                std::process::exit(6);
            }
        }
    }
}

fn now_ms() -> i128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i128)
        .unwrap_or(0)
}
