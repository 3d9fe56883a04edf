//! Ask command: load a CSV and run one chat turn from the terminal

use anyhow::{Context, Result};
use tt_pipeline::ChatRequest;

use crate::cli::{AskArgs, GlobalArgs};
use crate::context::RuntimeContext;

/// Execute the ask command
pub(crate) async fn execute(args: &AskArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let pipeline = ctx.pipeline();

    let contents = tokio::fs::read(&args.csv)
        .await
        .with_context(|| format!("Failed to read {}", args.csv.display()))?;
    let upload = pipeline
        .upload(&contents)
        .await
        .with_context(|| format!("Failed to load {}", args.csv.display()))?;
    eprintln!(
        "Loaded {} ({} rows, {} columns)",
        args.csv.display(),
        upload.row_count,
        upload.schema.columns.len()
    );

    let request = ChatRequest::new(upload.id.as_str(), args.question.as_str());
    let response = pipeline
        .chat(&request)
        .await
        .context("Failed to answer question")?;

    let json = serde_json::to_string_pretty(&response).context("Failed to render response")?;
    println!("{json}");
    Ok(())
}
